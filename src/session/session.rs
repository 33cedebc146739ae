use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::{ApplicationMessage, AuthRequest, Request, SaveChangesRequest};
use crate::session::identity::{random_hex, random_shard};
use crate::session::state::{Effect, SessionState};
use crate::sockjs::{MessageHandler, quote};
use crate::transport::LinkState;

/// One simulated co-authoring client.
///
/// `Session` does no I/O. Inbound frames go through [`dispatch`](crate::sockjs::dispatch)
/// with the session as handler; outbound frames and attachment URLs pile up
/// until the driver drains them with [`Session::take_outbound`] and
/// [`Session::take_attachments`].
///
/// ## Example
///
/// ```rust,ignore
/// use docload::session::Session;
/// use docload::sockjs::dispatch;
///
/// let mut session = Session::new("0101_0_0_ab", "http://files/test.docx", 100);
/// session.link_opened();
/// dispatch(r#"a["{\"type\":\"license\"}"]"#, &mut session);
/// for frame in session.take_outbound() {
///     client.send_text(&frame).await?;
/// }
/// ```
#[derive(Debug)]
pub struct Session {
    doc_id: String,
    session_id: String,
    shard_id: String,
    document_url: String,
    user_id: Option<String>,
    remaining_edits: u32,
    edits_sent: u32,
    is_word: bool,
    state: SessionState,
    link: LinkState,
    outbox: Vec<String>,
    attachments: Vec<String>,
}

impl Session {
    /// Create a session for `doc_id` that opens `document_url` and submits
    /// `change_budget` saves.
    ///
    /// Session and shard ids are drawn at random.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, document_url: impl Into<String>, change_budget: u32) -> Self {
        Self {
            doc_id: doc_id.into(),
            session_id: random_hex(8),
            shard_id: random_shard(),
            document_url: document_url.into(),
            user_id: None,
            remaining_edits: change_budget,
            edits_sent: 0,
            is_word: false,
            state: SessionState::Connecting,
            link: LinkState::Connecting,
            outbox: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Document id this session edits.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Random SockJS session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Random SockJS server shard.
    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    /// Document URL sent in the open command.
    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    /// User id assigned by the server, once authenticated.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Saves left before the session asks to close.
    pub fn remaining_edits(&self) -> u32 {
        self.remaining_edits
    }

    /// Saves actually handed to the transport.
    pub fn edits_sent(&self) -> u32 {
        self.edits_sent
    }

    /// Whether the opened document is a word-processing document.
    pub fn is_word(&self) -> bool {
        self.is_word
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current link state.
    pub fn link(&self) -> LinkState {
        self.link
    }

    /// Check if the session reached its terminal state.
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// WebSocket URL for this session under `server`.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the result does not parse.
    pub fn connect_url(&self, server: &str) -> Result<url::Url> {
        let url = format!(
            "{}/doc/{}/c/{}/{}/websocket",
            server.trim_end_matches('/'),
            self.doc_id,
            self.shard_id,
            self.session_id
        );
        Ok(url::Url::parse(&url)?)
    }

    /// Transport reported the upgrade as complete.
    pub fn link_opened(&mut self) {
        debug!("WebSocket client connected");
        self.link = LinkState::Open;
    }

    /// Transport closed or failed. The session goes inert.
    pub fn link_lost(&mut self) {
        self.link = LinkState::Closed;
        self.state = SessionState::Closed;
    }

    /// Drain frames ready for the wire, oldest first.
    pub fn take_outbound(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Drain attachment URLs waiting to be downloaded.
    pub fn take_attachments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.attachments)
    }

    /// Serialize and queue `request`.
    ///
    /// Dropped without error when the link is not open or the session is
    /// closed. Returns whether the request was queued.
    pub fn send_request(&mut self, request: &Request) -> bool {
        if !self.link.can_send() || !self.state.is_active() {
            trace!(kind = request.kind(), link = %self.link, state = %self.state, "dropping request");
            return false;
        }

        match serde_json::to_string(request) {
            Ok(json) => {
                debug!(payload = %json, "send");
                self.outbox.push(quote(&json));
                true
            }
            Err(err) => {
                warn!(error = %err, kind = request.kind(), "failed to encode request");
                false
            }
        }
    }

    /// One step of the edit loop.
    ///
    /// With budget left, submits the canned save and decrements the budget.
    /// With none left, sends `close` and ends the session.
    pub fn edit(&mut self) {
        if !self.state.is_active() {
            return;
        }

        if self.remaining_edits == 0 {
            self.send_request(&Request::Close);
            self.state = SessionState::Closed;
            return;
        }

        debug!(change = self.remaining_edits, "do change");
        self.remaining_edits -= 1;

        let save = SaveChangesRequest::canned(self.user_id.as_deref());
        if self.send_request(&Request::SaveChanges(save)) {
            self.edits_sent += 1;
        }
    }

    fn apply(&mut self, effect: Effect, message: &ApplicationMessage) {
        match effect {
            Effect::Authenticate => {
                let auth = AuthRequest::new(&self.doc_id, &self.document_url);
                self.send_request(&Request::Auth(auth));
            }
            Effect::AdoptParticipant => match message.first_participant_id() {
                Some(id) => {
                    debug!(user_id = id, "onAuth");
                    self.user_id = Some(id.to_string());
                }
                None => warn!(body = %message.body, "auth without participants"),
            },
            Effect::RequestMessages => {
                self.send_request(&Request::GetMessages);
            }
            Effect::Edit => self.edit(),
            Effect::FetchAttachment => match message.editor_bin_url() {
                Some(url) => self.attachments.push(url.to_string()),
                None => warn!(url = %self.document_url, "error open file"),
            },
            Effect::Invalidate => {
                warn!(kind = %message.kind, body = %message.body, "session dropped by server");
            }
            Effect::Observe => {
                debug!(kind = %message.kind, body = %message.body, "observed");
            }
        }
    }
}

impl MessageHandler for Session {
    fn on_open(&mut self) {
        self.state = self.state.on_open_frame();
    }

    fn on_close_frame(&mut self, reason: Option<&str>) {
        debug!(reason = ?reason, "server closed the SockJS session");
    }

    fn on_message(&mut self, message: ApplicationMessage) {
        let transition = self.state.on_message(message.kind);
        trace!(kind = %message.kind, from = %self.state, to = %transition.next, "transition");
        self.state = transition.next;
        for effect in transition.effects {
            self.apply(effect, &message);
        }
    }
}
