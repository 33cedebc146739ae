//! SockJS frame envelope.
//!
//! A frame is one WebSocket text message: a single tag character followed by
//! optional JSON content.
//!
//! ```text
//! o                         session opened
//! h                         heartbeat
//! a["<json>","<json>"]      array of encoded messages
//! m"<json>"                 single encoded message
//! c[3000,"Go away!"]        session closed by the server
//! ```

use tracing::warn;

/// SockJS frame type, taken from the first character of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `o`: the server accepted the session.
    Open,
    /// `h`: keep-alive.
    Heartbeat,
    /// `a`: JSON array of encoded messages.
    Array,
    /// `m`: a single encoded message.
    Message,
    /// `c`: the server closed the session.
    Close,
    /// Any tag this client does not understand.
    Other(char),
}

impl FrameKind {
    /// Map a tag character to a frame kind.
    #[must_use]
    pub const fn from_tag(tag: char) -> Self {
        match tag {
            'o' => FrameKind::Open,
            'h' => FrameKind::Heartbeat,
            'a' => FrameKind::Array,
            'm' => FrameKind::Message,
            'c' => FrameKind::Close,
            other => FrameKind::Other(other),
        }
    }

    /// The tag character for this kind.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            FrameKind::Open => 'o',
            FrameKind::Heartbeat => 'h',
            FrameKind::Array => 'a',
            FrameKind::Message => 'm',
            FrameKind::Close => 'c',
            FrameKind::Other(tag) => tag,
        }
    }
}

/// A decoded frame borrowing its content from the wire text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    /// Frame type.
    pub kind: FrameKind,
    /// Everything after the tag, `None` when empty.
    pub content: Option<&'a str>,
}

impl<'a> RawFrame<'a> {
    /// Split a wire message into tag and content.
    ///
    /// Returns `None` for an empty message.
    #[must_use]
    pub fn decode(wire: &'a str) -> Option<Self> {
        let mut chars = wire.chars();
        let tag = chars.next()?;
        let rest = chars.as_str();
        Some(Self {
            kind: FrameKind::from_tag(tag),
            content: (!rest.is_empty()).then_some(rest),
        })
    }

    /// The tag character of this frame.
    #[must_use]
    pub const fn tag(&self) -> char {
        self.kind.tag()
    }
}

/// Build the wire text for a frame.
#[must_use]
pub fn encode(kind: FrameKind, content: Option<&str>) -> String {
    let content = content.unwrap_or_default();
    let mut wire = String::with_capacity(1 + content.len());
    wire.push(kind.tag());
    wire.push_str(content);
    wire
}

/// Parse the content of an `a` frame into its raw message strings.
///
/// Malformed content is logged and yields no messages.
#[must_use]
pub fn parse_array(content: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(content) {
        Ok(messages) => messages,
        Err(err) => {
            warn!(error = %err, content, "bad json in array frame");
            Vec::new()
        }
    }
}
