//! Session protocol state machine.
//!
//! Transitions are pure: [`SessionState::on_message`] maps the current state
//! and an inbound message type to the next state plus the side effects the
//! session must carry out, in order.

use crate::protocol::MessageType;

/// Protocol state of one simulated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Transport is being established, no SockJS frame seen yet.
    #[default]
    Connecting,
    /// SockJS session open, waiting for `license`.
    AwaitingLicense,
    /// `auth` request sent, waiting for the participant list.
    AwaitingAuth,
    /// Authenticated, submitting edits.
    Editing,
    /// Budget exhausted, dropped by the server, or transport gone.
    Closed,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Send `auth` with the embedded open command.
    Authenticate,
    /// Take the first participant's id as our user id.
    AdoptParticipant,
    /// Send `getMessages`.
    RequestMessages,
    /// Run one step of the edit loop.
    Edit,
    /// Queue the converted document for download.
    FetchAttachment,
    /// The server invalidated the session.
    Invalidate,
    /// Log the message, nothing else.
    Observe,
}

/// Result of feeding one message type to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the message.
    pub next: SessionState,
    /// Effects to run, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: SessionState, effects: &[Effect]) -> Self {
        Self {
            next,
            effects: effects.to_vec(),
        }
    }
}

impl SessionState {
    /// Check if the session still reacts to messages.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// State after the SockJS `o` frame.
    #[must_use]
    pub const fn on_open_frame(self) -> Self {
        match self {
            SessionState::Connecting => SessionState::AwaitingLicense,
            other => other,
        }
    }

    /// Transition for an inbound application message.
    ///
    /// Handlers fire in any live state so that a server which skips or
    /// reorders steps still gets driven forward; `Closed` swallows everything.
    #[must_use]
    pub fn on_message(self, kind: MessageType) -> Transition {
        use Effect::*;

        if self == SessionState::Closed {
            return Transition::to(self, &[]);
        }

        match kind {
            MessageType::License => Transition::to(SessionState::AwaitingAuth, &[Authenticate]),
            MessageType::Auth => Transition::to(SessionState::Editing, &[AdoptParticipant]),
            MessageType::Message => {
                Transition::to(SessionState::Editing, &[RequestMessages, Edit])
            }
            MessageType::UnSaveLock => Transition::to(SessionState::Editing, &[Observe, Edit]),
            MessageType::DocumentOpen => {
                Transition::to(self, &[RequestMessages, FetchAttachment])
            }
            MessageType::Drop | MessageType::Error => {
                Transition::to(SessionState::Closed, &[Invalidate])
            }
            MessageType::Cursor
            | MessageType::GetLock
            | MessageType::ReleaseLock
            | MessageType::ConnectState
            | MessageType::SaveChanges
            | MessageType::SaveLock
            | MessageType::SavePartChanges
            | MessageType::Warning => Transition::to(self, &[Observe]),
            MessageType::WaitAuth | MessageType::Unknown => Transition::to(self, &[]),
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::AwaitingLicense => write!(f, "AwaitingLicense"),
            SessionState::AwaitingAuth => write!(f, "AwaitingAuth"),
            SessionState::Editing => write!(f, "Editing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}
