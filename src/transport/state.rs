//! Readiness of the underlying WebSocket link.

/// WebSocket link state.
///
/// Sessions only put frames on the wire while the link is [`LinkState::Open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
    /// TCP connect or HTTP upgrade in progress.
    #[default]
    Connecting,
    /// Upgrade complete, frames flow both ways.
    Open,
    /// Close frame sent, waiting for the peer's.
    Closing,
    /// Link is gone.
    Closed,
}

impl LinkState {
    /// Check if sending is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, LinkState::Open)
    }

    /// Check if receiving is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn can_receive(&self) -> bool {
        matches!(self, LinkState::Open | LinkState::Closing)
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Connecting => write!(f, "Connecting"),
            LinkState::Open => write!(f, "Open"),
            LinkState::Closing => write!(f, "Closing"),
            LinkState::Closed => write!(f, "Closed"),
        }
    }
}
