//! Simulated co-authoring client.

mod identity;
#[allow(clippy::module_inception)]
mod session;
mod state;

pub use identity::{random_hex, random_shard};
pub use session::Session;
pub use state::{Effect, SessionState, Transition};
