//! Co-authoring protocol payloads carried inside SockJS frames.

pub mod edits;
pub mod message;
pub mod request;

pub use edits::SaveChangesRequest;
pub use message::{ApplicationMessage, MessageType};
pub use request::{AuthRequest, Request};
