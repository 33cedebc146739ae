//! SockJS framing layer.
//!
//! ## Inbound
//!
//! Each WebSocket text message is one SockJS frame. [`dispatch`] splits it
//! into tag and content and routes the application messages it carries.
//!
//! ## Outbound
//!
//! Requests are JSON-serialized and then wrapped by [`quote`] into a JSON
//! string literal with the extra escaping SockJS servers expect.

pub mod dispatch;
pub mod escape;
pub mod frame;

pub use dispatch::{MessageHandler, dispatch};
pub use escape::quote;
pub use frame::{FrameKind, RawFrame, parse_array};
