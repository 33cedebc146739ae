//! # docload - SockJS co-authoring load harness
//!
//! `docload` simulates many editors hitting a real-time document
//! co-authoring server at once. Every simulated client opens a SockJS
//! session over a WebSocket, authenticates, opens a document and submits
//! canned edits until its change budget runs out.
//!
//! ## Layers
//!
//! - [`sockjs`]: frame decoding, the outbound escaping quote and dispatch
//! - [`protocol`]: typed inbound messages and outbound requests
//! - [`session`]: the per-client state machine, free of I/O
//! - [`transport`]: a small client WebSocket on tokio
//! - [`harness`]: plans users × documents and drives the sessions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docload::{Harness, HarnessConfig};
//!
//! let config = HarnessConfig::new()
//!     .with_counts(10, 2)
//!     .with_server("ws://127.0.0.1:8001");
//! let summary = Harness::new(config).run().await;
//! println!("{} edits", summary.edits_sent);
//! ```

pub mod attachment;
pub mod config;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod protocol;
pub mod session;
pub mod sockjs;
pub mod transport;

pub use config::{HarnessConfig, TransportConfig};
pub use error::{Error, Result};
pub use harness::{Harness, SessionPlan};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use protocol::{ApplicationMessage, MessageType, Request};
pub use session::{Session, SessionState};
pub use sockjs::{MessageHandler, dispatch, quote};
pub use transport::{LinkState, WsClient};
