//! Minimal client WebSocket (RFC 6455) used to carry SockJS frames.

mod client;
mod frame;
mod handshake;
mod state;

pub use client::{NORMAL_CLOSURE, WsClient};
pub use frame::{Frame, MAX_CONTROL_FRAME_PAYLOAD, OpCode, apply_mask};
pub use handshake::{ClientHandshake, HandshakeResponse, WS_GUID, compute_accept_key};
pub use state::LinkState;
