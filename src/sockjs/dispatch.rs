//! Frame dispatch.
//!
//! [`dispatch`] decodes one wire message and hands every application message
//! it carries to a [`MessageHandler`], in wire order. Malformed content is
//! logged and skipped; it never reaches the handler.

use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::ApplicationMessage;
use crate::sockjs::frame::{FrameKind, RawFrame, parse_array};

/// Receiver of decoded frames.
pub trait MessageHandler {
    /// `o` frame.
    fn on_open(&mut self) {}

    /// `h` frame.
    fn on_heartbeat(&mut self) {}

    /// `c` frame, with the server's raw close payload if any.
    fn on_close_frame(&mut self, _reason: Option<&str>) {}

    /// One application message from an `a` or `m` frame.
    fn on_message(&mut self, message: ApplicationMessage);
}

/// Decode `wire` and route its contents to `handler`.
pub fn dispatch<H: MessageHandler + ?Sized>(wire: &str, handler: &mut H) {
    let Some(frame) = RawFrame::decode(wire) else {
        return;
    };

    match frame.kind {
        FrameKind::Open => {
            debug!("open");
            handler.on_open();
        }
        FrameKind::Heartbeat => {
            debug!("heartbeat");
            handler.on_heartbeat();
        }
        FrameKind::Array => {
            let Some(content) = frame.content else {
                return;
            };
            for raw in parse_array(content) {
                route_text(&raw, handler);
            }
        }
        FrameKind::Message => {
            let Some(content) = frame.content else {
                return;
            };
            match serde_json::from_str::<Value>(content) {
                Ok(Value::String(raw)) => route_text(&raw, handler),
                Ok(body @ Value::Object(_)) => handler.on_message(ApplicationMessage::from_value(body)),
                Ok(_) => warn!(content, "unexpected message frame content"),
                Err(err) => warn!(error = %err, content, "bad json in message frame"),
            }
        }
        FrameKind::Close => {
            debug!(reason = ?frame.content, "close");
            handler.on_close_frame(frame.content);
        }
        FrameKind::Other(tag) => {
            debug!(%tag, "ignoring frame with unknown tag");
        }
    }
}

fn route_text<H: MessageHandler + ?Sized>(raw: &str, handler: &mut H) {
    match ApplicationMessage::parse(raw) {
        Ok(message) => handler.on_message(message),
        Err(err) => warn!(error = %err, message = raw, "bad json in message"),
    }
}
