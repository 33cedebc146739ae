//! Inbound application messages.

use serde_json::Value;

use crate::error::{Error, Result};

/// Semantic message type carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Authentication result, lists the participants.
    Auth,
    /// Messages are queued for this session.
    Message,
    /// Another participant moved their cursor.
    Cursor,
    /// A lock was acquired.
    GetLock,
    /// A lock was released.
    ReleaseLock,
    /// A participant connected or disconnected.
    ConnectState,
    /// Changes saved by another participant.
    SaveChanges,
    /// The save lock was taken.
    SaveLock,
    /// The save lock was released.
    UnSaveLock,
    /// Part of a change batch was saved.
    SavePartChanges,
    /// The server dropped this session.
    Drop,
    /// The document is locked by another session, auth will follow.
    WaitAuth,
    /// Old-style error, handled like [`MessageType::Drop`].
    Error,
    /// Document conversion finished.
    DocumentOpen,
    /// Server warning.
    Warning,
    /// License information, the first message of a session.
    License,
    /// Anything else.
    Unknown,
}

impl MessageType {
    /// Map a `type` field value to a message type.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "auth" => MessageType::Auth,
            "message" => MessageType::Message,
            "cursor" => MessageType::Cursor,
            "getLock" => MessageType::GetLock,
            "releaseLock" => MessageType::ReleaseLock,
            "connectState" => MessageType::ConnectState,
            "saveChanges" => MessageType::SaveChanges,
            "saveLock" => MessageType::SaveLock,
            "unSaveLock" => MessageType::UnSaveLock,
            "savePartChanges" => MessageType::SavePartChanges,
            "drop" => MessageType::Drop,
            "waitAuth" => MessageType::WaitAuth,
            "error" => MessageType::Error,
            "documentOpen" => MessageType::DocumentOpen,
            "warning" => MessageType::Warning,
            "license" => MessageType::License,
            _ => MessageType::Unknown,
        }
    }

    /// The wire tag, `"unknown"` for [`MessageType::Unknown`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageType::Auth => "auth",
            MessageType::Message => "message",
            MessageType::Cursor => "cursor",
            MessageType::GetLock => "getLock",
            MessageType::ReleaseLock => "releaseLock",
            MessageType::ConnectState => "connectState",
            MessageType::SaveChanges => "saveChanges",
            MessageType::SaveLock => "saveLock",
            MessageType::UnSaveLock => "unSaveLock",
            MessageType::SavePartChanges => "savePartChanges",
            MessageType::Drop => "drop",
            MessageType::WaitAuth => "waitAuth",
            MessageType::Error => "error",
            MessageType::DocumentOpen => "documentOpen",
            MessageType::Warning => "warning",
            MessageType::License => "license",
            MessageType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded message: its type plus the whole JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationMessage {
    /// Message type from the `type` field.
    pub kind: MessageType,
    /// The full JSON object, `type` included.
    pub body: Value,
}

impl ApplicationMessage {
    /// Wrap an already-decoded JSON value.
    ///
    /// A missing or non-string `type` yields [`MessageType::Unknown`].
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        let kind = body
            .get("type")
            .and_then(Value::as_str)
            .map_or(MessageType::Unknown, MessageType::from_tag);
        Self { kind, body }
    }

    /// Decode a message from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `text` is not valid JSON.
    pub fn parse(text: &str) -> Result<Self> {
        let body: Value = serde_json::from_str(text)?;
        if !body.is_object() {
            return Err(Error::Json(format!("expected a JSON object, got: {text}")));
        }
        Ok(Self::from_value(body))
    }

    /// Id of the first entry in `participants`, as sent with `auth`.
    #[must_use]
    pub fn first_participant_id(&self) -> Option<&str> {
        self.body
            .get("participants")?
            .as_array()?
            .first()?
            .get("id")?
            .as_str()
    }

    /// URL of the converted `Editor.bin`, as sent with `documentOpen`.
    #[must_use]
    pub fn editor_bin_url(&self) -> Option<&str> {
        self.body.get("data")?.get("data")?.get("Editor.bin")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MessageType; 16] = [
        MessageType::Auth,
        MessageType::Message,
        MessageType::Cursor,
        MessageType::GetLock,
        MessageType::ReleaseLock,
        MessageType::ConnectState,
        MessageType::SaveChanges,
        MessageType::SaveLock,
        MessageType::UnSaveLock,
        MessageType::SavePartChanges,
        MessageType::Drop,
        MessageType::WaitAuth,
        MessageType::Error,
        MessageType::DocumentOpen,
        MessageType::Warning,
        MessageType::License,
    ];

    #[test]
    fn test_tags_map_back() {
        for kind in ALL {
            assert_eq!(MessageType::from_tag(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(MessageType::from_tag("rpc"), MessageType::Unknown);
        assert_eq!(MessageType::from_tag("Auth"), MessageType::Unknown);
    }

    #[test]
    fn test_parse_message() {
        let msg = ApplicationMessage::parse(r#"{"type":"cursor","messages":[]}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Cursor);
        assert!(msg.body.get("messages").is_some());
    }

    #[test]
    fn test_parse_missing_type() {
        let msg = ApplicationMessage::parse(r#"{"participants":[]}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Unknown);
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(matches!(
            ApplicationMessage::parse("{\"type\":"),
            Err(Error::Json(_))
        ));
        assert!(matches!(ApplicationMessage::parse("42"), Err(Error::Json(_))));
    }

    #[test]
    fn test_first_participant_id() {
        let msg = ApplicationMessage::parse(
            r#"{"type":"auth","participants":[{"id":"u42"},{"id":"u7"}]}"#,
        )
        .unwrap();
        assert_eq!(msg.first_participant_id(), Some("u42"));

        let empty = ApplicationMessage::parse(r#"{"type":"auth","participants":[]}"#).unwrap();
        assert_eq!(empty.first_participant_id(), None);
    }

    #[test]
    fn test_editor_bin_url() {
        let msg = ApplicationMessage::parse(
            r#"{"type":"documentOpen","data":{"type":"open","status":"ok","data":{"Editor.bin":"http://cache/Editor.bin"}}}"#,
        )
        .unwrap();
        assert_eq!(msg.editor_bin_url(), Some("http://cache/Editor.bin"));

        let failed = ApplicationMessage::parse(
            r#"{"type":"documentOpen","data":{"type":"open","status":"err","data":-4}}"#,
        )
        .unwrap();
        assert_eq!(failed.editor_bin_url(), None);
    }
}
