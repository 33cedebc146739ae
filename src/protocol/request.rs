//! Outbound requests.

use serde::Serialize;

use crate::protocol::edits::SaveChangesRequest;

/// Access token presented with every `auth`.
pub const AUTH_TOKEN: &str = "fghhfgsjdgfjs";

/// Synthetic user every session authenticates as.
pub const SYNTHETIC_USER_ID: &str = "uid-1";

/// Display name of the synthetic user.
pub const SYNTHETIC_USER_NAME: &str = "Jonn Smith";

/// Editor SDK version the harness claims to be.
pub const CLIENT_VERSION: &str = "3.0.9";

/// A request sent to the co-authoring server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Authenticate and open the document.
    Auth(AuthRequest),
    /// Fetch messages queued for this session.
    GetMessages,
    /// Submit a batch of changes.
    SaveChanges(SaveChangesRequest),
    /// End the editing session.
    Close,
}

impl Request {
    /// The `type` tag this request serializes with.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Request::Auth(_) => "auth",
            Request::GetMessages => "getMessages",
            Request::SaveChanges(_) => "saveChanges",
            Request::Close => "close",
        }
    }
}

/// User block of an `auth` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub index_user: i32,
}

/// Open command embedded in `auth`, asks the server to convert the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenCommand {
    pub c: String,
    pub id: String,
    #[serde(rename = "userid")]
    pub user_id: String,
    pub format: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "embeddedfonts")]
    pub embedded_fonts: bool,
    #[serde(rename = "viewmode")]
    pub view_mode: bool,
}

/// Body of an `auth` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(rename = "docid")]
    pub doc_id: String,
    pub token: String,
    pub user: AuthUser,
    pub editor_type: u8,
    pub last_other_save_time: i64,
    pub block: Vec<String>,
    pub session_id: Option<String>,
    pub view: bool,
    pub is_close_co_authoring: bool,
    pub open_cmd: OpenCommand,
    pub version: String,
}

impl AuthRequest {
    /// Authenticate as the synthetic user and open `url` as a docx under `doc_id`.
    #[must_use]
    pub fn new(doc_id: &str, url: &str) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            token: AUTH_TOKEN.to_string(),
            user: AuthUser {
                id: SYNTHETIC_USER_ID.to_string(),
                username: SYNTHETIC_USER_NAME.to_string(),
                index_user: -1,
            },
            editor_type: 1,
            last_other_save_time: -1,
            block: Vec::new(),
            session_id: None,
            view: false,
            is_close_co_authoring: false,
            open_cmd: OpenCommand {
                c: "open".to_string(),
                id: doc_id.to_string(),
                user_id: SYNTHETIC_USER_ID.to_string(),
                format: "docx".to_string(),
                url: url.to_string(),
                title: "test".to_string(),
                embedded_fonts: false,
                view_mode: false,
            },
            version: CLIENT_VERSION.to_string(),
        }
    }
}
