//! Synthetic edit batches.
//!
//! Every save submits the same recorded word-processor change set: a run of
//! text insertions with two revision markers, serialized by the editor as
//! `<length>;<base64 blob>` tokens.

use serde::Serialize;

use crate::protocol::request::SYNTHETIC_USER_ID;

/// Recorded change tokens, as the editor would batch them.
const CANNED_CHANGES: [&str; 7] = [
    "80;AgAAADEAAQAAAP//AAAdcq7bTWYAAC0BAAAEAAAAAAAAAAAAAAABAAAAAAAAAPb///8aAAAANAAuADEALgA1AC4AMQAuAEAAQABSAGUAdgA=",
    "35;BgAAADEANQAwABwAAAABAAAAAQEAAAAAAAAAAQAAAHQAAAA=",
    "35;BgAAADEANQAwABwAAAABAAAAAQEAAAABAAAAAQAAAGUAAAA=",
    "35;BgAAADEANQAwABwAAAABAAAAAQEAAAACAAAAAQAAAHMAAAA=",
    "35;BgAAADEANQAwABwAAAABAAAAAQEAAAADAAAAAQAAAHQAAAA=",
    "80;AgAAADEAAQAAAP//AAAdcq7bTWYAAIsAAAABAAAAAQAAAAAAAAABAAAAAAAAAPb///8aAAAANAAuADEALgA1AC4AMQAuAEAAQABSAGUAdgA=",
    "35;BgAAADEANQAwABwAAAABAAAAAQEAAAAEAAAAAgAAAAAAAAA=",
];

/// Cursor state token sent alongside each save.
const CANNED_CURSOR: &str = "14;BgAAADEANQAwAAUAAAA=";

/// Body of a `saveChanges` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChangesRequest {
    /// JSON array of change tokens, sent as a string.
    pub changes: String,
    pub start_save_changes: bool,
    pub end_save_changes: bool,
    pub is_co_authoring: bool,
    pub is_excel: bool,
    pub delete_index: Option<u32>,
    /// JSON object naming the saving user, sent as a string.
    pub excel_additional_info: String,
}

#[derive(Serialize)]
struct AdditionalInfo<'a> {
    #[serde(rename = "Gk")]
    user_id: Option<&'a str>,
    #[serde(rename = "B4c")]
    synthetic_user: &'a str,
    #[serde(rename = "OLc")]
    cursor: &'a str,
}

impl SaveChangesRequest {
    /// The canned save cycle, attributed to `user_id` once the server assigned one.
    #[must_use]
    pub fn canned(user_id: Option<&str>) -> Self {
        let info = AdditionalInfo {
            user_id,
            synthetic_user: SYNTHETIC_USER_ID,
            cursor: CANNED_CURSOR,
        };
        Self {
            changes: serde_json::Value::from(CANNED_CHANGES.to_vec()).to_string(),
            start_save_changes: true,
            end_save_changes: true,
            is_co_authoring: false,
            is_excel: false,
            delete_index: None,
            excel_additional_info: serde_json::to_string(&info).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_changes_is_json_array_string() {
        let request = SaveChangesRequest::canned(Some("u1"));
        let tokens: Vec<String> = serde_json::from_str(&request.changes).unwrap();
        assert_eq!(tokens.len(), 7);
        assert!(tokens[0].starts_with("80;"));
        assert!(tokens.iter().all(|t| t.contains(';')));
    }

    #[test]
    fn test_flags() {
        let value = serde_json::to_value(SaveChangesRequest::canned(None)).unwrap();
        assert_eq!(value["startSaveChanges"], true);
        assert_eq!(value["endSaveChanges"], true);
        assert_eq!(value["isCoAuthoring"], false);
        assert_eq!(value["isExcel"], false);
        assert_eq!(value["deleteIndex"], Value::Null);
    }

    #[test]
    fn test_additional_info_names_user() {
        let request = SaveChangesRequest::canned(Some("u42"));
        assert!(request.excel_additional_info.contains("\"u42\""));

        let info: Value = serde_json::from_str(&request.excel_additional_info).unwrap();
        assert_eq!(info["Gk"], "u42");
        assert_eq!(info["B4c"], SYNTHETIC_USER_ID);
        assert_eq!(info["OLc"], CANNED_CURSOR);
    }

    #[test]
    fn test_additional_info_before_auth() {
        let request = SaveChangesRequest::canned(None);
        let info: Value = serde_json::from_str(&request.excel_additional_info).unwrap();
        assert_eq!(info["Gk"], Value::Null);
    }

    #[test]
    fn test_batch_is_deterministic() {
        assert_eq!(
            SaveChangesRequest::canned(Some("a")),
            SaveChangesRequest::canned(Some("a"))
        );
    }
}
