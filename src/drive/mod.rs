//! Google Drive v3 support.
//!
//! Provides:
//! - Folder id extraction from Drive folder URLs
//! - An authenticated REST client implementing [`HierarchicalStore`]
//! - Native OCR through Drive's Google Docs import
//!
//! Every call passes `supportsAllDrives=true` so shared drives behave like
//! "My Drive"; without it Drive answers 403 for folders on shared drives.
//!
//! [`HierarchicalStore`]: crate::storage::HierarchicalStore

mod auth;
mod client;

pub use auth::{DriveCredentials, TokenProvider};
pub use client::{DriveClient, DriveConfig};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageError;

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type that makes Drive convert an upload into a Google Doc (with OCR).
pub const GOOGLE_DOC_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Error types for Google Drive operations.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Drive returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid folder reference: {0}")]
    InvalidFolder(String),
}

impl DriveError {
    /// Whether Drive refused the call for lack of permission.
    pub fn is_permission_error(&self) -> bool {
        matches!(self, DriveError::Status { status: 401 | 403, .. } | DriveError::Auth(_))
    }
}

impl From<reqwest::Error> for DriveError {
    fn from(e: reqwest::Error) -> Self {
        DriveError::Http(e.to_string())
    }
}

impl From<DriveError> for StorageError {
    fn from(e: DriveError) -> Self {
        if e.is_permission_error() {
            StorageError::PermissionDenied(e.to_string())
        } else {
            StorageError::Unavailable(e.to_string())
        }
    }
}

/// Metadata of a file or folder as returned by the files endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Google Drive file ID.
    pub id: String,
    /// File name.
    #[serde(default)]
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: String,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Check if a string is a Google Drive folder URL.
pub fn is_google_drive_folder_url(url: &str) -> bool {
    url.contains("drive.google.com/drive/folders/")
        || url.contains("drive.google.com/drive/u/") && url.contains("/folders/")
}

/// Extract folder ID from a Google Drive folder URL.
///
/// Handles formats:
/// - https://drive.google.com/drive/folders/FOLDER_ID
/// - https://drive.google.com/drive/folders/FOLDER_ID?usp=sharing
/// - https://drive.google.com/drive/u/0/folders/FOLDER_ID
pub fn extract_folder_id(url: &str) -> Option<String> {
    let re = Regex::new(r"/folders/([a-zA-Z0-9_-]+)").ok()?;
    re.captures(url).map(|c| c[1].to_string())
}

/// Turn a configured root folder (raw id or folder URL) into a folder id.
///
/// Surrounding whitespace is dropped; a trailing space pasted with the id is
/// the usual cause of "file not found" on the first lookup.
pub fn parse_folder_reference(reference: &str) -> Result<String, DriveError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(DriveError::InvalidFolder("empty folder id".to_string()));
    }

    if is_google_drive_folder_url(trimmed) {
        return extract_folder_id(trimmed)
            .ok_or_else(|| DriveError::InvalidFolder(trimmed.to_string()));
    }

    if trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(trimmed.to_string())
    } else {
        Err(DriveError::InvalidFolder(trimmed.to_string()))
    }
}

/// Escape a value for use inside a single-quoted Drive query string.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive search query for non-trashed folders named `name` under `parent_id`.
pub fn child_folder_query(parent_id: &str, name: &str) -> String {
    format!(
        "name = '{}' and '{}' in parents and mimeType = '{}' and trashed = false",
        escape_query_value(name),
        escape_query_value(parent_id),
        FOLDER_MIME_TYPE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_google_drive_folder_url() {
        assert!(is_google_drive_folder_url(
            "https://drive.google.com/drive/folders/1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ"
        ));
        assert!(is_google_drive_folder_url(
            "https://drive.google.com/drive/u/0/folders/1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ"
        ));
        assert!(!is_google_drive_folder_url("https://google.com"));
        assert!(!is_google_drive_folder_url(
            "https://drive.google.com/file/d/abc123"
        ));
    }

    #[test]
    fn test_extract_folder_id() {
        assert_eq!(
            extract_folder_id(
                "https://drive.google.com/drive/folders/1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ?usp=sharing"
            ),
            Some("1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ".to_string())
        );
    }

    #[test]
    fn test_parse_folder_reference() {
        assert_eq!(
            parse_folder_reference("1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ ").unwrap(),
            "1hxtNpuLtMiwfahaBRQcKrH6w_2cN_YFQ"
        );
        assert_eq!(
            parse_folder_reference("https://drive.google.com/drive/folders/abc-DEF_1").unwrap(),
            "abc-DEF_1"
        );
        assert!(parse_folder_reference("   ").is_err());
        assert!(parse_folder_reference("not a folder id").is_err());
    }

    #[test]
    fn test_child_folder_query_escapes_quotes() {
        let q = child_folder_query("root1", "D'Ávila \\ Filhos");
        assert_eq!(
            q,
            "name = 'D\\'Ávila \\\\ Filhos' and 'root1' in parents \
             and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_permission_errors_map_to_storage() {
        let err: StorageError = DriveError::Status {
            status: 403,
            body: "insufficientFilePermissions".to_string(),
        }
        .into();
        assert!(matches!(err, StorageError::PermissionDenied(_)));

        let err: StorageError = DriveError::Http("connection reset".to_string()).into();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
