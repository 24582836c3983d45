//! Authenticated Drive v3 REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::auth::{TokenProvider, DEFAULT_TOKEN_URL};
use super::{child_folder_query, DriveCredentials, DriveError, DriveFile};
use super::{FOLDER_MIME_TYPE, GOOGLE_DOC_MIME_TYPE};
use crate::storage::{HierarchicalStore, StorageError};

/// Endpoints and timeouts for [`DriveClient`].
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Base of the metadata API, e.g. `https://www.googleapis.com/drive/v3`.
    pub api_base: String,
    /// Base of the media upload API.
    pub upload_base: String,
    /// OAuth token endpoint used with refresh-token credentials.
    pub token_url: String,
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl DriveConfig {
    /// Point every endpoint at one server, as a mock server would expose them.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: format!("{}/drive/v3", base),
            upload_base: format!("{}/upload/drive/v3", base),
            token_url: format!("{}/token", base),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive client scoped to folders and files reachable with the given credentials.
pub struct DriveClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    config: DriveConfig,
}

impl DriveClient {
    pub fn new(config: DriveConfig, credentials: DriveCredentials) -> Result<Self, DriveError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("docintake/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = TokenProvider::new(credentials, config.token_url.clone(), http.clone());

        Ok(Self {
            http,
            tokens,
            config,
        })
    }

    /// Attach the bearer token, send, and turn non-2xx answers into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DriveError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 401 {
            // Expired or revoked; make the next call fetch a fresh token
            self.tokens.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(DriveError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Folders named `name` directly under `parent_id`, oldest first.
    pub async fn find_folders(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Vec<DriveFile>, DriveError> {
        let query = child_folder_query(parent_id, name);
        let url = format!("{}/files", self.config.api_base);

        let mut found = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("q", query.as_str()),
                ("fields", "nextPageToken,files(id,name,mimeType)"),
                ("orderBy", "createdTime"),
                ("corpora", "allDrives"),
                ("includeItemsFromAllDrives", "true"),
                ("supportsAllDrives", "true"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self.send(self.http.get(&url).query(&params)).await?;
            let page: FileList = response
                .json()
                .await
                .map_err(|e| DriveError::Parse(e.to_string()))?;

            // the query's name match is not guaranteed to respect case
            found.extend(
                page.files
                    .into_iter()
                    .filter(|f| f.is_folder() && f.name == name),
            );

            match page.next_page_token {
                Some(token) => {
                    debug!("Fetching next page of folder lookup");
                    page_token = Some(token);
                }
                None => break,
            }
        }

        Ok(found)
    }

    /// Create a folder under `parent_id`.
    pub async fn make_folder(&self, parent_id: &str, name: &str) -> Result<String, DriveError> {
        let url = format!("{}/files", self.config.api_base);
        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });

        let response = self
            .send(
                self.http
                    .post(&url)
                    .query(&[("supportsAllDrives", "true"), ("fields", "id")])
                    .json(&metadata),
            )
            .await?;

        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    /// Upload `content` with its metadata in one multipart/related request.
    async fn upload(
        &self,
        metadata: serde_json::Value,
        content: &[u8],
        media_type: &str,
    ) -> Result<String, DriveError> {
        let url = format!("{}/files", self.config.upload_base);
        let boundary = format!("docintake-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, content, media_type);

        let response = self
            .send(
                self.http
                    .post(&url)
                    .query(&[
                        ("uploadType", "multipart"),
                        ("supportsAllDrives", "true"),
                        ("fields", "id"),
                    ])
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/related; boundary={}", boundary),
                    )
                    .body(body),
            )
            .await?;

        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    /// Upload a file as is.
    pub async fn put_file(
        &self,
        parent_id: &str,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<String, DriveError> {
        let metadata = json!({
            "name": name,
            "parents": [parent_id],
        });
        let id = self.upload(metadata, content, mime_type).await?;
        info!("Uploaded '{}' ({} bytes) as {}", name, content.len(), id);
        Ok(id)
    }

    /// Upload an image and have Drive convert it into a Google Doc.
    ///
    /// Drive runs OCR during the conversion; the resulting document holds the
    /// recognized text.
    pub async fn import_as_document(
        &self,
        parent_id: &str,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<String, DriveError> {
        let metadata = json!({
            "name": name,
            "mimeType": GOOGLE_DOC_MIME_TYPE,
            "parents": [parent_id],
        });
        self.upload(metadata, content, mime_type).await
    }

    /// Export a Google Doc as PDF bytes.
    pub async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let url = format!("{}/files/{}/export", self.config.api_base, file_id);
        let response = self
            .send(self.http.get(&url).query(&[("mimeType", "application/pdf")]))
            .await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Permanently delete a file.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), DriveError> {
        let url = format!("{}/files/{}", self.config.api_base, file_id);
        self.send(self.http.delete(&url).query(&[("supportsAllDrives", "true")]))
            .await?;
        Ok(())
    }
}

/// Build a multipart/related body: JSON metadata part, then the media part.
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    content: &[u8],
    media_type: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
            b = boundary,
            m = metadata,
            t = media_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl HierarchicalStore for DriveClient {
    fn provider(&self) -> &'static str {
        "google-drive"
    }

    async fn list_children(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Vec<String>, StorageError> {
        let folders = self.find_folders(parent_id, name).await.map_err(|e| {
            warn!("Folder lookup for '{}' under {} failed: {}", name, parent_id, e);
            StorageError::from(e)
        })?;
        Ok(folders.into_iter().map(|f| f.id).collect())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, StorageError> {
        Ok(self.make_folder(parent_id, name).await?)
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<String, StorageError> {
        Ok(self.put_file(parent_id, name, content, mime_type).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_related_body_layout() {
        let metadata = json!({"name": "a.pdf"});
        let body = multipart_related_body("XYZ", &metadata, b"%PDF-1.4", "application/pdf");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--XYZ\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(text.contains(r#"{"name":"a.pdf"}"#));
        assert!(text.contains("--XYZ\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"));
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
    }

    #[test]
    fn test_with_base_url() {
        let config = DriveConfig::with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.api_base, "http://127.0.0.1:8080/drive/v3");
        assert_eq!(config.upload_base, "http://127.0.0.1:8080/upload/drive/v3");
        assert_eq!(config.token_url, "http://127.0.0.1:8080/token");
    }
}
