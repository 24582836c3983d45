//! ConvertAPI converter.
//!
//! Two calls: `/convert/{ext}/to/pdf` wraps the image in a PDF, then
//! `/convert/pdf/to/ocr` adds a text layer. Both return the file inline as
//! base64 in the JSON response.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use super::api_backend::retry_on_rate_limit;
use super::backend::{image_extension, ConverterType, OcrError, SearchablePdfConverter};
use crate::utils::{media_kind, MediaKind};

/// Default ConvertAPI endpoint.
pub const DEFAULT_CONVERTAPI_URL: &str = "https://v2.convertapi.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    #[serde(default)]
    files: Vec<ConvertedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    #[serde(default)]
    file_name: Option<String>,
    file_data: String,
}

/// ConvertAPI-backed converter.
pub struct ConvertApiConverter {
    http: reqwest::Client,
    base_url: String,
    secret: Option<String>,
    /// Base delay for 429 backoff.
    retry_base_ms: u64,
}

impl ConvertApiConverter {
    pub fn new(secret: Option<String>) -> Self {
        Self::with_base_url(secret, DEFAULT_CONVERTAPI_URL)
    }

    pub fn with_base_url(secret: Option<String>, base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.filter(|s| !s.trim().is_empty()),
            retry_base_ms: 1000,
        }
    }

    /// Override the backoff base delay.
    pub fn with_retry_base_ms(mut self, ms: u64) -> Self {
        self.retry_base_ms = ms;
        self
    }

    /// Run one conversion and return the first produced file.
    async fn convert(
        &self,
        from: &str,
        to: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<Vec<u8>, OcrError> {
        let secret = self.secret.as_deref().ok_or_else(|| {
            OcrError::BackendNotAvailable(self.availability_hint())
        })?;
        let url = format!("{}/convert/{}/to/{}", self.base_url, from, to);
        let file_name = format!("upload.{}", from);

        debug!("ConvertAPI: {} -> {} ({} bytes)", from, to, content.len());

        let response = retry_on_rate_limit(ConverterType::ConvertApi, self.retry_base_ms, || {
            let url = url.clone();
            let file_name = file_name.clone();
            async move {
                let part = Part::bytes(content.to_vec())
                    .file_name(file_name)
                    .mime_str(mime_type)
                    .map_err(|e| OcrError::OcrFailed(e.to_string()))?;
                let form = Form::new().part("File", part).text("StoreFile", "false");

                self.http
                    .post(&url)
                    .bearer_auth(secret)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| OcrError::OcrFailed(format!("ConvertAPI request failed: {}", e)))
            }
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api {
                backend: ConverterType::ConvertApi,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ConvertResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Invalid ConvertAPI response: {}", e)))?;

        let file = parsed
            .files
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::OcrFailed("ConvertAPI returned no files".to_string()))?;

        debug!(
            "ConvertAPI produced {}",
            file.file_name.as_deref().unwrap_or("<unnamed>")
        );

        base64::engine::general_purpose::STANDARD
            .decode(file.file_data.as_bytes())
            .map_err(|e| OcrError::OcrFailed(format!("Invalid base64 in ConvertAPI response: {}", e)))
    }
}

#[async_trait]
impl SearchablePdfConverter for ConvertApiConverter {
    fn converter_type(&self) -> ConverterType {
        ConverterType::ConvertApi
    }

    fn is_available(&self) -> bool {
        self.secret.is_some()
    }

    fn availability_hint(&self) -> String {
        "ConvertAPI requires CONVERTAPI_SECRET (or convertapi.secret in the config file)".to_string()
    }

    async fn to_searchable_pdf(&self, content: &[u8], mime_type: &str) -> Result<Vec<u8>, OcrError> {
        let pdf = if media_kind(mime_type) == MediaKind::Pdf {
            content.to_vec()
        } else {
            let ext = image_extension(mime_type)
                .ok_or_else(|| OcrError::UnsupportedMediaType(mime_type.to_string()))?;
            self.convert(ext, "pdf", content, mime_type).await?
        };

        let searchable = self.convert("pdf", "ocr", &pdf, "application/pdf").await?;
        info!(
            "ConvertAPI OCR complete ({} -> {} bytes)",
            content.len(),
            searchable.len()
        );
        Ok(searchable)
    }
}
