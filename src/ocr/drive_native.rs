//! OCR through Google Drive's Docs import.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::{image_extension, ConverterType, OcrError, SearchablePdfConverter};
use crate::drive::{DriveClient, DriveError};

/// Uploads the image as a Google Doc, exports it as PDF and deletes the doc.
pub struct DriveNativeConverter {
    client: Arc<DriveClient>,
    /// Folder that holds the temporary documents.
    scratch_folder_id: String,
}

impl DriveNativeConverter {
    pub fn new(client: Arc<DriveClient>, scratch_folder_id: impl Into<String>) -> Self {
        Self {
            client,
            scratch_folder_id: scratch_folder_id.into(),
        }
    }
}

fn drive_error(e: DriveError) -> OcrError {
    match e {
        DriveError::Status { status, body } => OcrError::Api {
            backend: ConverterType::DriveNative,
            status,
            body,
        },
        other => OcrError::OcrFailed(other.to_string()),
    }
}

#[async_trait]
impl SearchablePdfConverter for DriveNativeConverter {
    fn converter_type(&self) -> ConverterType {
        ConverterType::DriveNative
    }

    fn is_available(&self) -> bool {
        !self.scratch_folder_id.is_empty()
    }

    fn availability_hint(&self) -> String {
        "Drive OCR requires Google credentials and a root folder".to_string()
    }

    async fn to_searchable_pdf(&self, content: &[u8], mime_type: &str) -> Result<Vec<u8>, OcrError> {
        let ext = image_extension(mime_type)
            .ok_or_else(|| OcrError::UnsupportedMediaType(mime_type.to_string()))?;
        let name = format!("temp_ocr_{}.{}", uuid::Uuid::new_v4().simple(), ext);

        let doc_id = self
            .client
            .import_as_document(&self.scratch_folder_id, &name, content, mime_type)
            .await
            .map_err(drive_error)?;
        debug!("Imported {} as Google Doc {}", name, doc_id);

        let exported = self.client.export_pdf(&doc_id).await.map_err(drive_error);

        // The temporary doc goes regardless of how the export went
        if let Err(e) = self.client.delete_file(&doc_id).await {
            warn!("Failed to delete temporary OCR document {}: {}", doc_id, e);
        }

        exported
    }
}
