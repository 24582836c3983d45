//! Intake pipeline types and events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::{ExtractionError, OcrError};
use crate::storage::StorageError;

/// Errors that end the processing of one document (or, for
/// `InvalidClient`, a whole request).
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Invalid client identifier: {0}")]
    InvalidClient(String),
}

impl From<OcrError> for IntakeError {
    fn from(e: OcrError) -> Self {
        IntakeError::Extraction(e.to_string())
    }
}

impl From<ExtractionError> for IntakeError {
    fn from(e: ExtractionError) -> Self {
        IntakeError::Extraction(e.to_string())
    }
}

impl IntakeError {
    /// Terminal stage a document ends in after this error.
    pub fn failure_stage(&self) -> Stage {
        match self {
            IntakeError::Storage(_) => Stage::StorageFailed,
            _ => Stage::ExtractionFailed,
        }
    }
}

/// Validated client identifier; used verbatim as the client folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(raw: &str) -> Result<Self, IntakeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IntakeError::InvalidClient(
                "client identifier is empty".to_string(),
            ));
        }
        if trimmed.contains('/') {
            return Err(IntakeError::InvalidClient(format!(
                "'{}' contains '/'",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request context handed to every pipeline call.
#[derive(Debug, Clone)]
pub struct IntakeContext {
    pub client_id: ClientId,
    /// Correlates log lines and the report of one request.
    pub request_id: String,
}

impl IntakeContext {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id(client_id: ClientId, request_id: impl Into<String>) -> Self {
        Self {
            client_id,
            request_id: request_id.into(),
        }
    }
}

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: Vec<u8>,
    /// Media type as declared by the uploader, if any.
    pub declared_mime: Option<String>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: Vec<u8>, declared_mime: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            content,
            declared_mime,
        }
    }
}

/// Where a document is in the intake state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    TextExtractionRequested,
    TextExtracted,
    Classified,
    FolderResolved,
    Stored,
    ExtractionFailed,
    StorageFailed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::TextExtractionRequested => "text_extraction_requested",
            Stage::TextExtracted => "text_extracted",
            Stage::Classified => "classified",
            Stage::FolderResolved => "folder_resolved",
            Stage::Stored => "stored",
            Stage::ExtractionFailed => "extraction_failed",
            Stage::StorageFailed => "storage_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Stage::ExtractionFailed | Stage::StorageFailed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub filename: String,
    pub stage: Stage,
    pub category: Option<String>,
    pub matched_keyword: Option<String>,
    /// Category folder the document was filed under.
    pub folder_id: Option<String>,
    pub file_id: Option<String>,
    /// Name the document was stored under.
    pub stored_name: Option<String>,
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn received(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            stage: Stage::Received,
            category: None,
            matched_keyword: None,
            folder_id: None,
            file_id: None,
            stored_name: None,
            error: None,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.stage == Stage::Stored
    }
}

/// Result of a whole request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub request_id: String,
    pub client_id: ClientId,
    pub items: Vec<ItemOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Number of documents stored.
    pub fn stored(&self) -> usize {
        self.items.iter().filter(|i| i.is_stored()).count()
    }

    /// Number of documents that ended in a failure stage.
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.stage.is_failure()).count()
    }
}

/// Events emitted during batch processing.
#[derive(Debug, Clone)]
pub enum IntakeEvent {
    /// Batch processing started
    BatchStarted { total: usize },
    /// Document processing started
    ItemStarted { index: usize, filename: String },
    /// Document moved to a new stage
    StageReached { index: usize, stage: Stage },
    /// Document reached a terminal stage
    ItemFinished { index: usize, outcome: ItemOutcome },
    /// Batch complete
    BatchFinished { stored: usize, failed: usize },
}
