//! Text extraction from PDFs using pdftotext.

use std::io::Write;
use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the text layer of a PDF.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Text of every page, in order. A PDF without a text layer yields "".
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError>;
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Outcome of one pdftotext run.
enum CmdOutcome {
    Text(String),
    /// The tool ran and rejected the input.
    Rejected(String),
}

/// Handle command output, extracting stdout on success.
fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
) -> Result<CmdOutcome, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(CmdOutcome::Text(
                    String::from_utf8_lossy(&output.stdout).to_string(),
                ))
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Ok(CmdOutcome::Rejected(stderr.trim().to_string()))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Poppler's `pdftotext`, fed through a temporary file.
#[derive(Debug, Clone)]
pub struct PdfToTextExtractor {
    binary: String,
}

impl Default for PdfToTextExtractor {
    fn default() -> Self {
        Self {
            binary: "pdftotext".to_string(),
        }
    }
}

impl PdfToTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pdftotext binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn is_available(&self) -> bool {
        check_binary(&self.binary)
    }

    async fn run(&self, path: &Path) -> Result<CmdOutcome, ExtractionError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-layout", "-enc", "UTF-8"]).arg(path).arg("-");

        handle_cmd_output(
            cmd.output().await,
            &format!("{} (install poppler-utils)", self.binary),
        )
    }
}

#[async_trait]
impl TextExtractor for PdfToTextExtractor {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let mut file = tempfile::Builder::new()
            .prefix("docintake-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(pdf)?;
        file.flush()?;

        match self.run(file.path()).await? {
            CmdOutcome::Text(text) => {
                debug!("pdftotext extracted {} chars", text.chars().count());
                Ok(text)
            }
            CmdOutcome::Rejected(stderr) => {
                warn!("pdftotext could not parse document, treating as empty: {}", stderr);
                Ok(String::new())
            }
        }
    }
}
