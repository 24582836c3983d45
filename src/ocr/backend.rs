//! Converter abstraction for turning scans and photos into searchable PDFs.
//!
//! Supports two converters:
//! - ConvertAPI: image to PDF, then an OCR pass, over the vendor's REST API
//! - Drive native: Google Docs import (which runs OCR) exported back as PDF

use async_trait::async_trait;
use thiserror::Error;

/// Errors from OCR converters.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Converter not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Rate limited by {backend}, retry after {retry_after_secs:?}s")]
    RateLimited {
        backend: ConverterType,
        retry_after_secs: Option<u64>,
    },

    #[error("Unsupported media type for OCR: {0}")]
    UnsupportedMediaType(String),

    #[error("{backend} returned HTTP {status}: {body}")]
    Api {
        backend: ConverterType,
        status: u16,
        body: String,
    },
}

/// Available converter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterType {
    /// ConvertAPI cloud service.
    ConvertApi,
    /// Google Drive's own OCR on Docs import.
    DriveNative,
}

impl ConverterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConverterType::ConvertApi => "convertapi",
            ConverterType::DriveNative => "drive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "convertapi" => Some(ConverterType::ConvertApi),
            "drive" | "drive-native" | "google-drive" => Some(ConverterType::DriveNative),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConverterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Turns an image into a PDF whose text layer can be extracted.
#[async_trait]
pub trait SearchablePdfConverter: Send + Sync {
    /// Get the converter type.
    fn converter_type(&self) -> ConverterType;

    /// Check if this converter can run (credentials configured).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this converter available.
    fn availability_hint(&self) -> String;

    /// Convert `content` of media type `mime_type` into searchable PDF bytes.
    async fn to_searchable_pdf(&self, content: &[u8], mime_type: &str) -> Result<Vec<u8>, OcrError>;
}

/// File extension ConvertAPI and Drive expect for an image media type.
pub fn image_extension(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        "image/webp" => Some("webp"),
        "image/heic" | "image/heif" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_type_round_trip_names() {
        assert_eq!(ConverterType::from_str("ConvertAPI"), Some(ConverterType::ConvertApi));
        assert_eq!(ConverterType::from_str(" drive "), Some(ConverterType::DriveNative));
        assert_eq!(ConverterType::from_str("tesseract"), None);
        assert_eq!(ConverterType::DriveNative.to_string(), "drive");
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("IMAGE/PNG; q=1"), Some("png"));
        assert_eq!(image_extension("application/pdf"), None);
    }
}
