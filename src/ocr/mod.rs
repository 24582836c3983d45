//! OCR and text extraction module.
//!
//! Turns uploads into text the classifier can read:
//! - Images are converted to searchable PDFs by a [`SearchablePdfConverter`]
//!   (ConvertAPI or Google Drive's own OCR, optionally chained)
//! - PDFs have their text layer read by a [`TextExtractor`] (pdftotext)
//!
//! ## Converters
//!
//! - **drive**: imports the image as a Google Doc and exports it as PDF
//! - **convertapi**: image to PDF then OCR over ConvertAPI's REST API
//!
//! `FallbackConverter` tries them in the configured order.

mod api_backend;
mod backend;
mod convertapi;
mod drive_native;
mod extractor;
mod fallback;

pub use api_backend::{backoff_delay, parse_retry_after, MAX_RETRIES};
pub use backend::{image_extension, ConverterType, OcrError, SearchablePdfConverter};
pub use convertapi::{ConvertApiConverter, DEFAULT_CONVERTAPI_URL};
pub use drive_native::DriveNativeConverter;
pub use extractor::{check_binary, ExtractionError, PdfToTextExtractor, TextExtractor};
pub use fallback::{ConverterDeps, FallbackConverter};
