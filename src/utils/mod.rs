//! Shared utility functions.
//!
//! - `mime`: media type detection and categorization
//! - `filename`: safe names for stored files

mod filename;
mod mime;

pub use filename::{pdf_file_name, sanitize_filename};
pub use mime::{detect_mime, guess_mime_from_filename, media_kind, MediaKind};
