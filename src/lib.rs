//! docintake - tax document intake.
//!
//! Receives client documents (PDFs and photos), makes images searchable
//! through OCR, classifies each document by keyword and files it under
//! `<root>/<client>/<category>/` in Google Drive.

pub mod checklist;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod drive;
pub mod ocr;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod utils;
