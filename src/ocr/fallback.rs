//! Fallback converter that tries multiple converters in sequence.
//!
//! When a converter fails (rate limited, vendor error, network) the next one
//! in the chain is tried; the last error is returned when all of them fail.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::backend::{ConverterType, OcrError, SearchablePdfConverter};
use super::convertapi::{ConvertApiConverter, DEFAULT_CONVERTAPI_URL};
use super::drive_native::DriveNativeConverter;
use crate::drive::DriveClient;

/// What the named converters need to be constructed.
#[derive(Clone, Default)]
pub struct ConverterDeps {
    /// Drive client, when Google credentials are configured.
    pub drive: Option<Arc<DriveClient>>,
    /// Folder for Drive's temporary OCR documents.
    pub scratch_folder_id: String,
    pub convertapi_secret: Option<String>,
    /// ConvertAPI base URL; the public endpoint when unset.
    pub convertapi_url: Option<String>,
}

/// A fallback chain of converters.
pub struct FallbackConverter {
    /// Ordered list of converters to try.
    converters: Vec<Arc<dyn SearchablePdfConverter>>,
}

impl FallbackConverter {
    /// Build a chain, keeping only the converters that are available.
    pub fn new(candidates: Vec<Arc<dyn SearchablePdfConverter>>) -> Self {
        let mut converters = Vec::new();

        for converter in candidates {
            if converter.is_available() {
                debug!("OCR fallback chain: added {} converter", converter.converter_type());
                converters.push(converter);
            } else {
                debug!(
                    "OCR fallback chain: {} not available ({})",
                    converter.converter_type(),
                    converter.availability_hint()
                );
            }
        }

        info!(
            "OCR fallback chain initialized with {} converters",
            converters.len()
        );

        Self { converters }
    }

    /// Build a chain from converter names (e.g. `["drive", "convertapi"]`).
    pub fn from_names(names: &[&str], deps: &ConverterDeps) -> Self {
        let mut candidates = Vec::new();
        for name in names {
            match Self::create_converter(name, deps) {
                Some(converter) => candidates.push(converter),
                None => warn!("OCR fallback chain: unknown or unconfigured converter '{}'", name),
            }
        }
        Self::new(candidates)
    }

    /// Create a converter by name.
    fn create_converter(name: &str, deps: &ConverterDeps) -> Option<Arc<dyn SearchablePdfConverter>> {
        match ConverterType::from_str(name)? {
            ConverterType::ConvertApi => Some(Arc::new(ConvertApiConverter::with_base_url(
                deps.convertapi_secret.clone(),
                deps.convertapi_url.as_deref().unwrap_or(DEFAULT_CONVERTAPI_URL),
            ))),
            ConverterType::DriveNative => {
                let client = deps.drive.clone()?;
                Some(Arc::new(DriveNativeConverter::new(
                    client,
                    deps.scratch_folder_id.clone(),
                )))
            }
        }
    }

    /// Get the list of converter types in the chain.
    pub fn available_converters(&self) -> Vec<ConverterType> {
        self.converters.iter().map(|c| c.converter_type()).collect()
    }

    pub fn has_converters(&self) -> bool {
        !self.converters.is_empty()
    }
}

#[async_trait]
impl SearchablePdfConverter for FallbackConverter {
    fn converter_type(&self) -> ConverterType {
        // Report the type of the first converter in the chain
        self.converters
            .first()
            .map(|c| c.converter_type())
            .unwrap_or(ConverterType::DriveNative)
    }

    fn is_available(&self) -> bool {
        self.converters.iter().any(|c| c.is_available())
    }

    fn availability_hint(&self) -> String {
        if self.converters.is_empty() {
            "No OCR converters configured or available".to_string()
        } else {
            format!(
                "Fallback chain: {}",
                self.converters
                    .iter()
                    .map(|c| c.converter_type().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            )
        }
    }

    async fn to_searchable_pdf(&self, content: &[u8], mime_type: &str) -> Result<Vec<u8>, OcrError> {
        let mut last_error: Option<OcrError> = None;

        for converter in &self.converters {
            match converter.to_searchable_pdf(content, mime_type).await {
                Ok(pdf) => {
                    debug!("OCR succeeded with {} converter", converter.converter_type());
                    return Ok(pdf);
                }
                Err(OcrError::UnsupportedMediaType(mime)) => {
                    // No converter will handle it either
                    return Err(OcrError::UnsupportedMediaType(mime));
                }
                Err(e) => {
                    warn!("OCR converter {} failed: {}", converter.converter_type(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::BackendNotAvailable("No OCR converters available".to_string())
        }))
    }
}
