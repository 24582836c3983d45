//! Intake pipeline.
//!
//! Takes uploaded documents for one client through
//! `Received -> TextExtractionRequested (images only) -> TextExtracted ->
//! Classified -> FolderResolved -> Stored` and files each one as
//! `<root>/<client>/<category>/<name>.pdf`.
//!
//! A document that cannot be turned into text ends in `ExtractionFailed` and
//! nothing is stored for it. Failures are per document: the rest of the batch
//! is still processed. Nothing is retried here; rate-limit backoff lives in
//! the converters.

mod types;

pub use types::{
    BatchReport, ClientId, Document, IntakeContext, IntakeError, IntakeEvent, ItemOutcome, Stage,
};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::classifier::KeywordClassifier;
use crate::ocr::{SearchablePdfConverter, TextExtractor};
use crate::storage::{resolve_path, HierarchicalStore, StorageError};
use crate::utils::{detect_mime, media_kind, pdf_file_name, MediaKind};

/// Wires the converter, extractor, classifier and store together.
pub struct IntakePipeline {
    store: Arc<dyn HierarchicalStore>,
    converter: Arc<dyn SearchablePdfConverter>,
    extractor: Arc<dyn TextExtractor>,
    classifier: Arc<KeywordClassifier>,
    root_folder_id: String,
}

impl IntakePipeline {
    pub fn new(
        store: Arc<dyn HierarchicalStore>,
        converter: Arc<dyn SearchablePdfConverter>,
        extractor: Arc<dyn TextExtractor>,
        classifier: Arc<KeywordClassifier>,
        root_folder_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            converter,
            extractor,
            classifier,
            root_folder_id: root_folder_id.into(),
        }
    }

    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    pub fn root_folder_id(&self) -> &str {
        &self.root_folder_id
    }

    /// Process one document. Never fails as a whole; the outcome carries the
    /// terminal stage and, on failure, the error message.
    pub async fn process(&self, ctx: &IntakeContext, doc: &Document) -> ItemOutcome {
        self.process_item(ctx, doc, 0, None).await
    }

    /// Process documents one after another.
    ///
    /// A failing document is recorded in the report and the batch moves on.
    /// Progress events go to `on_progress` when given.
    pub async fn process_batch(
        &self,
        ctx: &IntakeContext,
        docs: &[Document],
        on_progress: Option<mpsc::Sender<IntakeEvent>>,
    ) -> BatchReport {
        let started_at = Utc::now();
        info!(
            "[{}] Intake of {} document(s) for client '{}'",
            ctx.request_id,
            docs.len(),
            ctx.client_id
        );
        emit(&on_progress, IntakeEvent::BatchStarted { total: docs.len() }).await;

        let mut items = Vec::with_capacity(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            emit(
                &on_progress,
                IntakeEvent::ItemStarted {
                    index,
                    filename: doc.filename.clone(),
                },
            )
            .await;

            let outcome = self.process_item(ctx, doc, index, on_progress.as_ref()).await;

            emit(
                &on_progress,
                IntakeEvent::ItemFinished {
                    index,
                    outcome: outcome.clone(),
                },
            )
            .await;
            items.push(outcome);
        }

        let report = BatchReport {
            request_id: ctx.request_id.clone(),
            client_id: ctx.client_id.clone(),
            items,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "[{}] Intake finished: {} stored, {} failed",
            ctx.request_id,
            report.stored(),
            report.failed()
        );
        emit(
            &on_progress,
            IntakeEvent::BatchFinished {
                stored: report.stored(),
                failed: report.failed(),
            },
        )
        .await;

        report
    }

    async fn process_item(
        &self,
        ctx: &IntakeContext,
        doc: &Document,
        index: usize,
        events: Option<&mpsc::Sender<IntakeEvent>>,
    ) -> ItemOutcome {
        let mut outcome = ItemOutcome::received(&doc.filename);

        if let Err(e) = self.run(ctx, doc, index, events, &mut outcome).await {
            outcome.stage = e.failure_stage();
            outcome.error = Some(e.to_string());
            warn!(
                "[{}] '{}' ended in {}: {}",
                ctx.request_id, doc.filename, outcome.stage, e
            );
        }

        outcome
    }

    /// Text of `doc`, running OCR first for images. Nothing is stored.
    pub async fn extract_text(&self, doc: &Document) -> Result<String, IntakeError> {
        let mime = detect_mime(&doc.content, &doc.filename, doc.declared_mime.as_deref());
        let pdf = self.searchable_pdf(doc, &mime).await?;
        Ok(self.extractor.extract_text(&pdf).await?)
    }

    async fn searchable_pdf(&self, doc: &Document, mime: &str) -> Result<Vec<u8>, IntakeError> {
        match media_kind(mime) {
            MediaKind::Pdf => Ok(doc.content.clone()),
            MediaKind::Image => Ok(self.converter.to_searchable_pdf(&doc.content, mime).await?),
            MediaKind::Other => Err(IntakeError::Extraction(format!(
                "unsupported media type {}",
                mime
            ))),
        }
    }

    /// Drive one document forward, recording each stage in `outcome`.
    async fn run(
        &self,
        ctx: &IntakeContext,
        doc: &Document,
        index: usize,
        events: Option<&mpsc::Sender<IntakeEvent>>,
        outcome: &mut ItemOutcome,
    ) -> Result<(), IntakeError> {
        let mime = detect_mime(&doc.content, &doc.filename, doc.declared_mime.as_deref());
        debug!("[{}] '{}' detected as {}", ctx.request_id, doc.filename, mime);

        if media_kind(&mime) == MediaKind::Image {
            advance(outcome, Stage::TextExtractionRequested, index, events).await;
        }
        let pdf = self.searchable_pdf(doc, &mime).await?;

        let text = self.extractor.extract_text(&pdf).await?;
        advance(outcome, Stage::TextExtracted, index, events).await;

        let classification = self.classifier.classify(&text);
        outcome.category = Some(classification.category.clone());
        outcome.matched_keyword = classification.matched_keyword.clone();
        advance(outcome, Stage::Classified, index, events).await;

        let mut chain = resolve_path(
            self.store.as_ref(),
            &self.root_folder_id,
            &[ctx.client_id.as_str(), classification.category.as_str()],
        )
        .await?;
        let folder_id = chain.pop().map(|leaf| leaf.id).ok_or_else(|| {
            StorageError::Unavailable("folder path resolved to nothing".to_string())
        })?;
        outcome.folder_id = Some(folder_id.clone());
        advance(outcome, Stage::FolderResolved, index, events).await;

        let stored_name = pdf_file_name(&doc.filename);
        let file_id = self
            .store
            .upload_file(&folder_id, &stored_name, &pdf, "application/pdf")
            .await?;
        outcome.file_id = Some(file_id);
        outcome.stored_name = Some(stored_name.clone());
        advance(outcome, Stage::Stored, index, events).await;

        info!(
            "[{}] Stored '{}' as {}/{}/{}",
            ctx.request_id, doc.filename, ctx.client_id, classification.category, stored_name
        );
        Ok(())
    }
}

async fn advance(
    outcome: &mut ItemOutcome,
    stage: Stage,
    index: usize,
    events: Option<&mpsc::Sender<IntakeEvent>>,
) {
    outcome.stage = stage;
    if let Some(tx) = events {
        let _ = tx.send(IntakeEvent::StageReached { index, stage }).await;
    }
}

async fn emit(events: &Option<mpsc::Sender<IntakeEvent>>, event: IntakeEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
