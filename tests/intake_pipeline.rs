//! End-to-end intake over the in-memory store.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docintake::classifier::{KeywordClassifier, KeywordDictionary};
use docintake::config::{load_settings_with_options, LoadOptions};
use docintake::ocr::{
    ConverterType, ExtractionError, FallbackConverter, OcrError, SearchablePdfConverter,
    TextExtractor,
};
use docintake::pipeline::{ClientId, Document, IntakeContext, IntakePipeline, Stage};
use docintake::storage::MemoryStore;

/// Pretends to OCR: the "image" bytes are the recognized text.
/// Images whose bytes start with `BROKEN` fail.
struct ScriptedConverter {
    kind: ConverterType,
    calls: AtomicUsize,
}

impl ScriptedConverter {
    fn new(kind: ConverterType) -> Self {
        Self {
            kind,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchablePdfConverter for ScriptedConverter {
    fn converter_type(&self) -> ConverterType {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    async fn to_searchable_pdf(&self, content: &[u8], _mime: &str) -> Result<Vec<u8>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.starts_with(b"BROKEN") {
            return Err(OcrError::OcrFailed("unreadable image".to_string()));
        }
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend_from_slice(content);
        Ok(pdf)
    }
}

/// Always rate limited.
struct ThrottledConverter;

#[async_trait]
impl SearchablePdfConverter for ThrottledConverter {
    fn converter_type(&self) -> ConverterType {
        ConverterType::DriveNative
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    async fn to_searchable_pdf(&self, _: &[u8], _: &str) -> Result<Vec<u8>, OcrError> {
        Err(OcrError::RateLimited {
            backend: ConverterType::DriveNative,
            retry_after_secs: Some(30),
        })
    }
}

/// Text is everything after the PDF header line.
struct BodyExtractor;

#[async_trait]
impl TextExtractor for BodyExtractor {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let text = String::from_utf8_lossy(pdf);
        Ok(text
            .split_once('\n')
            .map(|(_, body)| body.to_string())
            .unwrap_or_default())
    }
}

fn pipeline_with(
    store: Arc<MemoryStore>,
    converter: Arc<dyn SearchablePdfConverter>,
    dictionary: &KeywordDictionary,
) -> IntakePipeline {
    IntakePipeline::new(
        store,
        converter,
        Arc::new(BodyExtractor),
        Arc::new(KeywordClassifier::new(dictionary).unwrap()),
        "root",
    )
}

fn context(client: &str) -> IntakeContext {
    IntakeContext::new(ClientId::new(client).unwrap())
}

#[tokio::test]
async fn test_mixed_batch_files_each_document() {
    let store = Arc::new(MemoryStore::new("root"));
    let converter = Arc::new(ScriptedConverter::new(ConverterType::ConvertApi));
    let pipeline = pipeline_with(store.clone(), converter.clone(), &KeywordDictionary::default());

    let docs = vec![
        Document::new(
            "foto_recibo.jpg",
            b"RECIBO - Hospital Sao Lucas".to_vec(),
            Some("image/jpeg".to_string()),
        ),
        Document::new(
            "carta.pdf",
            b"%PDF-1.4\nPrezado senhor, segue em anexo".to_vec(),
            Some("application/pdf".to_string()),
        ),
        Document::new(
            "borrado.png",
            b"BROKEN image".to_vec(),
            Some("image/png".to_string()),
        ),
        Document::new(
            "boleto.pdf",
            b"%PDF-1.4\nIPVA 2025 - DETRAN".to_vec(),
            None,
        ),
    ];

    let report = pipeline
        .process_batch(&context("Joana Silva"), &docs, None)
        .await;

    assert_eq!(report.items.len(), 4);
    assert_eq!(report.stored(), 3);
    assert_eq!(report.failed(), 1);

    let medical = &report.items[0];
    assert_eq!(medical.stage, Stage::Stored);
    assert_eq!(medical.category.as_deref(), Some("Despesas Médicas"));
    assert_eq!(medical.matched_keyword.as_deref(), Some("hospital"));
    assert_eq!(
        store.folder_path(medical.file_id.as_deref().unwrap()),
        Some("Joana Silva/Despesas Médicas/foto_recibo.pdf".to_string())
    );

    let general = &report.items[1];
    assert_eq!(general.stage, Stage::Stored);
    assert_eq!(general.category.as_deref(), Some("Geral"));
    assert!(general.matched_keyword.is_none());

    let broken = &report.items[2];
    assert_eq!(broken.stage, Stage::ExtractionFailed);
    assert!(broken.category.is_none());
    assert!(broken.file_id.is_none());
    assert!(broken.error.as_deref().unwrap().contains("unreadable image"));

    let vehicle = &report.items[3];
    assert_eq!(vehicle.stage, Stage::Stored);
    assert_eq!(vehicle.category.as_deref(), Some("Veículos"));

    // PDFs never reach the converter
    assert_eq!(converter.calls.load(Ordering::SeqCst), 2);

    // one client folder, three category folders
    let folders = store.folders();
    assert_eq!(folders.iter().filter(|f| f.parent_id == "root").count(), 1);
    assert_eq!(folders.len(), 4);
    assert!(store.files().iter().all(|f| f.mime_type == "application/pdf"));
}

#[tokio::test]
async fn test_second_batch_reuses_client_folder() {
    let store = Arc::new(MemoryStore::new("root"));
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(ScriptedConverter::new(ConverterType::ConvertApi)),
        &KeywordDictionary::default(),
    );

    let first = vec![Document::new("a.pdf", b"%PDF-1.4\nholerite".to_vec(), None)];
    let second = vec![Document::new("b.pdf", b"%PDF-1.4\nsalario".to_vec(), None)];

    let r1 = pipeline.process_batch(&context("Carlos"), &first, None).await;
    let r2 = pipeline.process_batch(&context("Carlos"), &second, None).await;

    assert_eq!(r1.items[0].folder_id, r2.items[0].folder_id);
    assert_eq!(store.folders().len(), 2);
    assert_eq!(store.files().len(), 2);
}

#[tokio::test]
async fn test_fallback_chain_moves_past_rate_limited_converter() {
    let store = Arc::new(MemoryStore::new("root"));
    let backup = Arc::new(ScriptedConverter::new(ConverterType::ConvertApi));
    let chain: Vec<Arc<dyn SearchablePdfConverter>> =
        vec![Arc::new(ThrottledConverter), backup.clone()];
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(FallbackConverter::new(chain)),
        &KeywordDictionary::default(),
    );

    let docs = vec![Document::new(
        "mensalidade.jpg",
        b"Mensalidade escolar marco".to_vec(),
        Some("image/jpeg".to_string()),
    )];
    let report = pipeline.process_batch(&context("Rita"), &docs, None).await;

    assert_eq!(report.items[0].stage, Stage::Stored);
    assert_eq!(report.items[0].category.as_deref(), Some("Educação"));
    assert_eq!(backup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_storage_outage_keeps_classification() {
    let store = Arc::new(MemoryStore::new("root"));
    store.set_unavailable(true);
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(ScriptedConverter::new(ConverterType::ConvertApi)),
        &KeywordDictionary::default(),
    );

    let docs = vec![Document::new("iptu.pdf", b"%PDF-1.4\nIPTU 2025".to_vec(), None)];
    let report = pipeline.process_batch(&context("Paulo"), &docs, None).await;

    let item = &report.items[0];
    assert_eq!(item.stage, Stage::StorageFailed);
    assert_eq!(item.category.as_deref(), Some("Imóveis"));
    assert!(store.files().is_empty());
}

#[tokio::test]
async fn test_dictionary_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[classifier]
fallback = "Outros"

[[classifier.categories]]
name = "Previdência"
keywords = ["INSS", "previdencia"]

[[classifier.categories]]
name = "Bancos"
keywords = ["extrato"]
"#
    )
    .unwrap();

    let (settings, config) = load_settings_with_options(LoadOptions {
        config_path: Some(file.path().to_path_buf()),
    })
    .await
    .unwrap();
    assert_eq!(config.source_path.as_deref(), Some(file.path()));

    let store = Arc::new(MemoryStore::new("root"));
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(ScriptedConverter::new(ConverterType::ConvertApi)),
        &settings.dictionary,
    );

    let docs = vec![
        Document::new("a.pdf", b"%PDF-1.4\nExtrato INSS".to_vec(), None),
        Document::new("b.pdf", b"%PDF-1.4\nhospital".to_vec(), None),
    ];
    let report = pipeline.process_batch(&context("Lia"), &docs, None).await;

    // first category in file order wins
    assert_eq!(report.items[0].category.as_deref(), Some("Previdência"));
    assert_eq!(report.items[1].category.as_deref(), Some("Outros"));
}
