//! ConvertAPI converter against a mock server.

use base64::Engine;
use docintake::ocr::{ConvertApiConverter, OcrError, SearchablePdfConverter, MAX_RETRIES};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn file_response(name: &str, data: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ConversionCost": 1,
        "Files": [{
            "FileName": name,
            "FileExt": "pdf",
            "FileData": base64::engine::general_purpose::STANDARD.encode(data)
        }]
    }))
}

fn converter(server: &MockServer) -> ConvertApiConverter {
    ConvertApiConverter::with_base_url(Some("secret-1".to_string()), &server.uri())
        .with_retry_base_ms(1)
}

#[tokio::test]
async fn test_image_is_wrapped_then_ocred() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convert/jpg/to/pdf"))
        .and(header("Authorization", "Bearer secret-1"))
        .respond_with(file_response("upload.pdf", b"%PDF-1.4 wrapped"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/convert/pdf/to/ocr"))
        .respond_with(file_response("upload.pdf", b"%PDF-1.4 searchable"))
        .expect(1)
        .mount(&server)
        .await;

    let pdf = converter(&server)
        .to_searchable_pdf(b"jpeg bytes", "image/jpeg")
        .await
        .unwrap();

    assert_eq!(pdf, b"%PDF-1.4 searchable");
}

#[tokio::test]
async fn test_pdf_goes_straight_to_ocr() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convert/pdf/to/ocr"))
        .respond_with(file_response("scan.pdf", b"%PDF-1.4 searchable"))
        .expect(1)
        .mount(&server)
        .await;

    let pdf = converter(&server)
        .to_searchable_pdf(b"%PDF-1.4 scan", "application/pdf")
        .await
        .unwrap();

    assert_eq!(pdf, b"%PDF-1.4 searchable");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convert/png/to/pdf"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/convert/png/to/pdf"))
        .respond_with(file_response("upload.pdf", b"%PDF-1.4 wrapped"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/convert/pdf/to/ocr"))
        .respond_with(file_response("upload.pdf", b"%PDF-1.4 searchable"))
        .mount(&server)
        .await;

    let pdf = converter(&server)
        .to_searchable_pdf(b"png bytes", "image/png")
        .await
        .unwrap();

    assert_eq!(pdf, b"%PDF-1.4 searchable");
}

#[tokio::test]
async fn test_persistent_rate_limit_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convert/pdf/to/ocr"))
        .respond_with(ResponseTemplate::new(429))
        .expect(MAX_RETRIES as u64)
        .mount(&server)
        .await;

    let err = converter(&server)
        .to_searchable_pdf(b"%PDF-1.4", "application/pdf")
        .await
        .unwrap_err();

    assert!(matches!(err, OcrError::RateLimited { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_api_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convert/pdf/to/ocr"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid secret"))
        .mount(&server)
        .await;

    let err = converter(&server)
        .to_searchable_pdf(b"%PDF-1.4", "application/pdf")
        .await
        .unwrap_err();

    match err {
        OcrError::Api { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid secret"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}
