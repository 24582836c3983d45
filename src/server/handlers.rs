//! HTTP request handlers for the intake server.

use askama::Template;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::templates::{ErrorTemplate, ResultTemplate, UploadTemplate};
use super::AppState;
use crate::checklist::{
    build_message, build_message_for_current_year, ClientProfile, DEFAULT_CLIENT_NAME,
};
use crate::pipeline::{BatchReport, ClientId, Document, IntakeContext, IntakeError};

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Upload form.
pub async fn upload_form(State(state): State<AppState>) -> impl IntoResponse {
    let template = UploadTemplate {
        title: "Envio de documentos",
        categories: state
            .dictionary
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect(),
        fallback: state.dictionary.fallback.clone(),
        max_upload_mb: state.body_limit_bytes / (1024 * 1024),
    };

    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Why a multipart request could not be turned into a batch.
#[derive(Debug)]
enum FormError {
    Multipart(String),
    InvalidClient(IntakeError),
    NoDocuments,
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::Multipart(msg) => write!(f, "Invalid upload: {}", msg),
            FormError::InvalidClient(e) => write!(f, "{}", e),
            FormError::NoDocuments => f.write_str("No documents in the upload"),
        }
    }
}

/// Read the client field and every file part.
///
/// Empty file parts (a form submitted without choosing a file) are skipped.
async fn read_intake_form(mut multipart: Multipart) -> Result<(ClientId, Vec<Document>), FormError> {
    let mut client: Option<String> = None;
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "client" || name == "client_id" {
            let value = field
                .text()
                .await
                .map_err(|e| FormError::Multipart(e.to_string()))?;
            client = Some(value);
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let declared = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?;

        if filename.is_empty() && data.is_empty() {
            continue;
        }
        documents.push(Document::new(filename, data.to_vec(), declared));
    }

    let client_id =
        ClientId::new(client.as_deref().unwrap_or_default()).map_err(FormError::InvalidClient)?;
    if documents.is_empty() {
        return Err(FormError::NoDocuments);
    }

    Ok((client_id, documents))
}

async fn run_batch(state: &AppState, client_id: ClientId, documents: Vec<Document>) -> BatchReport {
    let ctx = IntakeContext::new(client_id);
    state.pipeline.process_batch(&ctx, &documents, None).await
}

/// Form upload; answers with an HTML results page.
pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (client_id, documents) = match read_intake_form(multipart).await {
        Ok(parsed) => parsed,
        Err(e) => {
            let template = ErrorTemplate {
                title: "Erro no envio",
                message: e.to_string(),
            };
            let body = template.render().unwrap_or_else(|_| e.to_string());
            return (StatusCode::BAD_REQUEST, Html(body)).into_response();
        }
    };

    let report = run_batch(&state, client_id, documents).await;
    let template = ResultTemplate::from_report(&report);

    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
    .into_response()
}

/// API upload; answers with the JSON batch report.
pub async fn api_intake(State(state): State<AppState>, multipart: Multipart) -> Response {
    match read_intake_form(multipart).await {
        Ok((client_id, documents)) => {
            let report = run_batch(&state, client_id, documents).await;
            Json(report).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Keyword dictionary in priority order.
pub async fn api_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dictionary.as_ref().clone())
}

/// Checklist query parameters; every flag defaults to off except `salary`.
#[derive(Debug, Deserialize)]
pub struct ChecklistParams {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub salary: Option<bool>,
    pub dependents: Option<bool>,
    pub rent: Option<bool>,
    pub health: Option<bool>,
    pub education: Option<bool>,
    pub investments: Option<bool>,
}

impl ChecklistParams {
    fn profile(&self) -> ClientProfile {
        let defaults = ClientProfile::default();
        ClientProfile {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
            salary: self.salary.unwrap_or(defaults.salary),
            dependents: self.dependents.unwrap_or(defaults.dependents),
            rent: self.rent.unwrap_or(defaults.rent),
            health: self.health.unwrap_or(defaults.health),
            education: self.education.unwrap_or(defaults.education),
            investments: self.investments.unwrap_or(defaults.investments),
        }
    }
}

/// Document request message for a client profile.
pub async fn api_checklist(Query(params): Query<ChecklistParams>) -> impl IntoResponse {
    let profile = params.profile();
    let message = match params.year {
        Some(year) => build_message(&profile, year),
        None => build_message_for_current_year(&profile),
    };
    Json(serde_json::json!({ "message": message }))
}
