//! Askama template structs for the intake pages.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.

use askama::Template;

use crate::pipeline::{BatchReport, ItemOutcome};

/// Upload form.
#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate<'a> {
    pub title: &'a str,
    pub categories: Vec<String>,
    pub fallback: String,
    pub max_upload_mb: usize,
}

/// One row of the results table.
pub struct ResultRow {
    pub filename: String,
    pub stage: String,
    pub category: String,
    pub keyword: String,
    pub location: String,
    pub error: String,
    pub stored: bool,
}

impl ResultRow {
    pub fn from_outcome(client: &str, outcome: &ItemOutcome) -> Self {
        let location = match (&outcome.category, &outcome.stored_name) {
            (Some(category), Some(name)) if outcome.is_stored() => {
                format!("{}/{}/{}", client, category, name)
            }
            _ => String::new(),
        };

        Self {
            filename: outcome.filename.clone(),
            stage: outcome.stage.to_string(),
            category: outcome.category.clone().unwrap_or_default(),
            keyword: outcome.matched_keyword.clone().unwrap_or_default(),
            location,
            error: outcome.error.clone().unwrap_or_default(),
            stored: outcome.is_stored(),
        }
    }
}

/// Results of one upload.
#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate<'a> {
    pub title: &'a str,
    pub client: String,
    pub request_id: String,
    pub stored: usize,
    pub failed: usize,
    pub rows: Vec<ResultRow>,
}

impl<'a> ResultTemplate<'a> {
    pub fn from_report(report: &BatchReport) -> Self {
        let client = report.client_id.to_string();
        Self {
            title: "Resultado do envio",
            rows: report
                .items
                .iter()
                .map(|item| ResultRow::from_outcome(&client, item))
                .collect(),
            client,
            request_id: report.request_id.clone(),
            stored: report.stored(),
            failed: report.failed(),
        }
    }
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'a str,
    pub message: String,
}
