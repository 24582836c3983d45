//! Web server for document intake.
//!
//! Serves an upload form for the office staff, a JSON intake endpoint for
//! integrations, and the checklist message generator.

mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::classifier::KeywordDictionary;
use crate::config::Settings;
use crate::pipeline::IntakePipeline;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
    /// Dictionary the classifier was built from, for display.
    pub dictionary: Arc<KeywordDictionary>,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(
        pipeline: IntakePipeline,
        dictionary: KeywordDictionary,
        body_limit_bytes: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            dictionary: Arc::new(dictionary),
            body_limit_bytes,
        }
    }

    pub fn from_settings(settings: &Settings, dry_run: bool) -> anyhow::Result<Self> {
        let (pipeline, memory) = settings.build_pipeline(dry_run)?;
        if memory.is_some() {
            tracing::warn!("Dry run: uploaded documents are kept in memory only");
        }
        Ok(Self::new(
            pipeline,
            settings.dictionary.clone(),
            settings.body_limit_bytes,
        ))
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16, dry_run: bool) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings, dry_run)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
