//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        // Browser upload flow
        .route("/", get(handlers::upload_form))
        .route("/upload", post(handlers::upload))
        // JSON API
        .route("/api/intake", post(handlers::api_intake))
        .route("/api/categories", get(handlers::api_categories))
        .route("/api/checklist", get(handlers::api_checklist))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
