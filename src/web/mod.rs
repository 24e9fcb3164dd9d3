mod handlers;
mod store;

pub use store::SessionStore;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use flyercal::FlyerPipeline;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::{download_handler, health_handler, index_handler, upload_handler};

#[derive(Clone)]
pub struct AppState {
    /// Extractor and request builder shared by all sessions
    pub pipeline: FlyerPipeline,
    /// Per-user session state
    pub sessions: Arc<SessionStore>,
}

/// Build the router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/download", get(download_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
