pub mod file;
pub mod health;
pub mod link;
pub mod openapi;
pub mod schemas;
pub mod text;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dropshare_share::ShareService;

/// Room left in a file upload request for multipart boundaries and headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The share service instance.
    pub service: Arc<ShareService>,
    /// Largest accepted request body for `POST /api/file`.
    pub max_upload_body: usize,
}

impl AppState {
    /// State whose upload body limit is `max_file_bytes` plus multipart overhead.
    pub fn new(service: Arc<ShareService>, max_file_bytes: u64) -> Self {
        let max_upload_body = usize::try_from(max_file_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX);
        Self {
            service,
            max_upload_body,
        }
    }
}

/// Build the axum router with all API routes.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_body);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi::openapi_json))
        .route("/api/text", post(text::share_text))
        .route("/api/text/{code}", get(text::retrieve_text))
        .route("/api/link", post(link::share_link))
        .route("/api/link/{code}", get(link::retrieve_link))
        .route("/api/file", post(file::share_file).layer(upload_limit))
        .route("/api/file/{code}", get(file::retrieve_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
