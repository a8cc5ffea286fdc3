use axum::Json;
use axum::extract::State;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, HealthResponse};

/// `GET /` -- liveness string.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    summary = "Liveness",
    responses(
        (status = 200, description = "Server is running", body = String)
    )
)]
pub async fn root() -> &'static str {
    "DropShare backend running"
}

/// `GET /health` -- returns service status together with a metrics snapshot.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Returns service status, the number of live shares, and share metrics.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Session store unreachable", body = ErrorResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ServerError> {
    let live_sessions = state.service.live_sessions().await?;
    let snap = state.service.metrics().snapshot();

    Ok(Json(HealthResponse {
        status: "ok".to_owned(),
        live_sessions,
        metrics: snap.into(),
    }))
}
