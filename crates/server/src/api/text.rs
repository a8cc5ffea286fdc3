use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, ShareCodeResponse, ShareTextRequest, TextResponse};

/// `POST /api/text` -- store a text snippet and return its code.
///
/// A body that is not a JSON object with a string `text` is treated as a
/// missing text.
#[utoipa::path(
    post,
    path = "/api/text",
    tag = "Shares",
    summary = "Share text",
    request_body(content = ShareTextRequest, description = "Text to share"),
    responses(
        (status = 200, description = "Text stored", body = ShareCodeResponse),
        (status = 400, description = "Text missing", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn share_text(
    State(state): State<AppState>,
    body: Result<Json<ShareTextRequest>, JsonRejection>,
) -> Result<Json<ShareCodeResponse>, ServerError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let code = state.service.share_text(req.text.as_deref()).await?;
    Ok(Json(ShareCodeResponse { code }))
}

/// `GET /api/text/{code}` -- redeem a text share.
#[utoipa::path(
    get,
    path = "/api/text/{code}",
    tag = "Shares",
    summary = "Retrieve text",
    description = "Returns the shared text and invalidates the code.",
    params(("code" = String, Path, description = "Share code")),
    responses(
        (status = 200, description = "Text redeemed", body = TextResponse),
        (status = 404, description = "Invalid or expired code", body = ErrorResponse)
    )
)]
pub async fn retrieve_text(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TextResponse>, ServerError> {
    let text = state.service.retrieve_text(&code).await?;
    Ok(Json(TextResponse { text }))
}
