use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, LinkResponse, ShareCodeResponse, ShareLinkRequest};

/// `POST /api/link` -- store a URL and return its code.
///
/// The URL is kept verbatim; it is not parsed or normalized.
#[utoipa::path(
    post,
    path = "/api/link",
    tag = "Shares",
    summary = "Share link",
    request_body(content = ShareLinkRequest, description = "URL to share"),
    responses(
        (status = 200, description = "Link stored", body = ShareCodeResponse),
        (status = 400, description = "URL missing", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn share_link(
    State(state): State<AppState>,
    body: Result<Json<ShareLinkRequest>, JsonRejection>,
) -> Result<Json<ShareCodeResponse>, ServerError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let code = state.service.share_link(req.url.as_deref()).await?;
    Ok(Json(ShareCodeResponse { code }))
}

/// `GET /api/link/{code}` -- redeem a link share.
#[utoipa::path(
    get,
    path = "/api/link/{code}",
    tag = "Shares",
    summary = "Retrieve link",
    params(("code" = String, Path, description = "Share code")),
    responses(
        (status = 200, description = "Link redeemed", body = LinkResponse),
        (status = 404, description = "Invalid or expired code", body = ErrorResponse)
    )
)]
pub async fn retrieve_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LinkResponse>, ServerError> {
    let url = state.service.retrieve_link(&code).await?;
    Ok(Json(LinkResponse { url }))
}
