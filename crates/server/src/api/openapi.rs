#![allow(clippy::needless_for_each)]

use axum::Json;

use super::schemas::{
    ErrorResponse, FileUploadForm, HealthResponse, LinkResponse, MetricsResponse,
    ShareCodeResponse, ShareLinkRequest, ShareTextRequest, TextResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "DropShare API",
        version = "0.1.0",
        description = "Share a text, link or file under a short code. Each code can be redeemed once before it expires.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service liveness and metrics"),
        (name = "Shares", description = "Create and redeem one-time shares")
    ),
    paths(
        super::health::root,
        super::health::health,
        super::text::share_text,
        super::text::retrieve_text,
        super::link::share_link,
        super::link::retrieve_link,
        super::file::share_file,
        super::file::retrieve_file,
    ),
    components(schemas(
        ErrorResponse,
        FileUploadForm,
        HealthResponse,
        LinkResponse,
        MetricsResponse,
        ShareCodeResponse,
        ShareLinkRequest,
        ShareTextRequest,
        TextResponse,
    ))
)]
pub struct ApiDoc;

/// `GET /api-doc/openapi.json` -- the OpenAPI document for this server.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(<ApiDoc as utoipa::OpenApi>::openapi())
}
