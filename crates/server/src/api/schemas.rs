use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use dropshare_core::ShareCode;
use dropshare_share::MetricsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Unexpired, unredeemed shares currently held.
    #[schema(example = 3)]
    pub live_sessions: usize,
    /// Share metrics counters.
    pub metrics: MetricsResponse,
}

/// Share metrics counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    #[schema(example = 12)]
    pub texts_shared: u64,
    pub links_shared: u64,
    pub files_shared: u64,
    pub texts_retrieved: u64,
    pub links_retrieved: u64,
    pub files_retrieved: u64,
    /// Retrievals that found nothing.
    pub not_found: u64,
    /// Codes redrawn because they were already taken.
    pub code_collisions: u64,
    /// Expired shares removed by the sweeper.
    pub sessions_purged: u64,
    /// Redeemed files whose blob had already disappeared.
    pub stale_blobs: u64,
    /// Orphaned upload files deleted by age.
    pub blobs_reaped: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            texts_shared: snap.texts_shared,
            links_shared: snap.links_shared,
            files_shared: snap.files_shared,
            texts_retrieved: snap.texts_retrieved,
            links_retrieved: snap.links_retrieved,
            files_retrieved: snap.files_retrieved,
            not_found: snap.not_found,
            code_collisions: snap.code_collisions,
            sessions_purged: snap.sessions_purged,
            stale_blobs: snap.stale_blobs,
            blobs_reaped: snap.blobs_reaped,
        }
    }
}

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "Invalid or expired")]
    pub error: String,
}

/// Returned by every share endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareCodeResponse {
    /// Code the recipient redeems.
    #[schema(value_type = String, example = "k3x9qa")]
    pub code: ShareCode,
}

/// Body of `POST /api/text`.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ShareTextRequest {
    #[schema(example = "hello")]
    pub text: Option<String>,
}

/// Body of `GET /api/text/{code}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextResponse {
    pub text: String,
}

/// Body of `POST /api/link`.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ShareLinkRequest {
    #[schema(example = "https://example.com")]
    pub url: Option<String>,
}

/// Body of `GET /api/link/{code}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkResponse {
    pub url: String,
}

/// Multipart form accepted by `POST /api/file`.
#[derive(ToSchema)]
pub struct FileUploadForm {
    /// The file to share.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
