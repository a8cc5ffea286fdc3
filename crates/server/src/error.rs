use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use dropshare_blob::BlobError;
use dropshare_share::ShareError;

/// Errors that can occur when running the DropShare server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A share-level error surfaced through the API.
    #[error(transparent)]
    Share(#[from] ShareError),

    /// The multipart upload body could not be read.
    #[error("upload error: {0}")]
    Upload(#[from] MultipartError),
}

impl ServerError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Share(ShareError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Upload(e) => (e.status(), e.body_text()),
            Self::Share(ShareError::NotFound) => {
                (StatusCode::NOT_FOUND, "Invalid or expired".to_owned())
            }
            Self::Share(ShareError::Blob(BlobError::TooLarge { limit })) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("file exceeds the {limit} byte limit"),
            ),
            Self::Share(ShareError::StorageUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "storage unavailable".to_owned(),
            ),
            Self::Share(ShareError::CodeSpaceExhausted { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "could not allocate a share code".to_owned(),
            ),
            Self::Share(_) | Self::Config(_) | Self::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use dropshare_state::StateError;

    use super::*;

    fn status_of(err: ServerError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn maps_share_errors_to_status_codes() {
        assert_eq!(
            status_of(ShareError::Validation("Text required".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ShareError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ShareError::Blob(BlobError::TooLarge { limit: 10 }).into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(ShareError::from(StateError::Connection("down".into())).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ShareError::Blob(BlobError::Storage("disk".into())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn hides_internal_details() {
        let (_, message) =
            ServerError::Share(ShareError::Blob(BlobError::Storage("/var/secret".into())))
                .status_and_message();
        assert!(!message.contains("/var/secret"));
    }
}
