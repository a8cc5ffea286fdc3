use thiserror::Error;

use dropshare_blob::BlobError;
use dropshare_state::StateError;

/// Errors returned by share operations.
///
/// [`ShareError::NotFound`] deliberately covers every way a code can fail to
/// resolve: never issued, wrong kind, already redeemed, expired, or a file
/// whose blob has vanished.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Required input was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// The code does not resolve to a live session of the requested kind.
    #[error("invalid or expired")]
    NotFound,

    /// The session store could not be reached or failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A blob store operation failed.
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    /// Every generated code collided with a live session.
    #[error("no free share code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    /// The service was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<StateError> for ShareError {
    fn from(e: StateError) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}
