use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob exceeds the maximum allowed size.
    #[error("blob too large: exceeds limit of {limit} bytes")]
    TooLarge {
        /// Maximum allowed size.
        limit: u64,
    },

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
