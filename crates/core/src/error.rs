use thiserror::Error;

/// Errors raised while constructing core DropShare values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("share code length {length} is below the minimum of {minimum}")]
    CodeTooShort { length: usize, minimum: usize },
}
