use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Byte source handed to and returned from a blob store.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Where and what a stored blob is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    /// Store-relative location, used for every later operation on the blob.
    pub storage_path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME content type (e.g. `"application/pdf"`).
    pub mime_type: String,
}

/// Pick the MIME type for an upload.
///
/// A non-empty client-supplied type wins; otherwise the type is guessed from
/// the file name's extension, falling back to `application/octet-stream`.
pub fn resolve_mime_type(content_type: Option<&str>, original_name: &str) -> String {
    match content_type.map(str::trim) {
        Some(ct) if !ct.is_empty() => ct.to_owned(),
        _ => mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .essence_str()
            .to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_type_wins() {
        assert_eq!(resolve_mime_type(Some("image/png"), "a.txt"), "image/png");
    }

    #[test]
    fn guesses_from_extension() {
        assert_eq!(resolve_mime_type(None, "notes.txt"), "text/plain");
        assert_eq!(resolve_mime_type(Some("  "), "report.pdf"), "application/pdf");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(resolve_mime_type(None, "blob"), "application/octet-stream");
        assert_eq!(
            resolve_mime_type(None, "data.zzzunknown"),
            "application/octet-stream"
        );
    }
}
