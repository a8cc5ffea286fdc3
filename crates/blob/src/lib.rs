pub mod error;
pub mod local;
pub mod store;
pub mod types;

pub use error::BlobError;
pub use local::{DEFAULT_MAX_BLOB_BYTES, LocalBlobStore};
pub use store::BlobStore;
pub use types::{BlobReader, StoredBlob, resolve_mime_type};
