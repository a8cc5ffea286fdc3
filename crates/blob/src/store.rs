use std::time::Duration;

use async_trait::async_trait;

use crate::error::BlobError;
use crate::types::{BlobReader, StoredBlob};

/// Pluggable storage for file payloads.
///
/// Blobs are addressed by the `storage_path` returned from [`BlobStore::put`].
/// Deleting an absent blob is not an error, so duplicate clean-ups are safe.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `reader` to a fresh location and return its metadata.
    ///
    /// The store never overwrites an existing blob. If the payload exceeds the
    /// store's size cap the partial write is removed and
    /// [`BlobError::TooLarge`] is returned.
    async fn put(
        &self,
        reader: BlobReader,
        original_name: &str,
        content_type: Option<&str>,
    ) -> Result<StoredBlob, BlobError>;

    /// Open a blob for reading. Fails with [`BlobError::NotFound`] if absent.
    async fn open(&self, storage_path: &str) -> Result<BlobReader, BlobError>;

    /// Check whether a blob exists.
    async fn exists(&self, storage_path: &str) -> Result<bool, BlobError>;

    /// Delete a blob. Returns `true` if the blob existed.
    async fn delete(&self, storage_path: &str) -> Result<bool, BlobError>;

    /// Remove every blob written more than `max_age` ago. Returns the number
    /// of blobs removed.
    async fn reap_older_than(&self, max_age: Duration) -> Result<u64, BlobError>;
}
