use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use dropshare_blob::{BlobError, BlobReader, BlobStore};

use crate::error::ShareError;

/// An uploaded file handed to [`ShareService::share_file`](crate::ShareService::share_file).
pub struct FileUpload {
    pub reader: BlobReader,
    /// Name as sent by the client. Only the final path segment is kept.
    pub original_name: String,
    /// Client-declared content type, if any.
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(reader: BlobReader, original_name: impl Into<String>) -> Self {
        Self {
            reader,
            original_name: original_name.into(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("original_name", &self.original_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Deletes a redeemed blob exactly once.
///
/// The deletion runs when [`finish`](Self::finish) is awaited, or, if the
/// guard is dropped first, as a task on the service's cleanup tracker.
pub(crate) struct BlobCleanup {
    blobs: Arc<dyn BlobStore>,
    storage_path: String,
    tracker: TaskTracker,
    done: bool,
}

impl BlobCleanup {
    pub(crate) fn new(blobs: Arc<dyn BlobStore>, storage_path: String, tracker: TaskTracker) -> Self {
        Self {
            blobs,
            storage_path,
            tracker,
            done: false,
        }
    }

    /// Delete the blob now.
    pub(crate) async fn finish(mut self) {
        self.done = true;
        delete_blob(self.blobs.as_ref(), &self.storage_path).await;
    }
}

impl Drop for BlobCleanup {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        let blobs = Arc::clone(&self.blobs);
        let storage_path = std::mem::take(&mut self.storage_path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.tracker.spawn_on(
                    async move { delete_blob(blobs.as_ref(), &storage_path).await },
                    &handle,
                );
            }
            Err(_) => {
                warn!(
                    storage_path = %storage_path,
                    "no runtime to delete redeemed blob, leaving it to the reaper"
                );
            }
        }
    }
}

pub(crate) async fn delete_blob(blobs: &dyn BlobStore, storage_path: &str) {
    match blobs.delete(storage_path).await {
        Ok(true) => debug!(storage_path, "blob deleted"),
        Ok(false) => debug!(storage_path, "blob already absent"),
        Err(e) => warn!(storage_path, error = %e, "failed to delete blob"),
    }
}

/// A redeemed file, ready to be read once.
///
/// The session is already gone when a `FileDownload` exists. The blob is
/// deleted after the bytes are consumed, or when the download is dropped
/// unfinished.
pub struct FileDownload {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    reader: BlobReader,
    cleanup: BlobCleanup,
}

impl FileDownload {
    pub(crate) fn new(
        original_name: String,
        mime_type: String,
        size_bytes: u64,
        reader: BlobReader,
        cleanup: BlobCleanup,
    ) -> Self {
        Self {
            original_name,
            mime_type,
            size_bytes,
            reader,
            cleanup,
        }
    }

    /// Read the whole file into memory, then delete the blob.
    pub async fn read_to_end(self) -> Result<Vec<u8>, ShareError> {
        let Self {
            mut reader,
            cleanup,
            size_bytes,
            ..
        } = self;

        let mut buf = Vec::with_capacity(usize::try_from(size_bytes).unwrap_or(0));
        let read = reader.read_to_end(&mut buf).await;
        cleanup.finish().await;
        read.map_err(BlobError::from)?;
        Ok(buf)
    }

    /// Turn the download into a byte stream for an HTTP body.
    ///
    /// The blob is deleted once the stream ends, fails, or is dropped.
    pub fn into_stream(self) -> DownloadStream {
        DownloadStream {
            inner: ReaderStream::new(self.reader),
            cleanup: Some(self.cleanup),
        }
    }
}

impl fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDownload")
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Byte stream over a redeemed blob. See [`FileDownload::into_stream`].
pub struct DownloadStream {
    inner: ReaderStream<BlobReader>,
    cleanup: Option<BlobCleanup>,
}

impl Stream for DownloadStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_next(cx);
        if matches!(poll, Poll::Ready(None | Some(Err(_)))) {
            // Hands the deletion to the cleanup tracker.
            drop(this.cleanup.take());
        }
        poll
    }
}

impl fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadStream")
            .field("finished", &self.cleanup.is_none())
            .finish_non_exhaustive()
    }
}
