use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use dropshare_core::{Clock, SystemClock};

use crate::error::BlobError;
use crate::store::BlobStore;
use crate::types::{BlobReader, StoredBlob, resolve_mime_type};

/// Default per-blob size cap: 50 MiB.
pub const DEFAULT_MAX_BLOB_BYTES: u64 = 50 * 1024 * 1024;

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 10;
const MAX_EXTENSION_LEN: usize = 16;
const PUBLISH_ATTEMPTS: usize = 4;
const PARTIAL_PREFIX: &str = "partial.";

/// [`BlobStore`] writing one file per blob under a root directory.
///
/// File names are `<unix-millis>-<random base36>[.<ext>]`, with the extension
/// taken from the uploaded name. The timestamp is the moment the write
/// finished and lets [`BlobStore::reap_older_than`] age files without any
/// side index. Uploads in flight live under a `partial.` name until then.
pub struct LocalBlobStore {
    root: PathBuf,
    max_bytes: u64,
    clock: Arc<dyn Clock>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: DEFAULT_MAX_BLOB_BYTES,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the per-blob size cap.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Read time from `clock` when naming and aging blobs.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), BlobError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Map a storage path to a file under the root, refusing anything that
    /// could escape it.
    fn resolve(&self, storage_path: &str) -> Option<PathBuf> {
        let acceptable = !storage_path.is_empty()
            && !storage_path.contains(['/', '\\'])
            && !storage_path.contains("..");
        acceptable.then(|| self.root.join(storage_path))
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Link a finished partial file under its final name. An existing file
    /// is never replaced; a clash draws a new name.
    async fn publish(&self, partial_path: &Path, original_name: &str) -> Result<String, BlobError> {
        for _ in 0..PUBLISH_ATTEMPTS {
            let storage_path = blob_file_name(self.now_ms(), original_name);
            match fs::hard_link(partial_path, self.root.join(&storage_path)).await {
                Ok(()) => return Ok(storage_path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(BlobError::Storage("could not allocate a blob file name".into()))
    }
}

impl std::fmt::Debug for LocalBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBlobStore")
            .field("root", &self.root)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}

/// Build a fresh blob file name for an upload called `original_name`.
fn blob_file_name(now_ms: i64, original_name: &str) -> String {
    let suffix = random_suffix();
    match sanitized_extension(original_name) {
        Some(ext) => format!("{now_ms}-{suffix}.{ext}"),
        None => format!("{now_ms}-{suffix}"),
    }
}

/// Name for an upload still being written. It has no timestamp prefix, so
/// the reaper never touches it.
fn partial_file_name() -> String {
    format!("{PARTIAL_PREFIX}{}", random_suffix())
}

fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    let clean: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect();
    (!clean.is_empty()).then_some(clean)
}

/// Creation time encoded in a blob file name, in Unix milliseconds.
fn written_at_ms(file_name: &str) -> Option<i64> {
    file_name.split_once('-')?.0.parse().ok()
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        reader: BlobReader,
        original_name: &str,
        content_type: Option<&str>,
    ) -> Result<StoredBlob, BlobError> {
        self.ensure_root().await?;

        let partial_path = self.root.join(partial_file_name());
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial_path)
            .await?;

        // One byte past the cap is enough to tell an oversized payload apart.
        let mut limited = reader.take(self.max_bytes.saturating_add(1));
        let written = async {
            let written = tokio::io::copy(&mut limited, &mut file).await?;
            if written > self.max_bytes {
                return Err(BlobError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(written)
        }
        .await;
        drop(file);

        // The published name carries the completion time, so a slow upload
        // is never older than the session that will reference it.
        let published = match written {
            Ok(size_bytes) => self
                .publish(&partial_path, original_name)
                .await
                .map(|storage_path| (storage_path, size_bytes)),
            Err(e) => Err(e),
        };

        if let Err(remove_err) = fs::remove_file(&partial_path).await
            && remove_err.kind() != ErrorKind::NotFound
        {
            warn!(
                path = %partial_path.display(),
                error = %remove_err,
                "failed to remove partial blob"
            );
        }

        let (storage_path, size_bytes) = published?;
        debug!(storage_path = %storage_path, size_bytes, "blob stored");
        Ok(StoredBlob {
            storage_path,
            size_bytes,
            mime_type: resolve_mime_type(content_type, original_name),
        })
    }

    async fn open(&self, storage_path: &str) -> Result<BlobReader, BlobError> {
        let path = self
            .resolve(storage_path)
            .ok_or_else(|| BlobError::NotFound(storage_path.to_owned()))?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound(storage_path.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, storage_path: &str) -> Result<bool, BlobError> {
        match self.resolve(storage_path) {
            Some(path) => Ok(fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }

    async fn delete(&self, storage_path: &str) -> Result<bool, BlobError> {
        let Some(path) = self.resolve(storage_path) else {
            return Ok(false);
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn reap_older_than(&self, max_age: Duration) -> Result<u64, BlobError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = self.now_ms().saturating_sub(max_age_ms);
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(written_at) = name.to_str().and_then(written_at_ms) else {
                continue;
            };
            if written_at >= cutoff {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(file = ?name, error = %e, "failed to reap stale blob"),
            }
        }

        Ok(removed)
    }
}
