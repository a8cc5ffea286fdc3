use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;

use dropshare_blob::BlobStore;
use dropshare_core::{Clock, CodeGenerator, RandomCodeGenerator, SystemClock};
use dropshare_state::SessionStore;

use crate::error::ShareError;
use crate::metrics::ShareMetrics;
use crate::service::ShareService;

/// Default session lifetime: five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default number of codes drawn before giving up on a share.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 8;

/// Default extra age past the TTL before an orphaned blob is reaped.
pub const DEFAULT_BLOB_GRACE: Duration = Duration::from_secs(60);

/// Fluent builder for constructing a [`ShareService`].
///
/// A [`SessionStore`] and a [`BlobStore`] must be supplied. Everything else
/// has a default.
pub struct ShareServiceBuilder {
    store: Option<Arc<dyn SessionStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
    codes: Option<Arc<dyn CodeGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<Arc<ShareMetrics>>,
    ttl: Duration,
    max_code_attempts: u32,
    blob_grace: Duration,
}

impl ShareServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            blobs: None,
            codes: None,
            clock: None,
            metrics: None,
            ttl: DEFAULT_TTL,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            blob_grace: DEFAULT_BLOB_GRACE,
        }
    }

    /// Set the session store implementation.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the blob store implementation.
    #[must_use]
    pub fn blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Set the share code generator.
    #[must_use]
    pub fn code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = Some(codes);
        self
    }

    /// Set the time source used for expiry.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing metrics instance instead of creating one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<ShareMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set how long an unredeemed session lives.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set how many codes to draw before failing with
    /// [`ShareError::CodeSpaceExhausted`].
    #[must_use]
    pub fn max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }

    /// Set the extra age past the TTL before orphaned blobs are reaped.
    #[must_use]
    pub fn blob_grace(mut self, grace: Duration) -> Self {
        self.blob_grace = grace;
        self
    }

    /// Build the [`ShareService`].
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Configuration`] if a required component is
    /// missing or a limit is out of range.
    pub fn build(self) -> Result<ShareService, ShareError> {
        let store = self
            .store
            .ok_or_else(|| ShareError::Configuration("session store is required".into()))?;

        let blobs = self
            .blobs
            .ok_or_else(|| ShareError::Configuration("blob store is required".into()))?;

        if self.ttl.is_zero() {
            return Err(ShareError::Configuration("ttl must be positive".into()));
        }
        let session_ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| ShareError::Configuration(format!("ttl out of range: {e}")))?;

        if self.max_code_attempts == 0 {
            return Err(ShareError::Configuration(
                "max_code_attempts must be at least 1".into(),
            ));
        }

        Ok(ShareService {
            store,
            blobs,
            codes: self
                .codes
                .unwrap_or_else(|| Arc::new(RandomCodeGenerator::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            metrics: self.metrics.unwrap_or_default(),
            ttl: self.ttl,
            session_ttl,
            max_code_attempts: self.max_code_attempts,
            blob_grace: self.blob_grace,
            cleanup_tracker: TaskTracker::new(),
        })
    }
}

impl Default for ShareServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
