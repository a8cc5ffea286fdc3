use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use dropshare_core::ShareKind;

/// Atomic counters tracking share activity.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct ShareMetrics {
    /// Text shares created.
    pub texts_shared: AtomicU64,
    /// Link shares created.
    pub links_shared: AtomicU64,
    /// File shares created.
    pub files_shared: AtomicU64,
    /// Text shares redeemed.
    pub texts_retrieved: AtomicU64,
    /// Link shares redeemed.
    pub links_retrieved: AtomicU64,
    /// File shares redeemed.
    pub files_retrieved: AtomicU64,
    /// Lookups that resolved to nothing.
    pub not_found: AtomicU64,
    /// Generated codes that were already live and had to be redrawn.
    pub code_collisions: AtomicU64,
    /// Expired sessions physically removed.
    pub sessions_purged: AtomicU64,
    /// File sessions whose blob had gone missing.
    pub stale_blobs: AtomicU64,
    /// Orphaned blobs removed by the age-based reaper.
    pub blobs_reaped: AtomicU64,
}

impl ShareMetrics {
    /// Count a share created for `kind`.
    pub fn increment_shared(&self, kind: ShareKind) {
        let counter = match kind {
            ShareKind::Text => &self.texts_shared,
            ShareKind::Link => &self.links_shared,
            ShareKind::File => &self.files_shared,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a share of `kind` redeemed.
    pub fn increment_retrieved(&self, kind: ShareKind) {
        let counter = match kind {
            ShareKind::Text => &self.texts_retrieved,
            ShareKind::Link => &self.links_retrieved,
            ShareKind::File => &self.files_retrieved,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_code_collisions(&self) {
        self.code_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_sessions_purged(&self, count: u64) {
        self.sessions_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_stale_blobs(&self) {
        self.stale_blobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_blobs_reaped(&self, count: u64) {
        self.blobs_reaped.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            texts_shared: self.texts_shared.load(Ordering::Relaxed),
            links_shared: self.links_shared.load(Ordering::Relaxed),
            files_shared: self.files_shared.load(Ordering::Relaxed),
            texts_retrieved: self.texts_retrieved.load(Ordering::Relaxed),
            links_retrieved: self.links_retrieved.load(Ordering::Relaxed),
            files_retrieved: self.files_retrieved.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            code_collisions: self.code_collisions.load(Ordering::Relaxed),
            sessions_purged: self.sessions_purged.load(Ordering::Relaxed),
            stale_blobs: self.stale_blobs.load(Ordering::Relaxed),
            blobs_reaped: self.blobs_reaped.load(Ordering::Relaxed),
        }
    }
}

/// A plain-data snapshot of [`ShareMetrics`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub texts_shared: u64,
    pub links_shared: u64,
    pub files_shared: u64,
    pub texts_retrieved: u64,
    pub links_retrieved: u64,
    pub files_retrieved: u64,
    pub not_found: u64,
    pub code_collisions: u64,
    pub sessions_purged: u64,
    pub stale_blobs: u64,
    pub blobs_reaped: u64,
}
