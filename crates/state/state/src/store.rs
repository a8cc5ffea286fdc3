use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dropshare_core::{Session, SessionId, SessionKey};

use crate::error::StateError;

/// Trait for persisting share sessions.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// A session whose `expires_at` has passed is never returned by any lookup,
/// even if it has not been physically removed yet.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session unless a live one already holds the same key.
    ///
    /// Returns `true` if the session was stored, `false` if the `(kind, code)`
    /// pair is taken by a live session. An expired text or link record at
    /// the key is replaced. An expired file record also counts as taken until
    /// `purge_expired` hands it back, so its blob is never orphaned.
    async fn create(&self, session: &Session) -> Result<bool, StateError>;

    /// Look up a live session without consuming it.
    async fn find(&self, key: &SessionKey) -> Result<Option<Session>, StateError>;

    /// Atomically look up and delete a live session.
    ///
    /// When several callers race on the same key, at most one receives
    /// `Some`.
    async fn take(&self, key: &SessionKey) -> Result<Option<Session>, StateError>;

    /// Delete the record at `key` only if it is still the session `id`.
    ///
    /// Returns `true` if a record was removed. A missing record is not an
    /// error.
    async fn delete(&self, key: &SessionKey, id: &SessionId) -> Result<bool, StateError>;

    /// Physically remove every session with `expires_at <= now` and return
    /// the removed records.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StateError>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize, StateError>;

    /// Whether no live sessions are stored.
    async fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.len().await? == 0)
    }
}
