use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use dropshare_core::{Clock, Session, SessionId, SessionKey, SystemClock};
use dropshare_state::error::StateError;
use dropshare_state::store::SessionStore;

/// In-memory [`SessionStore`] backed by a [`DashMap`].
///
/// Expired sessions are hidden from lookups as soon as their deadline
/// passes, but stay in the map until [`SessionStore::purge_expired`] removes
/// them. This keeps file sessions visible to the purge so their blobs can be
/// reclaimed. All operations are synchronous internally; the async trait
/// methods return immediately.
pub struct MemorySessionStore {
    data: DashMap<String, Session>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    /// Create a new, empty store reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new, empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            clock,
        }
    }

    /// Total records held, including expired ones awaiting purge.
    pub fn raw_len(&self) -> usize {
        self.data.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("records", &self.data.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<bool, StateError> {
        let now = self.clock.now();

        // The entry guard holds the shard lock, so the check and the insert
        // cannot interleave with another writer.
        let inserted = match self.data.entry(session.key().canonical()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.is_expired_at(now) && current.payload.file().is_none() {
                    occupied.insert(session.clone());
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(session.clone());
                true
            }
        };

        Ok(inserted)
    }

    async fn find(&self, key: &SessionKey) -> Result<Option<Session>, StateError> {
        let now = self.clock.now();
        Ok(self
            .data
            .get(&key.canonical())
            .filter(|session| !session.is_expired_at(now))
            .map(|session| session.value().clone()))
    }

    async fn take(&self, key: &SessionKey) -> Result<Option<Session>, StateError> {
        let now = self.clock.now();
        Ok(self
            .data
            .remove_if(&key.canonical(), |_, session| !session.is_expired_at(now))
            .map(|(_, session)| session))
    }

    async fn delete(&self, key: &SessionKey, id: &SessionId) -> Result<bool, StateError> {
        Ok(self
            .data
            .remove_if(&key.canonical(), |_, session| session.id == *id)
            .is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StateError> {
        let expired_keys: Vec<String> = self
            .data
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the shard lock: a key may have been replaced by a
        // live session since the scan.
        let purged = expired_keys
            .into_iter()
            .filter_map(|key| {
                self.data
                    .remove_if(&key, |_, session| session.is_expired_at(now))
                    .map(|(_, session)| session)
            })
            .collect();

        Ok(purged)
    }

    async fn len(&self) -> Result<usize, StateError> {
        let now = self.clock.now();
        Ok(self
            .data
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .count())
    }
}
