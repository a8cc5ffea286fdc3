use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Config, Pool, Runtime};
use redis::Script;
use tracing::debug;

use dropshare_core::{Clock, Session, SessionId, SessionKey, ShareKind, SystemClock};
use dropshare_state::error::StateError;
use dropshare_state::store::SessionStore;

use crate::config::RedisConfig;
use crate::key_render::{render_index_key, render_session_key, session_key_prefix};
use crate::scripts;

/// Index entries handled per `PURGE_EXPIRED` invocation.
const PURGE_BATCH: usize = 256;

/// Redis-backed implementation of [`SessionStore`].
///
/// Uses a `deadpool-redis` connection pool and Lua scripts for atomicity.
/// Expiry is judged against the injected [`Clock`] and passed to the scripts
/// as Unix milliseconds.
pub struct RedisSessionStore {
    pool: Pool,
    prefix: String,
    grace_ms: i64,
    clock: Arc<dyn Clock>,
}

impl RedisSessionStore {
    /// Create a new `RedisSessionStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`RedisSessionStore::new`], reading time from `clock`.
    pub fn with_clock(config: &RedisConfig, clock: Arc<dyn Clock>) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            grace_ms: i64::try_from(config.expiry_grace.as_millis()).unwrap_or(i64::MAX),
            clock,
        })
    }

    fn session_key(&self, key: &SessionKey) -> String {
        render_session_key(&self.prefix, key)
    }

    fn index_key(&self) -> String {
        render_index_key(&self.prefix)
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

fn decode(raw: &str) -> Result<Session, StateError> {
    Ok(serde_json::from_str(raw)?)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &Session) -> Result<bool, StateError> {
        let key = session.key();
        let value = serde_json::to_string(session)?;
        let now_ms = self.now_ms();
        let expires_ms = session.expires_at.timestamp_millis();
        let lifetime_ms = (expires_ms - now_ms).max(0).saturating_add(self.grace_ms).max(1);

        let mut conn = self.conn().await?;
        let result: i64 = Script::new(scripts::CREATE)
            .key(self.session_key(&key))
            .key(self.index_key())
            .arg(session.id.as_str())
            .arg(expires_ms)
            .arg(value)
            .arg(now_ms)
            .arg(lifetime_ms)
            .arg(key.canonical())
            .arg(if key.kind == ShareKind::File { "0" } else { "1" })
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(result == 1)
    }

    async fn find(&self, key: &SessionKey) -> Result<Option<Session>, StateError> {
        let mut conn = self.conn().await?;
        let (expires_ms, raw): (Option<i64>, Option<String>) = redis::cmd("HMGET")
            .arg(self.session_key(key))
            .arg("exp")
            .arg("v")
            .query_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        match (expires_ms, raw) {
            (Some(expires_ms), Some(raw)) if expires_ms > self.now_ms() => decode(&raw).map(Some),
            _ => Ok(None),
        }
    }

    async fn take(&self, key: &SessionKey) -> Result<Option<Session>, StateError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = Script::new(scripts::TAKE)
            .key(self.session_key(key))
            .key(self.index_key())
            .arg(self.now_ms())
            .arg(key.canonical())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        raw.as_deref().map(decode).transpose()
    }

    async fn delete(&self, key: &SessionKey, id: &SessionId) -> Result<bool, StateError> {
        let mut conn = self.conn().await?;
        let result: i64 = Script::new(scripts::DELETE)
            .key(self.session_key(key))
            .key(self.index_key())
            .arg(id.as_str())
            .arg(key.canonical())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(result == 1)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<Session>, StateError> {
        let now_ms = now.timestamp_millis();
        let index_key = self.index_key();
        let key_prefix = session_key_prefix(&self.prefix);
        let mut conn = self.conn().await?;
        let mut purged = Vec::new();

        loop {
            let (processed, removed): (usize, Vec<String>) = Script::new(scripts::PURGE_EXPIRED)
                .key(&index_key)
                .arg(now_ms)
                .arg(&key_prefix)
                .arg(PURGE_BATCH)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| StateError::Backend(e.to_string()))?;

            for raw in &removed {
                match decode(raw) {
                    Ok(session) => purged.push(session),
                    // The hash is already gone; nothing left to reclaim for it.
                    Err(e) => debug!(error = %e, "skipping undecodable purged session"),
                }
            }

            if processed < PURGE_BATCH {
                break;
            }
        }

        Ok(purged)
    }

    async fn len(&self) -> Result<usize, StateError> {
        let mut conn = self.conn().await?;
        let count: usize = redis::cmd("ZCOUNT")
            .arg(self.index_key())
            .arg(format!("({}", self.now_ms()))
            .arg("+inf")
            .query_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(count)
    }
}
