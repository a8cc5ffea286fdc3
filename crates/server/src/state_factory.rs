use std::sync::Arc;
#[cfg(feature = "redis")]
use std::time::Duration;

use dropshare_core::Clock;
use dropshare_state::SessionStore;
use dropshare_state_memory::MemorySessionStore;
#[cfg(feature = "redis")]
use dropshare_state_redis::{RedisConfig, RedisSessionStore};

use crate::config::StateConfig;
use crate::error::ServerError;

/// Construct a [`SessionStore`] from configuration.
///
/// Every backend reads time from `clock`, the same clock the share service
/// uses.
pub fn create_store(
    config: &StateConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemorySessionStore::with_clock(clock))),
        #[cfg(feature = "redis")]
        "redis" => create_redis(config, clock),
        other => Err(ServerError::Config(format!(
            "unsupported state backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "redis")]
fn create_redis(
    config: &StateConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionStore>, ServerError> {
    let defaults = RedisConfig::default();
    let redis_config = RedisConfig {
        url: config.url.clone().unwrap_or(defaults.url),
        prefix: config.prefix.clone().unwrap_or(defaults.prefix),
        expiry_grace: config
            .expiry_grace_seconds
            .map_or(defaults.expiry_grace, Duration::from_secs),
        ..defaults
    };
    let store = RedisSessionStore::with_clock(&redis_config, clock)
        .map_err(|e| ServerError::Config(format!("redis store: {e}")))?;
    Ok(Arc::new(store))
}
