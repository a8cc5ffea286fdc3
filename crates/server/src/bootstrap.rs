use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use dropshare_blob::LocalBlobStore;
use dropshare_core::{Clock, RandomCodeGenerator, SystemClock};
use dropshare_share::{ShareService, ShareServiceBuilder, SweeperConfig};

use crate::config::DropshareConfig;
use crate::error::ServerError;
use crate::state_factory;

/// Construct the share service and its stores from configuration.
///
/// Creates the upload directory if it does not exist yet.
pub async fn build_service(config: &DropshareConfig) -> Result<ShareService, ServerError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = state_factory::create_store(&config.state, Arc::clone(&clock))?;

    let blobs = LocalBlobStore::new(&config.blob.upload_dir)
        .with_max_bytes(config.blob.max_bytes)
        .with_clock(Arc::clone(&clock));
    blobs.ensure_root().await.map_err(|e| {
        ServerError::Config(format!(
            "cannot create upload directory {}: {e}",
            config.blob.upload_dir
        ))
    })?;
    info!(path = %blobs.root().display(), max_bytes = blobs.max_bytes(), "upload directory ready");

    let codes = RandomCodeGenerator::new(config.share.code_length)
        .map_err(|e| ServerError::Config(e.to_string()))?;

    let service = ShareServiceBuilder::new()
        .store(store)
        .blobs(Arc::new(blobs))
        .code_generator(Arc::new(codes))
        .clock(clock)
        .ttl(Duration::from_secs(config.share.ttl_seconds))
        .max_code_attempts(config.share.max_code_attempts)
        .blob_grace(Duration::from_secs(config.share.blob_grace_seconds))
        .build()
        .map_err(|e| ServerError::Config(e.to_string()))?;

    info!(
        backend = %config.state.backend,
        ttl_secs = config.share.ttl_seconds,
        code_length = config.share.code_length,
        "share service ready"
    );
    Ok(service)
}

/// Expiry sweeper settings from configuration.
pub fn sweeper_config(config: &DropshareConfig) -> SweeperConfig {
    SweeperConfig {
        interval: Duration::from_secs(config.share.sweep_interval_seconds.max(1)),
        reap_blobs: config.share.reap_blobs,
    }
}
