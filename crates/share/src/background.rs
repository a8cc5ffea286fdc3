//! Periodic expiry sweep.
//!
//! The sweeper handles:
//! - Physically removing expired sessions and deleting their blobs
//! - Reaping orphaned blobs older than the TTL plus a grace period

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::service::ShareService;

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep (default: 30 seconds).
    pub interval: Duration,
    /// Whether orphaned blobs are reaped on each sweep (default: true).
    pub reap_blobs: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            reap_blobs: true,
        }
    }
}

/// Background task that purges expired shares on an interval.
pub struct ExpirySweeper {
    service: Arc<ShareService>,
    config: SweeperConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ExpirySweeper {
    /// Create a sweeper for `service`.
    ///
    /// Returns the sweeper and a shutdown sender. Sending on (or dropping)
    /// the sender stops [`run`](Self::run).
    pub fn new(service: Arc<ShareService>, config: SweeperConfig) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                service,
                config,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run the sweep loop until shutdown is signalled.
    pub async fn run(mut self) {
        info!(interval = ?self.config.interval, "expiry sweeper starting");
        let mut ticker = interval(self.config.interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("expiry sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!("expiry sweeper stopped");
    }

    /// Run a single sweep. Errors are logged and never stop the loop.
    pub async fn sweep_once(&self) {
        match self.service.purge_expired().await {
            Ok(count) => debug!(count, "expiry sweep completed"),
            Err(e) => error!(error = %e, "error purging expired sessions"),
        }

        if self.config.reap_blobs
            && let Err(e) = self.service.reap_stale_blobs().await
        {
            error!(error = %e, "error reaping orphaned blobs");
        }
    }
}
