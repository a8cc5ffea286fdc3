mod blob;
mod logging;
mod server;
mod share;
mod state;


pub use blob::*;
pub use logging::*;
pub use server::*;
pub use share::*;
pub use state::*;

use serde::Deserialize;

/// Top-level configuration for the DropShare server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct DropshareConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session store backend configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Share lifetime and sweeping configuration.
    #[serde(default)]
    pub share: ShareConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}
