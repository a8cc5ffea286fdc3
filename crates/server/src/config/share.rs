use serde::Deserialize;

use dropshare_core::DEFAULT_CODE_LENGTH;

/// Share lifetime, code shape and expiry sweeping.
#[derive(Debug, Deserialize)]
pub struct ShareConfig {
    /// How long an unredeemed share lives, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Number of characters in a share code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Codes drawn before a share fails on collisions.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
    /// How often the expiry sweeper runs, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Whether the sweeper also deletes orphaned upload files.
    #[serde(default = "default_reap_blobs")]
    pub reap_blobs: bool,
    /// Extra age past the TTL before an orphaned upload is deleted, in seconds.
    #[serde(default = "default_blob_grace")]
    pub blob_grace_seconds: u64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            code_length: default_code_length(),
            max_code_attempts: default_max_code_attempts(),
            sweep_interval_seconds: default_sweep_interval(),
            reap_blobs: default_reap_blobs(),
            blob_grace_seconds: default_blob_grace(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

fn default_max_code_attempts() -> u32 {
    8
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_reap_blobs() -> bool {
    true
}

fn default_blob_grace() -> u64 {
    60
}
