use serde::Deserialize;

/// Configuration for the session store backend.
#[derive(Debug, Deserialize)]
pub struct StateConfig {
    /// Which backend to use: `"memory"` or `"redis"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Connection URL for the backend (e.g. `redis://localhost:6379`).
    pub url: Option<String>,

    /// Key prefix for backends that support it. Defaults to `"dropshare"`.
    pub prefix: Option<String>,

    /// Seconds a Redis record outlives its logical expiry before the server
    /// drops it on its own.
    pub expiry_grace_seconds: Option<u64>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            prefix: None,
            expiry_grace_seconds: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}
