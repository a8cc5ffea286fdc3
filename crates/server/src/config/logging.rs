use serde::Deserialize;

/// Log output configuration.
///
/// `RUST_LOG`, when set, takes precedence over `filter`.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_owned()
}
