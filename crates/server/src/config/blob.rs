use serde::Deserialize;

use dropshare_blob::DEFAULT_MAX_BLOB_BYTES;

/// Where uploaded files are kept and how large they may be.
#[derive(Debug, Deserialize)]
pub struct BlobConfig {
    /// Directory holding uploaded files. Created at startup if absent.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_upload_dir() -> String {
    "uploads".to_owned()
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BLOB_BYTES
}
