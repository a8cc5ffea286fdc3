//! One-time share orchestration for DropShare.
//!
//! [`ShareService`] turns text, links and uploaded files into short codes and
//! redeems each code exactly once. Sessions live in a
//! [`SessionStore`](dropshare_state::SessionStore); file bytes live in a
//! [`BlobStore`](dropshare_blob::BlobStore) and are deleted together with
//! their session, whether it is redeemed or expires.
//!
//! [`ExpirySweeper`] runs the periodic purge that physically removes expired
//! sessions and reclaims their blobs.

pub mod background;
pub mod builder;
pub mod download;
pub mod error;
pub mod metrics;
pub mod service;

pub use background::{ExpirySweeper, SweeperConfig};
pub use builder::ShareServiceBuilder;
pub use download::{DownloadStream, FileDownload, FileUpload};
pub use error::ShareError;
pub use metrics::{MetricsSnapshot, ShareMetrics};
pub use service::ShareService;
