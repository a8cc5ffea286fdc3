//! Redis session backend for DropShare.
//!
//! This crate provides a Redis-backed implementation of the [`SessionStore`]
//! trait from `dropshare-state`.
//!
//! # Layout
//!
//! - **Sessions**: one hash per session at `prefix:session:kind:code` with
//!   fields `id`, `exp` (expiry in Unix milliseconds) and `v` (the session as
//!   JSON). Each hash carries a native `PEXPIRE` of the remaining TTL plus a
//!   grace period, so Redis reclaims it even when no sweeper runs.
//! - **Expiry index**: a sorted set at `prefix:expiry_index` scoring each
//!   `kind:code` member by its expiry, used by `purge_expired`.
//!
//! Every mutating operation is a Lua script, so conditional insert, one-time
//! take and identity-checked delete are atomic on a single instance.
//!
//! # Example
//!
//! ```ignore
//! use dropshare_state_redis::{RedisConfig, RedisSessionStore};
//!
//! let config = RedisConfig {
//!     url: "redis://localhost:6379".into(),
//!     ..RedisConfig::default()
//! };
//! let store = RedisSessionStore::new(&config)?;
//! ```
//!
//! [`SessionStore`]: dropshare_state::SessionStore

mod config;
mod key_render;
mod scripts;
mod store;

pub use config::RedisConfig;
pub use store::RedisSessionStore;
