//! # archive-cache
//!
//! Cache provider implementations. Supports three modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//! - **none**: Discards every write; used by tests and when caching is disabled
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod noop;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use noop::NoopCacheProvider;
pub use provider::CacheManager;
