//! Cache provider that stores nothing.

use std::time::Duration;

use async_trait::async_trait;

use archive_core::result::AppResult;
use archive_core::traits::cache::CacheProvider;

/// Provider whose reads always miss and whose writes are discarded.
///
/// Substituted in tests and when `cache.provider = "none"`, so every
/// resolution goes straight to the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheProvider;

#[async_trait]
impl CacheProvider for NoopCacheProvider {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn set_default(&self, _key: &str, _value: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete_pattern(&self, _pattern: &str) -> AppResult<u64> {
        Ok(0)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        Ok(())
    }
}
