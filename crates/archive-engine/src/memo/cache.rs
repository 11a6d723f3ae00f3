//! Memo cache over the configured [`CacheManager`].
//!
//! Cache failures never fail a resolution: a backend error on read is a
//! miss, on write it is dropped, and both are logged at `warn`.
//!
//! Each operation carries a generation counter that `flush` bumps. A value
//! computed across a flush is returned to its caller but not stored.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use archive_cache::CacheManager;
use archive_cache::keys;
use archive_core::traits::CacheProvider;

use super::operation::MemoOperation;

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to the resolver.
    pub misses: u64,
}

/// Read-through memo cache keyed by `(operation, args)`.
#[derive(Debug, Clone)]
pub struct MemoCache {
    /// Backing cache.
    cache: Arc<CacheManager>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    /// Flush count per operation, indexed by [`MemoOperation::index`].
    generations: Arc<[AtomicU64; 6]>,
    /// Held shared by guarded writes and exclusively by flushes.
    gate: Arc<RwLock<()>>,
}

impl MemoCache {
    /// Creates a memo cache over an existing cache manager.
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self {
            cache,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            generations: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// A memo cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(CacheManager::disabled()))
    }

    /// Current hit/miss counters.
    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Look up a memoized value.
    pub async fn get<T>(&self, operation: MemoOperation, args: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let key = keys::memo(operation.as_str(), args);
        match self.cache.get_json::<T>(&key).await {
            Ok(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(%operation, args, "Memo hit");
                Some(value)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(%operation, args, "Memo miss");
                None
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(%operation, args, error = %e, "Memo read failed, treating as miss");
                None
            }
        }
    }

    /// Store a memoized value.
    pub async fn put<T>(&self, operation: MemoOperation, args: &str, value: &T)
    where
        T: Serialize + Send + Sync,
    {
        let key = keys::memo(operation.as_str(), args);
        if let Err(e) = self.cache.set_json(&key, value).await {
            warn!(%operation, args, error = %e, "Memo write failed");
        }
    }

    /// Return the memoized value or compute, store, and return it.
    ///
    /// Errors from `compute` are returned and never cached. The result is
    /// not stored when `operation` was flushed while it was computed.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        operation: MemoOperation,
        args: &str,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = self.generation(operation);
        if let Some(hit) = self.get(operation, args).await {
            return Ok(hit);
        }
        let value = compute().await?;

        let _shared = self.gate.read().await;
        if self.generation(operation) == generation {
            self.put(operation, args, &value).await;
        } else {
            debug!(%operation, args, "Flushed during compute, result not stored");
        }
        Ok(value)
    }

    fn generation(&self, operation: MemoOperation) -> u64 {
        self.generations[operation.index()].load(Ordering::SeqCst)
    }

    /// Drop every entry of the given operations.
    pub async fn flush(&self, operations: &[MemoOperation]) {
        let _exclusive = self.gate.write().await;
        for operation in operations {
            self.generations[operation.index()].fetch_add(1, Ordering::SeqCst);
            let pattern = keys::memo_pattern(operation.as_str());
            match self.cache.delete_pattern(&pattern).await {
                Ok(count) => debug!(%operation, count, "Flushed memo entries"),
                Err(e) => warn!(%operation, error = %e, "Memo flush failed"),
            }
        }
    }

    /// Flush every hierarchy-dependent operation.
    pub async fn flush_ancestry(&self) {
        self.flush(&MemoOperation::ANCESTRY).await;
    }

    /// Flush effective access-right lookups.
    pub async fn flush_access(&self) {
        self.flush(&MemoOperation::ACCESS).await;
    }

    /// Flush registry lookups (categories and option terms).
    pub async fn flush_registry(&self) {
        self.flush(&MemoOperation::REGISTRY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use archive_core::config::cache::CacheConfig;
    use archive_core::error::AppError;
    use archive_core::result::AppResult;

    /// Provider that fails every call.
    #[derive(Debug)]
    struct BrokenCache;

    #[async_trait]
    impl CacheProvider for BrokenCache {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::cache("connection refused"))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn set_default(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete(&self, _key: &str) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete_pattern(&self, _pattern: &str) -> AppResult<u64> {
            Err(AppError::cache("connection refused"))
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(false)
        }
        async fn flush_all(&self) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_broken_backend_is_a_miss() {
        let memo = MemoCache::new(Arc::new(CacheManager::from_provider(Arc::new(BrokenCache))));

        let value: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Ancestors, "a", || async { Ok(7) })
            .await;
        assert_eq!(value.unwrap(), 7);
        assert_eq!(memo.stats(), MemoStats { hits: 0, misses: 1 });

        memo.flush_ancestry().await;
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let memo = MemoCache::disabled();
        let value: Result<u32, &str> = memo
            .get_or_compute(MemoOperation::Category, "x", || async { Err("boom") })
            .await;
        assert_eq!(value, Err("boom"));
    }

    async fn memory_memo() -> MemoCache {
        MemoCache::new(Arc::new(CacheManager::new(&CacheConfig::default()).await.unwrap()))
    }

    #[tokio::test]
    async fn test_result_is_reused_until_flush() {
        let memo = memory_memo().await;
        let first: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Ancestors, "a", || async { Ok(1) })
            .await;
        assert_eq!(first.unwrap(), 1);

        let cached: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Ancestors, "a", || async { Ok(2) })
            .await;
        assert_eq!(cached.unwrap(), 1);

        memo.flush_ancestry().await;
        let fresh: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Ancestors, "a", || async { Ok(3) })
            .await;
        assert_eq!(fresh.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_flush_during_compute_drops_the_result() {
        let memo = memory_memo().await;
        let (started_tx, started) = oneshot::channel::<()>();
        let (release, released) = oneshot::channel::<()>();

        let racing = memo.clone();
        let lookup = tokio::spawn(async move {
            racing
                .get_or_compute(MemoOperation::Ancestors, "a", || async move {
                    started_tx.send(()).unwrap();
                    released.await.unwrap();
                    Ok::<u32, AppError>(1)
                })
                .await
        });

        started.await.unwrap();
        memo.flush_ancestry().await;
        release.send(()).unwrap();
        assert_eq!(lookup.await.unwrap().unwrap(), 1);

        let after: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Ancestors, "a", || async { Ok(2) })
            .await;
        assert_eq!(after.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_flush_leaves_other_operations_stored() {
        let memo = memory_memo().await;
        let _: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Category, "c", || async { Ok(1) })
            .await;

        memo.flush_ancestry().await;
        let kept: Result<u32, AppError> = memo
            .get_or_compute(MemoOperation::Category, "c", || async { Ok(2) })
            .await;
        assert_eq!(kept.unwrap(), 1);
    }
}
