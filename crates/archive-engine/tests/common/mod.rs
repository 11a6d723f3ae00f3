//! Engine fixture shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use archive_cache::CacheManager;
use archive_core::config::ancestry::AncestryConfig;
use archive_core::config::cache::CacheConfig;
use archive_core::types::{AccessRightId, ResourceId, UserId};
use archive_engine::{AncestryEngine, RequestContext};
use archive_entity::access::AccessRight;
use archive_entity::ancestry::{DirectParent, DirectParents};
use archive_entity::category::Category;
use archive_entity::resource::NewResource;
use archive_store::{MemoryResourceStore, ResourceStore, StaticOptionResolver, StaticTypeRegistry};

pub struct Harness {
    pub engine: AncestryEngine,
    pub store: Arc<MemoryResourceStore>,
    pub ctx: RequestContext,
    pub restricted: AccessRight,
    pub public: AccessRight,
}

pub fn categories() -> StaticTypeRegistry {
    StaticTypeRegistry::with_categories([
        Category::new("collection", true),
        Category::new("document", false).allow_parent("collection"),
    ])
}

pub fn rights() -> (AccessRight, AccessRight) {
    (
        AccessRight {
            id: AccessRightId::new(),
            term: "restricted".to_string(),
        },
        AccessRight {
            id: AccessRightId::new(),
            term: "public".to_string(),
        },
    )
}

impl Harness {
    /// Engine over an in-memory store and the moka cache.
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryResourceStore::new()), AncestryConfig::default()).await
    }

    pub async fn with_store(store: Arc<MemoryResourceStore>, config: AncestryConfig) -> Self {
        Self::build(store.clone(), store, config).await
    }

    /// Engine over `engine_store`, with `store` kept for direct inspection.
    pub async fn build(
        store: Arc<MemoryResourceStore>,
        engine_store: Arc<dyn ResourceStore>,
        config: AncestryConfig,
    ) -> Self {
        let (restricted, public) = rights();
        let cache = CacheManager::new(&CacheConfig::default()).await.unwrap();
        let engine = AncestryEngine::new(
            engine_store,
            Arc::new(categories()),
            Arc::new(StaticOptionResolver::with_options([
                restricted.clone(),
                public.clone(),
            ])),
            Arc::new(cache),
            config,
        )
        .with_events();

        Self {
            engine,
            store,
            ctx: RequestContext::new(UserId::new()),
            restricted,
            public,
        }
    }

    /// Create a resource under `parents` through the engine.
    pub async fn create(&self, category: &str, parents: &[ResourceId]) -> ResourceId {
        let parents = self.parents(parents).await;
        self.engine
            .create_resource(&self.ctx, NewResource::new(category).with_parents(parents))
            .await
            .unwrap()
            .id
    }

    /// Direct-parent list for `ids` with their stored categories.
    pub async fn parents(&self, ids: &[ResourceId]) -> DirectParents {
        let mut entries = Vec::new();
        for id in ids {
            let category = self
                .store
                .get_resource(*id)
                .await
                .unwrap()
                .map(|r| r.category)
                .unwrap_or_else(|| "collection".into());
            entries.push(DirectParent::new(*id, category));
        }
        DirectParents::from_entries(entries)
    }
}
