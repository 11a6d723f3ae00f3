//! Shared fixtures for unit tests.

use std::sync::Arc;

use archive_core::types::{AccessRightId, ResourceId};
use archive_entity::access::AccessRight;
use archive_entity::ancestry::{Ancestry, DirectParent, DirectParents};
use archive_entity::category::Category;
use archive_entity::resource::{NewResource, ResourcePatch};
use archive_store::{MemoryResourceStore, ResourceStore, StaticOptionResolver, StaticTypeRegistry};

use crate::ancestry::AncestryResolver;
use crate::memo::MemoCache;
use crate::registry::RegistryLookup;

/// Store, registry, and options wired the way the engine wires them.
pub(crate) struct Fixture {
    pub store: Arc<MemoryResourceStore>,
    pub types: Arc<StaticTypeRegistry>,
    pub options: Arc<StaticOptionResolver>,
    pub restricted: AccessRight,
    pub public: AccessRight,
}

impl Fixture {
    /// `collection` nests in itself, `document` sits under collections.
    pub fn new() -> Self {
        let restricted = AccessRight {
            id: AccessRightId::new(),
            term: "restricted".to_string(),
        };
        let public = AccessRight {
            id: AccessRightId::new(),
            term: "public".to_string(),
        };
        Self {
            store: Arc::new(MemoryResourceStore::new()),
            types: Arc::new(StaticTypeRegistry::with_categories([
                Category::new("collection", true),
                Category::new("document", false).allow_parent("collection"),
                Category::new("note", false).allow_parent("document"),
            ])),
            options: Arc::new(StaticOptionResolver::with_options([
                restricted.clone(),
                public.clone(),
            ])),
            restricted,
            public,
        }
    }

    pub fn resolver(&self) -> AncestryResolver {
        AncestryResolver::new(self.store.clone(), MemoCache::disabled(), 10_000)
    }

    pub fn registry(&self) -> RegistryLookup {
        RegistryLookup::new(self.types.clone(), self.options.clone(), MemoCache::disabled())
    }

    /// Direct-parent list for `ids` using their stored categories.
    pub async fn parents(&self, ids: &[ResourceId]) -> DirectParents {
        parents_of(&self.store, ids).await
    }

    /// Overwrite stored parents without validation.
    pub async fn set_raw_parents(&self, id: ResourceId, ids: &[ResourceId]) {
        let parents = self.parents(ids).await;
        self.store
            .update_resource(
                id,
                &ResourcePatch {
                    direct_parents: Some(parents),
                    ..ResourcePatch::default()
                },
            )
            .await
            .unwrap();
    }

    /// Set an explicit access right without going through the engine.
    pub async fn set_raw_access(&self, id: ResourceId, right: Option<AccessRightId>) {
        self.store
            .update_resource(
                id,
                &ResourcePatch {
                    access_right: Some(right),
                    ..ResourcePatch::default()
                },
            )
            .await
            .unwrap();
    }
}

async fn parents_of(store: &MemoryResourceStore, ids: &[ResourceId]) -> DirectParents {
    let mut parents = DirectParents::new();
    for id in ids {
        let category = match store.get_resource(*id).await.unwrap() {
            Some(r) => r.category,
            None => "collection".into(),
        };
        parents = DirectParents::from_entries(
            parents
                .into_iter()
                .chain(std::iter::once(DirectParent::new(*id, category))),
        );
    }
    parents
}

/// Insert a resource with the given parents and an empty stored closure.
pub(crate) async fn insert_resource(
    store: &MemoryResourceStore,
    category: &str,
    parents: &[ResourceId],
) -> ResourceId {
    let id = ResourceId::new();
    let parents = parents_of(store, parents).await;
    let resource = NewResource::new(category).into_resource(id, parents, Ancestry::new());
    store.insert_resource(&resource).await.unwrap();
    id
}
