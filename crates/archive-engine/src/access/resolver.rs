//! Effective access-right resolution.
//!
//! Resolution order:
//! 1. The document's own explicit right.
//! 2. The first ancestor, in ascending depth, that declares a right. Ties at
//!    one depth go to the ancestor discovered first (declaration order of
//!    the direct parents).
//! 3. No right: the document is public.
//!
//! Only the document and the members of its closure are ever read.

use std::sync::Arc;

use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_entity::access::{AccessRight, AccessSource, EffectiveAccessRight};
use archive_entity::ancestry::Ancestry;
use archive_store::ResourceStore;

use crate::ancestry::AncestryResolver;
use crate::error::{AncestryError, AncestryResult};
use crate::memo::{MemoCache, MemoOperation};
use crate::registry::RegistryLookup;

/// Resolves the access right actually enforced on resources and file records.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    store: Arc<dyn ResourceStore>,
    resolver: AncestryResolver,
    registry: RegistryLookup,
    memo: MemoCache,
}

impl AccessResolver {
    /// Creates a new access resolver.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        resolver: AncestryResolver,
        registry: RegistryLookup,
        memo: MemoCache,
    ) -> Self {
        Self {
            store,
            resolver,
            registry,
            memo,
        }
    }

    /// The right enforced on a resource, `None` when public.
    pub async fn resolve_access_right(&self, id: ResourceId) -> AncestryResult<Option<AccessRight>> {
        Ok(self.resolve_effective_access(id).await?.map(|e| e.right))
    }

    /// The right enforced on a resource together with where it came from.
    pub async fn resolve_effective_access(
        &self,
        id: ResourceId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        self.memo
            .get_or_compute(MemoOperation::AccessRight, &id.to_string(), || {
                self.effective_uncached(id)
            })
            .await
    }

    async fn effective_uncached(
        &self,
        id: ResourceId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        let resource = self
            .store
            .get_resource(id)
            .await?
            .ok_or_else(|| AncestryError::resource_not_found(id, None))?;

        if let Some(own) = resource.access_right {
            let right = self.option(own, id.into_uuid()).await?;
            return Ok(Some(EffectiveAccessRight {
                right,
                source: AccessSource::Own,
            }));
        }

        let ancestors = self.resolver.resolve_ancestors(id).await?;
        self.inherited(&ancestors).await
    }

    /// The right enforced on a file record, `None` when public.
    pub async fn resolve_file_access_right(
        &self,
        id: FileRecordId,
    ) -> AncestryResult<Option<AccessRight>> {
        Ok(self.resolve_file_effective_access(id).await?.map(|e| e.right))
    }

    /// The right enforced on a file record together with where it came from.
    pub async fn resolve_file_effective_access(
        &self,
        id: FileRecordId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        self.memo
            .get_or_compute(MemoOperation::FileAccessRight, &id.to_string(), || {
                self.file_effective_uncached(id)
            })
            .await
    }

    async fn file_effective_uncached(
        &self,
        id: FileRecordId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        let record = self
            .store
            .get_file_record(id)
            .await?
            .ok_or_else(|| AncestryError::file_not_found(id))?;

        if let Some(own) = record.access_right {
            let right = self.option(own, id.into_uuid()).await?;
            return Ok(Some(EffectiveAccessRight {
                right,
                source: AccessSource::Own,
            }));
        }

        let ancestors = self.resolver.resolve_file_ancestors(id).await?;
        self.inherited(&ancestors).await
    }

    /// First declared right among `ancestors`, which are in ascending depth.
    async fn inherited(&self, ancestors: &Ancestry) -> AncestryResult<Option<EffectiveAccessRight>> {
        for ancestor in ancestors {
            let resource = self
                .store
                .get_resource(ancestor.id)
                .await?
                .ok_or_else(|| AncestryError::resource_not_found(ancestor.id, None))?;

            if let Some(declared) = resource.access_right {
                let right = self.option(declared, ancestor.id.into_uuid()).await?;
                return Ok(Some(EffectiveAccessRight {
                    right,
                    source: AccessSource::Inherited {
                        from: ancestor.id,
                        depth: ancestor.depth,
                    },
                }));
            }
        }
        Ok(None)
    }

    /// Resolve an option id, failing closed when it is unknown.
    async fn option(
        &self,
        id: AccessRightId,
        declared_on: uuid::Uuid,
    ) -> AncestryResult<AccessRight> {
        self.registry
            .option(id)
            .await?
            .ok_or_else(|| AncestryError::option_not_found(id, declared_on))
    }
}
