//! Facade wiring the resolvers, validator, cascade, and memo cache together.
//!
//! Every write follows the same flow: validate, compute the closure, persist
//! both, cascade to descendants and attached file records, flush the memo
//! cache, publish a domain event.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use archive_cache::CacheManager;
use archive_core::config::ancestry::AncestryConfig;
use archive_core::events::{AncestryEvent, DomainEvent};
use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_entity::access::{AccessRight, EffectiveAccessRight};
use archive_entity::ancestry::{Ancestry, DirectParents};
use archive_entity::category::CategorySlug;
use archive_entity::file_record::{FileRecord, FileRecordPatch, NewFileRecord};
use archive_entity::resource::{NewResource, Resource, ResourcePatch};
use archive_store::{OptionResolver, ResourceStore, TypeRegistry};

use crate::access::AccessResolver;
use crate::ancestry::AncestryResolver;
use crate::cascade::{CascadeOptions, CascadeReport, CascadeUpdater, DeleteReport};
use crate::context::RequestContext;
use crate::error::{AncestryError, AncestryResult};
use crate::memo::{MemoCache, MemoOperation};
use crate::registry::RegistryLookup;
use crate::validation::{ParentValidator, ValidatedParents};

/// Capacity of the domain event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Entry point for every ancestry and access operation.
#[derive(Debug, Clone)]
pub struct AncestryEngine {
    store: Arc<dyn ResourceStore>,
    memo: MemoCache,
    registry: RegistryLookup,
    resolver: AncestryResolver,
    validator: ParentValidator,
    cascade: CascadeUpdater,
    access: AccessResolver,
    config: AncestryConfig,
    events: Option<broadcast::Sender<DomainEvent>>,
}

impl AncestryEngine {
    /// Wire an engine over injected collaborators.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        types: Arc<dyn TypeRegistry>,
        options: Arc<dyn OptionResolver>,
        cache: Arc<CacheManager>,
        config: AncestryConfig,
    ) -> Self {
        let memo = MemoCache::new(cache);
        let registry = RegistryLookup::new(types, options, memo.clone());
        let resolver = AncestryResolver::new(store.clone(), memo.clone(), config.max_nodes);
        let validator = ParentValidator::new(resolver.clone(), registry.clone());
        let cascade = CascadeUpdater::new(store.clone(), resolver.clone(), memo.clone());
        let access = AccessResolver::new(
            store.clone(),
            resolver.clone(),
            registry.clone(),
            memo.clone(),
        );

        Self {
            store,
            memo,
            registry,
            resolver,
            validator,
            cascade,
            access,
            config,
            events: None,
        }
    }

    /// Publish domain events on a fresh broadcast channel.
    pub fn with_events(mut self) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        self.events = Some(sender);
        self
    }

    /// Publish domain events on an existing channel.
    pub fn with_event_sender(mut self, sender: broadcast::Sender<DomainEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Subscribe to domain events. `None` when events are not enabled.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<DomainEvent>> {
        self.events.as_ref().map(|tx| tx.subscribe())
    }

    /// The memo cache in front of the resolvers.
    pub fn memo(&self) -> &MemoCache {
        &self.memo
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Fetch a resource.
    pub async fn get_resource(&self, id: ResourceId) -> AncestryResult<Resource> {
        self.store
            .get_resource(id)
            .await?
            .ok_or_else(|| AncestryError::resource_not_found(id, None))
    }

    /// Fetch a file record.
    pub async fn get_file_record(&self, id: FileRecordId) -> AncestryResult<FileRecord> {
        self.store
            .get_file_record(id)
            .await?
            .ok_or_else(|| AncestryError::file_not_found(id))
    }

    /// Closure of a resource.
    pub async fn resolve_ancestors(&self, id: ResourceId) -> AncestryResult<Ancestry> {
        self.resolver.resolve_ancestors(id).await
    }

    /// Closure of a file record.
    pub async fn resolve_file_ancestors(&self, id: FileRecordId) -> AncestryResult<Ancestry> {
        self.resolver.resolve_file_ancestors(id).await
    }

    /// Effective access right of a resource, `None` when public.
    pub async fn resolve_access_right(&self, id: ResourceId) -> AncestryResult<Option<AccessRight>> {
        self.access.resolve_access_right(id).await
    }

    /// Effective access right of a resource with its provenance.
    pub async fn resolve_effective_access(
        &self,
        id: ResourceId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        self.access.resolve_effective_access(id).await
    }

    /// Effective access right of a file record, `None` when public.
    pub async fn resolve_file_access_right(
        &self,
        id: FileRecordId,
    ) -> AncestryResult<Option<AccessRight>> {
        self.access.resolve_file_access_right(id).await
    }

    /// Effective access right of a file record with its provenance.
    pub async fn resolve_file_effective_access(
        &self,
        id: FileRecordId,
    ) -> AncestryResult<Option<EffectiveAccessRight>> {
        self.access.resolve_file_effective_access(id).await
    }

    /// Dry-run validation of a resource's proposed parents.
    pub async fn validate_parents(
        &self,
        resource_id: Option<ResourceId>,
        category: &CategorySlug,
        proposed: DirectParents,
    ) -> AncestryResult<ValidatedParents> {
        self.validator
            .validate_parents(resource_id, category, proposed)
            .await
    }

    /// Dry-run validation of a file record's proposed parents.
    pub async fn validate_file_parents(
        &self,
        file_id: FileRecordId,
        proposed: DirectParents,
    ) -> AncestryResult<ValidatedParents> {
        self.validator.validate_file_parents(file_id, proposed).await
    }

    /// Whether a resource of `category` may have a parent of `candidate`.
    pub async fn is_compatible_parent_category(
        &self,
        category: &CategorySlug,
        candidate: &CategorySlug,
    ) -> AncestryResult<bool> {
        self.validator
            .is_compatible_parent_category(category, candidate)
            .await
    }

    /// Every resource below `id`, breadth-first.
    pub async fn descendants(&self, id: ResourceId) -> AncestryResult<Vec<ResourceId>> {
        self.get_resource(id).await?;
        self.cascade.descendants(id).await
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Create a resource under validated parents.
    pub async fn create_resource(
        &self,
        ctx: &RequestContext,
        new: NewResource,
    ) -> AncestryResult<Resource> {
        let id = ResourceId::new();
        if self.registry.category(&new.category).await?.is_none() {
            return Err(AncestryError::UnknownCategory(new.category));
        }
        if let Some(right) = new.access_right {
            self.require_option(right, id.into_uuid()).await?;
        }

        let validated = self
            .validator
            .validate_parents(Some(id), &new.category, new.direct_parents.clone())
            .await?;
        let resource = new.into_resource(id, validated.parents, validated.ancestors);
        self.store.insert_resource(&resource).await?;

        info!(
            user_id = %ctx.user_id,
            resource_id = %id,
            category = %resource.category,
            parents = resource.direct_parents.len(),
            "Created resource"
        );
        self.publish(
            ctx,
            AncestryEvent::ParentsChanged {
                resource_id: id,
                parent_ids: resource.direct_parents.ids(),
                ancestor_count: resource.ancestors.len(),
            },
        );

        self.cascade(ctx, id).await?;
        Ok(resource)
    }

    /// Replace a resource's direct parents and cascade the change.
    ///
    /// The resource's own update commits before the cascade runs. If the
    /// cascade stops early the error is returned and the cascade can be
    /// re-run with [`Self::cascade`].
    pub async fn set_parents(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
        proposed: DirectParents,
    ) -> AncestryResult<Resource> {
        let current = self.get_resource(id).await?;
        let validated = self
            .validator
            .validate_parents(Some(id), &current.category, proposed)
            .await?;

        let updated = self
            .store
            .update_resource(
                id,
                &ResourcePatch::structure(validated.parents, validated.ancestors),
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            resource_id = %id,
            parents = updated.direct_parents.len(),
            ancestors = updated.ancestors.len(),
            pruned = validated.pruned.len(),
            "Updated resource parents"
        );
        self.publish(
            ctx,
            AncestryEvent::ParentsChanged {
                resource_id: id,
                parent_ids: updated.direct_parents.ids(),
                ancestor_count: updated.ancestors.len(),
            },
        );

        self.cascade(ctx, id).await?;
        Ok(updated)
    }

    /// Set or clear a resource's explicit access right.
    pub async fn set_access_right(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
        right: Option<AccessRightId>,
    ) -> AncestryResult<Resource> {
        self.get_resource(id).await?;
        if let Some(right) = right {
            self.require_option(right, id.into_uuid()).await?;
        }

        let updated = self
            .store
            .update_resource(
                id,
                &ResourcePatch {
                    access_right: Some(right),
                    ..ResourcePatch::default()
                },
            )
            .await?;
        self.memo.flush_access().await;

        info!(user_id = %ctx.user_id, resource_id = %id, access_right = ?right, "Updated access right");
        self.publish(
            ctx,
            AncestryEvent::AccessRightChanged {
                resource_id: id,
                access_right: right,
            },
        );
        Ok(updated)
    }

    /// Create a file record attached to validated parents.
    pub async fn attach_file(
        &self,
        ctx: &RequestContext,
        new: NewFileRecord,
    ) -> AncestryResult<FileRecord> {
        let id = FileRecordId::new();
        if let Some(right) = new.access_right {
            self.require_option(right, id.into_uuid()).await?;
        }

        let validated = self
            .validator
            .validate_file_parents(id, new.direct_parents.clone())
            .await?;
        let record = new.into_record(id, validated.parents, validated.ancestors);
        self.store.insert_file_record(&record).await?;
        self.sync_attachments(id, &[], &record.direct_parents.ids())
            .await?;
        self.memo
            .flush(&[MemoOperation::FileAncestors, MemoOperation::FileAccessRight])
            .await;

        info!(user_id = %ctx.user_id, file_id = %id, parents = record.direct_parents.len(), "Attached file record");
        self.publish(
            ctx,
            AncestryEvent::FileRecordChanged {
                file_id: id,
                parent_ids: record.direct_parents.ids(),
            },
        );
        Ok(record)
    }

    /// Replace a file record's direct parents.
    pub async fn set_file_parents(
        &self,
        ctx: &RequestContext,
        file_id: FileRecordId,
        proposed: DirectParents,
    ) -> AncestryResult<FileRecord> {
        let current = self.get_file_record(file_id).await?;
        let validated = self
            .validator
            .validate_file_parents(file_id, proposed)
            .await?;

        let updated = self
            .store
            .update_file_record(
                file_id,
                &FileRecordPatch::structure(validated.parents, validated.ancestors),
            )
            .await?;

        let before: BTreeSet<ResourceId> = current.direct_parents.ids().into_iter().collect();
        let after: BTreeSet<ResourceId> = updated.direct_parents.ids().into_iter().collect();
        let removed: Vec<ResourceId> = before.difference(&after).copied().collect();
        let added: Vec<ResourceId> = after.difference(&before).copied().collect();
        self.sync_attachments(file_id, &removed, &added).await?;
        self.memo
            .flush(&[MemoOperation::FileAncestors, MemoOperation::FileAccessRight])
            .await;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            added = added.len(),
            removed = removed.len(),
            "Updated file record parents"
        );
        self.publish(
            ctx,
            AncestryEvent::FileRecordChanged {
                file_id,
                parent_ids: updated.direct_parents.ids(),
            },
        );
        Ok(updated)
    }

    /// Cascade from `id` with the configured timeout.
    pub async fn cascade(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
    ) -> AncestryResult<CascadeReport> {
        self.cascade_with(ctx, id, &self.cascade_options()).await
    }

    /// Cascade bounds from configuration, without a cancellation source.
    pub fn cascade_options(&self) -> CascadeOptions {
        CascadeOptions {
            timeout: self.config.cascade_timeout(),
            ..CascadeOptions::default()
        }
    }

    /// Cascade from `id` with explicit bounds.
    pub async fn cascade_with(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
        options: &CascadeOptions,
    ) -> AncestryResult<CascadeReport> {
        match self.cascade.cascade(ctx, id, options).await {
            Ok(report) => {
                self.publish(
                    ctx,
                    AncestryEvent::CascadeCompleted {
                        root: id,
                        resources_visited: report.resources_visited,
                        resources_updated: report.resources_updated,
                        files_updated: report.files_updated,
                    },
                );
                Ok(report)
            }
            Err(AncestryError::CascadeIncomplete {
                root,
                processed,
                remaining,
                reason,
            }) => {
                self.publish(
                    ctx,
                    AncestryEvent::CascadeIncomplete {
                        root,
                        processed,
                        remaining,
                        reason: reason.clone(),
                    },
                );
                Err(AncestryError::CascadeIncomplete {
                    root,
                    processed,
                    remaining,
                    reason,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Delete `id` and every resource below it.
    pub async fn delete_subtree(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
    ) -> AncestryResult<DeleteReport> {
        let report = self.cascade.delete_subtree(ctx, id).await?;
        self.publish(
            ctx,
            AncestryEvent::SubtreeDeleted {
                root: id,
                resources_deleted: report.resources_deleted,
                files_deleted: report.files_deleted,
                files_detached: report.files_detached,
            },
        );
        Ok(report)
    }

    /// Recompute every closure in the store.
    pub async fn rebuild_all(&self, ctx: &RequestContext) -> AncestryResult<CascadeReport> {
        self.cascade.rebuild_all(ctx).await
    }

    // ── Helpers ────────────────────────────────────────────────────

    async fn require_option(
        &self,
        right: AccessRightId,
        declared_on: uuid::Uuid,
    ) -> AncestryResult<AccessRight> {
        self.registry
            .option(right)
            .await?
            .ok_or_else(|| AncestryError::option_not_found(right, declared_on))
    }

    /// Keep each parent resource's `attached_files` in step with a file record.
    async fn sync_attachments(
        &self,
        file_id: FileRecordId,
        removed: &[ResourceId],
        added: &[ResourceId],
    ) -> AncestryResult<()> {
        let changes = removed
            .iter()
            .map(|id| (*id, false))
            .chain(added.iter().map(|id| (*id, true)));

        for (resource_id, attach) in changes {
            let Some(resource) = self.store.get_resource(resource_id).await? else {
                debug!(resource_id = %resource_id, "Skipping attachment sync for missing resource");
                continue;
            };
            let mut files = resource.attached_files;
            let changed = if attach {
                files.insert(file_id)
            } else {
                files.remove(&file_id)
            };
            if changed {
                self.store
                    .update_resource(
                        resource_id,
                        &ResourcePatch {
                            attached_files: Some(files),
                            ..ResourcePatch::default()
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }

    fn publish(&self, ctx: &RequestContext, payload: AncestryEvent) {
        let Some(sender) = &self.events else {
            return;
        };
        let name = payload.name();
        if sender
            .send(DomainEvent::new(Some(ctx.user_id), payload))
            .is_err()
        {
            debug!(event = name, "No event subscribers");
        }
    }
}
