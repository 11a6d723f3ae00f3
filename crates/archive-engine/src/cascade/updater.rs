//! Cascading recomputation of descendant closures.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::file_record::{FileRecord, FileRecordPatch};
use archive_entity::resource::{ResourceFilter, ResourcePatch};
use archive_store::ResourceStore;

use super::options::CascadeOptions;
use super::report::CascadeReport;
use crate::ancestry::AncestryResolver;
use crate::context::RequestContext;
use crate::error::{AncestryError, AncestryResult};
use crate::memo::MemoCache;

/// Walks descendants after a structural change and rewrites stale closures.
#[derive(Debug, Clone)]
pub struct CascadeUpdater {
    pub(super) store: Arc<dyn ResourceStore>,
    pub(super) resolver: AncestryResolver,
    pub(super) memo: MemoCache,
}

/// Visited sets and counters of one walk.
#[derive(Debug, Default)]
struct Walk {
    report: CascadeReport,
    seen_files: HashSet<FileRecordId>,
}

impl CascadeUpdater {
    /// Creates a new updater.
    pub fn new(store: Arc<dyn ResourceStore>, resolver: AncestryResolver, memo: MemoCache) -> Self {
        Self {
            store,
            resolver,
            memo,
        }
    }

    /// Recompute `root`, every resource below it, and every file record
    /// attached to any of them.
    ///
    /// Each resource is processed once even when reachable through several
    /// parents. Unchanged closures are not rewritten, so a repeat run with
    /// no intervening mutation writes nothing.
    pub async fn cascade(
        &self,
        ctx: &RequestContext,
        root: ResourceId,
        options: &CascadeOptions,
    ) -> AncestryResult<CascadeReport> {
        let started = Instant::now();
        self.memo.flush_ancestry().await;

        let mut walk = Walk::default();
        walk.report.root = Some(root);

        let mut visited: HashSet<ResourceId> = HashSet::from([root]);
        let mut queue: VecDeque<ResourceId> = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            if let Some(reason) = options.interruption(started) {
                return Err(self
                    .incomplete(root, walk.report.resources_visited, queue.len() + 1, reason)
                    .await);
            }

            let step = self.visit(node, &mut walk).await;
            let children = match step {
                Ok(()) => self.store.find_children(node).await.map_err(AncestryError::from),
                Err(e) => Err(e),
            };
            let children = match children {
                Ok(children) => children,
                Err(e) => {
                    return Err(self
                        .incomplete(root, walk.report.resources_visited, queue.len() + 1, e.to_string())
                        .await);
                }
            };

            for child in children {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                }
            }
        }

        self.memo.flush_ancestry().await;
        walk.report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            user_id = %ctx.user_id,
            root = %root,
            resources_visited = walk.report.resources_visited,
            resources_updated = walk.report.resources_updated,
            files_updated = walk.report.files_updated,
            elapsed_ms = walk.report.elapsed_ms,
            "Cascade completed"
        );
        Ok(walk.report)
    }

    /// Recompute every resource and file record in the store.
    ///
    /// Repairs closures left stale by racing writers. A document whose
    /// parents cannot be resolved is logged and counted, not fatal.
    pub async fn rebuild_all(&self, ctx: &RequestContext) -> AncestryResult<CascadeReport> {
        let started = Instant::now();
        self.memo.flush_ancestry().await;
        let mut report = CascadeReport::default();

        for resource in self.store.find_resources(&ResourceFilter::all()).await? {
            report.resources_visited += 1;
            match self
                .resolver
                .resolve_for_parents(Some(resource.id), &resource.direct_parents)
                .await
            {
                Ok(ancestors) if ancestors == resource.ancestors => {}
                Ok(ancestors) => {
                    self.store
                        .update_resource(resource.id, &ResourcePatch::ancestors(ancestors))
                        .await?;
                    report.resources_updated += 1;
                }
                Err(AncestryError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(resource_id = %resource.id, error = %e, "Skipping unresolvable resource");
                    report.failed += 1;
                }
            }
        }

        for record in self.store.list_file_records().await? {
            report.files_visited += 1;
            match self.refresh_file(&record).await {
                Ok(true) => report.files_updated += 1,
                Ok(false) => {}
                Err(AncestryError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(file_id = %record.id, error = %e, "Skipping unresolvable file record");
                    report.failed += 1;
                }
            }
        }

        self.memo.flush_ancestry().await;
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            user_id = %ctx.user_id,
            resources_updated = report.resources_updated,
            files_updated = report.files_updated,
            failed = report.failed,
            "Rebuild completed"
        );
        Ok(report)
    }

    /// Every resource below `root`, breadth-first, each once.
    pub async fn descendants(&self, root: ResourceId) -> AncestryResult<Vec<ResourceId>> {
        let mut visited: HashSet<ResourceId> = HashSet::from([root]);
        let mut queue: VecDeque<ResourceId> = VecDeque::from([root]);
        let mut order = Vec::new();

        while let Some(node) = queue.pop_front() {
            for child in self.store.find_children(node).await? {
                if visited.insert(child.id) {
                    order.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }
        Ok(order)
    }

    /// Recompute one resource and the file records attached to it.
    async fn visit(&self, id: ResourceId, walk: &mut Walk) -> AncestryResult<()> {
        let Some(resource) = self.store.get_resource(id).await? else {
            debug!(resource_id = %id, "Resource vanished during cascade");
            return Ok(());
        };

        let ancestors = self
            .resolver
            .resolve_for_parents(Some(id), &resource.direct_parents)
            .await?;
        walk.report.resources_visited += 1;
        if ancestors != resource.ancestors {
            self.store
                .update_resource(id, &ResourcePatch::ancestors(ancestors))
                .await?;
            walk.report.resources_updated += 1;
        }

        for record in self.store.find_file_records_attached_to(id).await? {
            if !walk.seen_files.insert(record.id) {
                continue;
            }
            walk.report.files_visited += 1;
            if self.refresh_file(&record).await? {
                walk.report.files_updated += 1;
            }
        }
        Ok(())
    }

    /// Recompute a file record's closure. Returns whether it was rewritten.
    pub(super) async fn refresh_file(&self, record: &FileRecord) -> AncestryResult<bool> {
        let ancestors = self
            .resolver
            .resolve_for_file(record.id, &record.direct_parents)
            .await?;
        if ancestors == record.ancestors {
            return Ok(false);
        }
        self.store
            .update_file_record(
                record.id,
                &FileRecordPatch {
                    ancestors: Some(ancestors),
                    ..FileRecordPatch::default()
                },
            )
            .await?;
        Ok(true)
    }

    async fn incomplete(
        &self,
        root: ResourceId,
        processed: usize,
        remaining: usize,
        reason: String,
    ) -> AncestryError {
        // Entries written before the stop must not be served stale.
        self.memo.flush_ancestry().await;
        warn!(root = %root, processed, remaining, reason = %reason, "Cascade incomplete");
        AncestryError::CascadeIncomplete {
            root,
            processed,
            remaining,
            reason,
        }
    }
}
