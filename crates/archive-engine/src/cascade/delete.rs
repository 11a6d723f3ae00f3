//! Recursive subtree deletion.

use std::collections::{BTreeMap, HashSet};

use tokio::time::Instant;
use tracing::{debug, info};

use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::file_record::{FileRecord, FileRecordPatch};

use super::report::DeleteReport;
use super::updater::CascadeUpdater;
use crate::context::RequestContext;
use crate::error::{AncestryError, AncestryResult};

impl CascadeUpdater {
    /// Delete `root` and every resource below it.
    ///
    /// Resources are deleted deepest-first in reverse breadth-first order,
    /// so an interrupted delete leaves a smaller subtree that can be deleted
    /// again. Attached file records lose the deleted parents first; a record
    /// left with no parent is deleted, the others are recomputed at the end.
    pub async fn delete_subtree(
        &self,
        ctx: &RequestContext,
        root: ResourceId,
    ) -> AncestryResult<DeleteReport> {
        let started = Instant::now();
        if self.store.get_resource(root).await?.is_none() {
            return Err(AncestryError::resource_not_found(root, None));
        }
        self.memo.flush_ancestry().await;

        let mut doomed = vec![root];
        doomed.extend(self.descendants(root).await?);
        let doomed_set: HashSet<ResourceId> = doomed.iter().copied().collect();

        let mut survivors: BTreeMap<FileRecordId, FileRecord> = BTreeMap::new();
        let mut deleted_files: HashSet<FileRecordId> = HashSet::new();

        for id in doomed.iter().rev() {
            for mut record in self.store.find_file_records_attached_to(*id).await? {
                if deleted_files.contains(&record.id) {
                    continue;
                }
                record.direct_parents.retain(|p| !doomed_set.contains(&p.id));

                if record.direct_parents.is_empty() {
                    self.store.delete_file_record(record.id).await?;
                    survivors.remove(&record.id);
                    deleted_files.insert(record.id);
                    debug!(file_id = %record.id, "Deleted orphaned file record");
                } else {
                    let record = self
                        .store
                        .update_file_record(
                            record.id,
                            &FileRecordPatch {
                                direct_parents: Some(record.direct_parents.clone()),
                                ..FileRecordPatch::default()
                            },
                        )
                        .await?;
                    survivors.insert(record.id, record);
                }
            }

            self.store.delete_resource(*id).await?;
        }

        for record in survivors.values() {
            self.refresh_file(record).await?;
        }

        self.memo.flush_ancestry().await;
        let report = DeleteReport {
            root,
            resources_deleted: doomed.len(),
            files_deleted: deleted_files.len(),
            files_detached: survivors.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            user_id = %ctx.user_id,
            root = %root,
            resources_deleted = report.resources_deleted,
            files_deleted = report.files_deleted,
            files_detached = report.files_detached,
            "Subtree deleted"
        );
        Ok(report)
    }
}
