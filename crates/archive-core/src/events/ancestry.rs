//! Ancestry-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{AccessRightId, FileRecordId, ResourceId};

/// Events emitted when the resource hierarchy changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AncestryEvent {
    /// A resource's direct parents (and therefore its closure) changed.
    ParentsChanged {
        /// The resource.
        resource_id: ResourceId,
        /// Direct parents after validation and pruning.
        parent_ids: Vec<ResourceId>,
        /// Size of the recomputed closure.
        ancestor_count: usize,
    },
    /// A resource's explicit access right was set or cleared.
    AccessRightChanged {
        /// The resource.
        resource_id: ResourceId,
        /// The new explicit right, `None` when cleared.
        access_right: Option<AccessRightId>,
    },
    /// A file record's parents or closure changed.
    FileRecordChanged {
        /// The file record.
        file_id: FileRecordId,
        /// Direct parents after validation and pruning.
        parent_ids: Vec<ResourceId>,
    },
    /// A cascade visited every descendant.
    CascadeCompleted {
        /// Where the cascade started.
        root: ResourceId,
        /// Resources visited.
        resources_visited: usize,
        /// Resources whose closure was rewritten.
        resources_updated: usize,
        /// File records whose closure was rewritten.
        files_updated: usize,
    },
    /// A cascade stopped early and must be re-run.
    CascadeIncomplete {
        /// Where the cascade started.
        root: ResourceId,
        /// Nodes processed before stopping.
        processed: usize,
        /// Nodes still queued when it stopped.
        remaining: usize,
        /// Why it stopped.
        reason: String,
    },
    /// A resource and everything below it was deleted.
    SubtreeDeleted {
        /// The subtree root.
        root: ResourceId,
        /// Resources deleted, including the root.
        resources_deleted: usize,
        /// File records deleted because they lost their last parent.
        files_deleted: usize,
        /// File records detached but kept.
        files_detached: usize,
    },
}

impl AncestryEvent {
    /// Short machine-readable name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParentsChanged { .. } => "parents_changed",
            Self::AccessRightChanged { .. } => "access_right_changed",
            Self::FileRecordChanged { .. } => "file_record_changed",
            Self::CascadeCompleted { .. } => "cascade_completed",
            Self::CascadeIncomplete { .. } => "cascade_incomplete",
            Self::SubtreeDeleted { .. } => "subtree_deleted",
        }
    }
}
