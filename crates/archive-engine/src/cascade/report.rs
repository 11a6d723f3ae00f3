//! Outcome summaries for cascades and subtree deletes.

use serde::{Deserialize, Serialize};

use archive_core::types::ResourceId;

/// Summary of a completed cascade or rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Where the cascade started. `None` for a full rebuild.
    pub root: Option<ResourceId>,
    /// Resources whose closure was recomputed.
    pub resources_visited: usize,
    /// Resources whose stored closure changed.
    pub resources_updated: usize,
    /// File records whose closure was recomputed.
    pub files_visited: usize,
    /// File records whose stored closure changed.
    pub files_updated: usize,
    /// Documents skipped because their parents could not be resolved (rebuild only).
    pub failed: usize,
    /// Wall time.
    pub elapsed_ms: u64,
}

impl CascadeReport {
    /// Whether anything was written.
    pub fn wrote_anything(&self) -> bool {
        self.resources_updated > 0 || self.files_updated > 0
    }
}

/// Summary of a subtree delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// The deleted subtree root.
    pub root: ResourceId,
    /// Resources deleted, including the root.
    pub resources_deleted: usize,
    /// File records deleted because no parent remained.
    pub files_deleted: usize,
    /// File records that lost some parents and were recomputed.
    pub files_detached: usize,
    /// Wall time.
    pub elapsed_ms: u64,
}
