//! File record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use archive_core::types::{AccessRightId, FileRecordId, ResourceId};

use crate::ancestry::{Ancestry, DirectParents};

/// A binary asset attached to one or more resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique file record identifier.
    pub id: FileRecordId,
    /// Resources this file is attached to.
    pub direct_parents: DirectParents,
    /// Transitive closure of `direct_parents`.
    pub ancestors: Ancestry,
    /// Explicit access right; `None` inherits.
    pub access_right: Option<AccessRightId>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Whether the record is attached to `resource`.
    pub fn is_attached_to(&self, resource: ResourceId) -> bool {
        self.direct_parents.contains(resource)
    }

    /// Apply a patch in place and bump `updated_at`.
    pub fn apply(&mut self, patch: &FileRecordPatch) {
        if let Some(parents) = &patch.direct_parents {
            self.direct_parents = parents.clone();
        }
        if let Some(ancestors) = &patch.ancestors {
            self.ancestors = ancestors.clone();
        }
        if let Some(access_right) = patch.access_right {
            self.access_right = access_right;
        }
        self.updated_at = Utc::now();
    }
}

/// Data required to attach a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileRecord {
    /// Resources the file is attached to.
    pub direct_parents: DirectParents,
    /// Explicit access right.
    #[serde(default)]
    pub access_right: Option<AccessRightId>,
}

impl NewFileRecord {
    /// A file record attached to `parents`.
    pub fn new(parents: DirectParents) -> Self {
        Self {
            direct_parents: parents,
            access_right: None,
        }
    }

    /// Materialize into a stored record with the given id and closure.
    pub fn into_record(self, id: FileRecordId, parents: DirectParents, ancestors: Ancestry) -> FileRecord {
        let now = Utc::now();
        FileRecord {
            id,
            direct_parents: parents,
            ancestors,
            access_right: self.access_right,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a file record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRecordPatch {
    /// Replacement direct parents.
    pub direct_parents: Option<DirectParents>,
    /// Replacement closure.
    pub ancestors: Option<Ancestry>,
    /// Replacement access right (`Some(None)` clears it).
    pub access_right: Option<Option<AccessRightId>>,
}

impl FileRecordPatch {
    /// Patch replacing parents and closure together.
    pub fn structure(parents: DirectParents, ancestors: Ancestry) -> Self {
        Self {
            direct_parents: Some(parents),
            ancestors: Some(ancestors),
            access_right: None,
        }
    }
}
