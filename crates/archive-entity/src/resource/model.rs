//! Resource entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use archive_core::types::{AccessRightId, FileRecordId, ResourceId};

use super::status::ResourceStatus;
use crate::ancestry::{Ancestry, DirectParents};
use crate::category::CategorySlug;

/// A catalogued archival item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: ResourceId,
    /// The resource category (post type).
    pub category: CategorySlug,
    /// Explicit immediate parents.
    pub direct_parents: DirectParents,
    /// Persisted transitive closure of `direct_parents`.
    pub ancestors: Ancestry,
    /// Explicit access right; `None` inherits from the nearest ancestor.
    pub access_right: Option<AccessRightId>,
    /// Editorial status.
    pub status: ResourceStatus,
    /// File records attached to this resource.
    pub attached_files: BTreeSet<FileRecordId>,
    /// When the resource was created.
    pub created_at: DateTime<Utc>,
    /// When the resource was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Check if this resource has no parents.
    pub fn is_root(&self) -> bool {
        self.direct_parents.is_empty()
    }

    /// Apply a patch in place and bump `updated_at`.
    pub fn apply(&mut self, patch: &ResourcePatch) {
        if let Some(parents) = &patch.direct_parents {
            self.direct_parents = parents.clone();
        }
        if let Some(ancestors) = &patch.ancestors {
            self.ancestors = ancestors.clone();
        }
        if let Some(access_right) = patch.access_right {
            self.access_right = access_right;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(files) = &patch.attached_files {
            self.attached_files = files.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Data required to create a new resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    /// The resource category.
    pub category: CategorySlug,
    /// Proposed direct parents (validated before insertion).
    #[serde(default)]
    pub direct_parents: DirectParents,
    /// Explicit access right.
    #[serde(default)]
    pub access_right: Option<AccessRightId>,
    /// Initial status.
    #[serde(default)]
    pub status: ResourceStatus,
}

impl NewResource {
    /// A parentless resource of `category`.
    pub fn new(category: impl Into<CategorySlug>) -> Self {
        Self {
            category: category.into(),
            direct_parents: DirectParents::new(),
            access_right: None,
            status: ResourceStatus::Created,
        }
    }

    /// Builder-style helper setting the proposed parents.
    pub fn with_parents(mut self, parents: DirectParents) -> Self {
        self.direct_parents = parents;
        self
    }

    /// Builder-style helper setting the explicit access right.
    pub fn with_access_right(mut self, right: AccessRightId) -> Self {
        self.access_right = Some(right);
        self
    }

    /// Materialize into a stored resource with the given id and closure.
    pub fn into_resource(self, id: ResourceId, parents: DirectParents, ancestors: Ancestry) -> Resource {
        let now = Utc::now();
        Resource {
            id,
            category: self.category,
            direct_parents: parents,
            ancestors,
            access_right: self.access_right,
            status: self.status,
            attached_files: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a resource. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcePatch {
    /// Replacement direct parents.
    pub direct_parents: Option<DirectParents>,
    /// Replacement closure.
    pub ancestors: Option<Ancestry>,
    /// Replacement access right (`Some(None)` clears it).
    pub access_right: Option<Option<AccessRightId>>,
    /// Replacement status.
    pub status: Option<ResourceStatus>,
    /// Replacement attached file set.
    pub attached_files: Option<BTreeSet<FileRecordId>>,
}

impl ResourcePatch {
    /// Patch replacing parents and closure together.
    pub fn structure(parents: DirectParents, ancestors: Ancestry) -> Self {
        Self {
            direct_parents: Some(parents),
            ancestors: Some(ancestors),
            ..Self::default()
        }
    }

    /// Patch replacing only the closure.
    pub fn ancestors(ancestors: Ancestry) -> Self {
        Self {
            ancestors: Some(ancestors),
            ..Self::default()
        }
    }
}

/// Filter for resource queries. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFilter {
    /// Only resources of this category.
    pub category: Option<CategorySlug>,
    /// Only resources listing this id as a direct parent.
    pub parent: Option<ResourceId>,
    /// Only resources whose stored closure contains this id.
    pub ancestor: Option<ResourceId>,
    /// Only resources in this status.
    pub status: Option<ResourceStatus>,
}

impl ResourceFilter {
    /// Filter matching every resource.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching direct children of `parent`.
    pub fn children_of(parent: ResourceId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Whether `resource` satisfies every set field.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.category.as_ref().is_none_or(|c| *c == resource.category)
            && self.parent.is_none_or(|p| resource.direct_parents.contains(p))
            && self.ancestor.is_none_or(|a| resource.ancestors.contains(a))
            && self.status.is_none_or(|s| s == resource.status)
    }
}
