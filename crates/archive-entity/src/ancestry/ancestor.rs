//! Transitive ancestry (closure) entries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archive_core::types::ResourceId;

use crate::category::CategorySlug;

/// One node of a resource's transitive closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    /// The ancestor resource.
    pub id: ResourceId,
    /// The ancestor's category.
    pub category: CategorySlug,
    /// Shortest number of parent edges from the owning document (direct parents are 1).
    pub depth: u32,
    /// Every immediate descendant through which this ancestor is reached.
    pub descendant_ids: BTreeSet<Uuid>,
}

/// A document's full ancestry in breadth-first discovery order.
///
/// Entries are sorted by ascending depth; within one depth they follow the
/// order in which direct parents were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ancestry(Vec<Ancestor>);

impl Ancestry {
    /// An empty closure.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wrap entries already in discovery order.
    pub fn from_ordered(entries: Vec<Ancestor>) -> Self {
        Self(entries)
    }

    /// Number of ancestors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no ancestors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `id` is an ancestor.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.0.iter().any(|a| a.id == id)
    }

    /// Look up the entry for `id`.
    pub fn get(&self, id: ResourceId) -> Option<&Ancestor> {
        self.0.iter().find(|a| a.id == id)
    }

    /// Iterate in ascending depth.
    pub fn iter(&self) -> std::slice::Iter<'_, Ancestor> {
        self.0.iter()
    }

    /// Ancestor ids in ascending depth.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.0.iter().map(|a| a.id).collect()
    }

    /// Deepest depth in the closure, `0` when empty.
    pub fn max_depth(&self) -> u32 {
        self.0.iter().map(|a| a.depth).max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Ancestry {
    type Item = &'a Ancestor;
    type IntoIter = std::slice::Iter<'a, Ancestor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
