//! Direct parent edges.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archive_core::types::ResourceId;

use crate::category::CategorySlug;

/// An explicitly assigned immediate parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectParent {
    /// The parent resource.
    pub id: ResourceId,
    /// The parent's category as declared (corrected to the stored one on validation).
    pub category: CategorySlug,
    /// Child documents this edge was declared on behalf of.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub parent_of: BTreeSet<Uuid>,
}

impl DirectParent {
    /// Create an edge without annotations.
    pub fn new(id: ResourceId, category: impl Into<CategorySlug>) -> Self {
        Self {
            id,
            category: category.into(),
            parent_of: BTreeSet::new(),
        }
    }

    /// Builder-style helper adding a `parent_of` annotation.
    pub fn on_behalf_of(mut self, child: impl Into<Uuid>) -> Self {
        self.parent_of.insert(child.into());
        self
    }
}

/// Ordered, duplicate-free list of direct parents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectParents(Vec<DirectParent>);

impl DirectParents {
    /// An empty parent list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a list, collapsing duplicate ids.
    ///
    /// The first entry for an id wins (including its category); later
    /// duplicates only contribute their `parent_of` annotations.
    pub fn from_entries(entries: impl IntoIterator<Item = DirectParent>) -> Self {
        let mut merged: Vec<DirectParent> = Vec::new();
        for entry in entries {
            match merged.iter_mut().find(|p| p.id == entry.id) {
                Some(existing) => existing.parent_of.extend(entry.parent_of),
                None => merged.push(entry),
            }
        }
        Self(merged)
    }

    /// Number of parents.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parents.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `id` is a direct parent.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.0.iter().any(|p| p.id == id)
    }

    /// Look up the edge for `id`.
    pub fn get(&self, id: ResourceId) -> Option<&DirectParent> {
        self.0.iter().find(|p| p.id == id)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DirectParent> {
        self.0.iter()
    }

    /// Parent ids in declaration order.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.0.iter().map(|p| p.id).collect()
    }

    /// Remove the edge to `id`. Returns `true` if it was present.
    pub fn remove(&mut self, id: ResourceId) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p.id != id);
        before != self.0.len()
    }

    /// Keep only the edges matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&DirectParent) -> bool) {
        self.0.retain(keep);
    }

    /// Mutable access for in-place corrections.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DirectParent> {
        self.0.iter_mut()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<DirectParent> {
        self.0
    }
}

impl FromIterator<DirectParent> for DirectParents {
    fn from_iter<I: IntoIterator<Item = DirectParent>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<'a> IntoIterator for &'a DirectParents {
    type Item = &'a DirectParent;
    type IntoIter = std::slice::Iter<'a, DirectParent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DirectParents {
    type Item = DirectParent;
    type IntoIter = std::vec::IntoIter<DirectParent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_keep_first_category_and_merge_annotations() {
        let id = ResourceId::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let parents = DirectParents::from_entries([
            DirectParent::new(id, "collection").on_behalf_of(a),
            DirectParent::new(id, "series").on_behalf_of(b),
        ]);

        assert_eq!(parents.len(), 1);
        let edge = parents.get(id).expect("edge");
        assert_eq!(edge.category.as_str(), "collection");
        assert_eq!(edge.parent_of, BTreeSet::from([a, b]));
    }

    #[test]
    fn test_empty_annotations_are_not_serialized() {
        let parents = DirectParents::from_entries([DirectParent::new(ResourceId::new(), "c")]);
        let json = serde_json::to_value(&parents).expect("serialize");
        assert!(json[0].get("parent_of").is_none());
        let back: DirectParents = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, parents);
    }

    #[test]
    fn test_remove() {
        let keep = ResourceId::new();
        let drop = ResourceId::new();
        let mut parents: DirectParents = [DirectParent::new(keep, "c"), DirectParent::new(drop, "c")]
            .into_iter()
            .collect();
        assert!(parents.remove(drop));
        assert!(!parents.remove(drop));
        assert_eq!(parents.ids(), vec![keep]);
    }
}
