//! Category (post type) model.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Slug identifying a resource category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySlug(String);

impl CategorySlug {
    /// Create a slug from any string-like value.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Return the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategorySlug {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl From<String> for CategorySlug {
    fn from(slug: String) -> Self {
        Self(slug)
    }
}

/// A type registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The category slug.
    pub slug: CategorySlug,
    /// Whether a resource of this category may sit under one of the same category.
    pub hierarchical: bool,
    /// Categories accepted as parents.
    pub allowed_parent_categories: BTreeSet<CategorySlug>,
}

impl Category {
    /// Create a category with no accepted parents.
    pub fn new(slug: impl Into<CategorySlug>, hierarchical: bool) -> Self {
        Self {
            slug: slug.into(),
            hierarchical,
            allowed_parent_categories: BTreeSet::new(),
        }
    }

    /// Builder-style helper adding an accepted parent category.
    pub fn allow_parent(mut self, parent: impl Into<CategorySlug>) -> Self {
        self.allowed_parent_categories.insert(parent.into());
        self
    }

    /// Whether a resource of this category may have a parent of `candidate`.
    ///
    /// Same-category nesting needs `hierarchical`; any other category must be
    /// listed in `allowed_parent_categories`.
    pub fn accepts_parent(&self, candidate: &CategorySlug) -> bool {
        if *candidate == self.slug && self.hierarchical {
            return true;
        }
        self.allowed_parent_categories.contains(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_accepts_itself() {
        let collection = Category::new("collection", true);
        assert!(collection.accepts_parent(&"collection".into()));
        assert!(!collection.accepts_parent(&"document".into()));
    }

    #[test]
    fn test_flat_category_needs_explicit_allowance() {
        let document = Category::new("document", false).allow_parent("collection");
        assert!(!document.accepts_parent(&"document".into()));
        assert!(document.accepts_parent(&"collection".into()));
    }

    #[test]
    fn test_self_listed_parent_counts_without_hierarchical() {
        let series = Category::new("series", false).allow_parent("series");
        assert!(series.accepts_parent(&"series".into()));
    }
}
