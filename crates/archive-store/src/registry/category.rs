//! Type registry backed by a fixed category table.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use archive_core::config::registry::RegistryConfig;
use archive_core::result::AppResult;
use archive_entity::category::{Category, CategorySlug};

use crate::traits::TypeRegistry;

/// Type registry holding categories in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTypeRegistry {
    categories: HashMap<CategorySlug, Category>,
}

impl StaticTypeRegistry {
    /// Build from the `[registry]` configuration section.
    pub fn from_config(config: &RegistryConfig) -> Self {
        let categories = config.categories.iter().map(|entry| {
            entry.allowed_parents.iter().fold(
                Category::new(entry.slug.as_str(), entry.hierarchical),
                |category, parent| category.allow_parent(parent.as_str()),
            )
        });
        let registry = Self::with_categories(categories);
        debug!(count = registry.categories.len(), "Loaded category registry");
        registry
    }

    /// Build from explicit categories. Later entries replace earlier ones with the same slug.
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|c| (c.slug.clone(), c))
                .collect(),
        }
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[async_trait]
impl TypeRegistry for StaticTypeRegistry {
    async fn get_category(&self, slug: &CategorySlug) -> AppResult<Option<Category>> {
        Ok(self.categories.get(slug).cloned())
    }
}
