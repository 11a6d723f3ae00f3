//! Memoized type-registry and option-resolver lookups.

use std::sync::Arc;

use archive_core::types::AccessRightId;
use archive_entity::access::AccessRight;
use archive_entity::category::{Category, CategorySlug};
use archive_store::{OptionResolver, TypeRegistry};

use crate::error::{AncestryError, AncestryResult};
use crate::memo::{MemoCache, MemoOperation};

/// Read-through front for the type registry and option resolver.
#[derive(Debug, Clone)]
pub struct RegistryLookup {
    types: Arc<dyn TypeRegistry>,
    options: Arc<dyn OptionResolver>,
    memo: MemoCache,
}

impl RegistryLookup {
    /// Creates a new lookup.
    pub fn new(
        types: Arc<dyn TypeRegistry>,
        options: Arc<dyn OptionResolver>,
        memo: MemoCache,
    ) -> Self {
        Self {
            types,
            options,
            memo,
        }
    }

    /// Category rules for `slug`, `None` if unknown.
    pub async fn category(&self, slug: &CategorySlug) -> AncestryResult<Option<Category>> {
        let types = &self.types;
        self.memo
            .get_or_compute(MemoOperation::Category, slug.as_str(), || async move {
                types.get_category(slug).await.map_err(AncestryError::from)
            })
            .await
    }

    /// Access-right option for `id`, `None` if unknown.
    pub async fn option(&self, id: AccessRightId) -> AncestryResult<Option<AccessRight>> {
        let options = &self.options;
        self.memo
            .get_or_compute(MemoOperation::OptionTerm, &id.to_string(), || async move {
                options.resolve_option(id).await.map_err(AncestryError::from)
            })
            .await
    }

    /// Whether a resource of `category` may have a parent of `candidate`.
    ///
    /// An unknown child category accepts nothing.
    pub async fn is_compatible(
        &self,
        category: &CategorySlug,
        candidate: &CategorySlug,
    ) -> AncestryResult<bool> {
        Ok(self
            .category(category)
            .await?
            .is_some_and(|c| c.accepts_parent(candidate)))
    }
}
