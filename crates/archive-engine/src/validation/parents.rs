//! Validation of proposed direct-parent lists.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. self-parentage
//! 2. existence and category compatibility of each parent
//! 3. cycles through the proposed parents
//! 4. pruning of parents already reachable through another parent
//!
//! Nothing is written. The closure computed for the pruned list is returned
//! with it so callers persist both without a second traversal.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::ancestry::{Ancestry, DirectParents};
use archive_entity::category::CategorySlug;

use crate::ancestry::AncestryResolver;
use crate::ancestry::graph::ParentGraph;
use crate::error::{AncestryError, AncestryResult};
use crate::registry::RegistryLookup;

/// A parent list that passed validation, with its closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedParents {
    /// Pruned direct parents carrying their stored categories.
    pub parents: DirectParents,
    /// Closure for `parents`.
    pub ancestors: Ancestry,
    /// Ids dropped as redundant.
    pub pruned: Vec<ResourceId>,
}

/// Validates proposed direct parents for resources and file records.
#[derive(Debug, Clone)]
pub struct ParentValidator {
    resolver: AncestryResolver,
    registry: RegistryLookup,
}

impl ParentValidator {
    /// Creates a new validator.
    pub fn new(resolver: AncestryResolver, registry: RegistryLookup) -> Self {
        Self { resolver, registry }
    }

    /// Validate `proposed` as the direct parents of a resource of `category`.
    ///
    /// `resource_id` is `None` for a resource not yet assigned an id.
    pub async fn validate_parents(
        &self,
        resource_id: Option<ResourceId>,
        category: &CategorySlug,
        proposed: DirectParents,
    ) -> AncestryResult<ValidatedParents> {
        let mut proposed = DirectParents::from_entries(proposed);

        if let Some(id) = resource_id.filter(|id| proposed.contains(*id)) {
            return Err(AncestryError::SelfParent(id));
        }

        if proposed.is_empty() {
            return Ok(ValidatedParents {
                parents: proposed,
                ancestors: Ancestry::new(),
                pruned: Vec::new(),
            });
        }

        let rules = self
            .registry
            .category(category)
            .await?
            .ok_or_else(|| AncestryError::UnknownCategory(category.clone()))?;

        let graph = self.resolver.graph(resource_id, &proposed).await?;

        for parent in proposed.iter_mut() {
            let Some(stored) = graph.category_of(parent.id) else {
                return Err(AncestryError::resource_not_found(
                    parent.id,
                    resource_id.map(|id| id.into_uuid()),
                ));
            };
            if parent.category != *stored {
                debug!(
                    parent_id = %parent.id,
                    declared = %parent.category,
                    stored = %stored,
                    "Correcting declared parent category"
                );
                parent.category = stored.clone();
            }
            if !rules.accepts_parent(&parent.category) {
                return Err(AncestryError::TypeIncompatible {
                    child_category: category.clone(),
                    parent: parent.id,
                    parent_category: parent.category.clone(),
                });
            }
        }

        graph.check_acyclic()?;

        let marker = resource_id.map(|id| id.into_uuid()).unwrap_or_else(Uuid::nil);
        Ok(prune(&graph, proposed, marker))
    }

    /// Validate `proposed` as the direct parents of a file record.
    ///
    /// File records have no category rules: every parent must exist and
    /// duplicates merge. Attachments are explicit, so none is pruned even
    /// when one parent sits above another.
    pub async fn validate_file_parents(
        &self,
        file_id: FileRecordId,
        proposed: DirectParents,
    ) -> AncestryResult<ValidatedParents> {
        let mut proposed = DirectParents::from_entries(proposed);
        if proposed.is_empty() {
            return Ok(ValidatedParents {
                parents: proposed,
                ancestors: Ancestry::new(),
                pruned: Vec::new(),
            });
        }

        let graph = self.resolver.file_graph(file_id, &proposed).await?;
        for parent in proposed.iter_mut() {
            if let Some(stored) = graph.category_of(parent.id) {
                if parent.category != *stored {
                    parent.category = stored.clone();
                }
            }
        }
        graph.check_acyclic()?;

        Ok(ValidatedParents {
            ancestors: graph.closure(),
            parents: proposed,
            pruned: Vec::new(),
        })
    }

    /// Whether a resource of `category` may have a parent of `candidate`.
    pub async fn is_compatible_parent_category(
        &self,
        category: &CategorySlug,
        candidate: &CategorySlug,
    ) -> AncestryResult<bool> {
        self.registry.is_compatible(category, candidate).await
    }
}

/// Drop every parent reachable through another parent.
///
/// A depth-1 ancestor whose descendant set holds anything besides the origin
/// is also an ancestor of some other proposed parent.
fn prune(graph: &ParentGraph, mut parents: DirectParents, marker: Uuid) -> ValidatedParents {
    let full = graph.closure();
    let pruned: Vec<ResourceId> = parents
        .iter()
        .filter(|p| {
            full.get(p.id)
                .is_some_and(|a| a.descendant_ids.iter().any(|d| *d != marker))
        })
        .map(|p| p.id)
        .collect();

    if pruned.is_empty() {
        return ValidatedParents {
            parents,
            ancestors: full,
            pruned,
        };
    }

    debug!(pruned = ?pruned, "Pruned redundant parents");
    parents.retain(|p| !pruned.contains(&p.id));
    let ancestors = graph.closure_for(&parents.ids());
    ValidatedParents {
        parents,
        ancestors,
        pruned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_entity::ancestry::DirectParent;
    use crate::testing::{Fixture, insert_resource};

    fn validator(fx: &Fixture) -> ParentValidator {
        ParentValidator::new(fx.resolver(), fx.registry())
    }

    #[tokio::test]
    async fn test_self_parent_is_rejected() {
        let fx = Fixture::new();
        let doc = insert_resource(&fx.store, "document", &[]).await;
        let proposed = DirectParents::from_entries([DirectParent::new(doc, "document")]);

        let err = validator(&fx)
            .validate_parents(Some(doc), &"document".into(), proposed)
            .await
            .unwrap_err();
        assert!(matches!(err, AncestryError::SelfParent(id) if id == doc));
    }

    #[tokio::test]
    async fn test_type_rules() {
        let fx = Fixture::new();
        let folder = insert_resource(&fx.store, "collection", &[]).await;
        let doc = insert_resource(&fx.store, "document", &[folder]).await;
        let v = validator(&fx);

        // document under document: not hierarchical, not allowed
        let err = v
            .validate_parents(None, &"document".into(), fx.parents(&[doc]).await)
            .await
            .unwrap_err();
        assert!(matches!(err, AncestryError::TypeIncompatible { parent, .. } if parent == doc));

        // collection under collection: hierarchical
        assert!(
            v.validate_parents(None, &"collection".into(), fx.parents(&[folder]).await)
                .await
                .is_ok()
        );

        // collection under document: not listed
        assert!(
            v.validate_parents(None, &"collection".into(), fx.parents(&[doc]).await)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_declared_category_is_corrected() {
        let fx = Fixture::new();
        let folder = insert_resource(&fx.store, "collection", &[]).await;
        let proposed = DirectParents::from_entries([DirectParent::new(folder, "misfiled")]);

        let validated = validator(&fx)
            .validate_parents(None, &"document".into(), proposed)
            .await
            .unwrap();
        assert_eq!(
            validated.parents.get(folder).unwrap().category.as_str(),
            "collection"
        );
    }

    #[tokio::test]
    async fn test_unknown_child_category() {
        let fx = Fixture::new();
        let folder = insert_resource(&fx.store, "collection", &[]).await;
        let err = validator(&fx)
            .validate_parents(None, &"sculpture".into(), fx.parents(&[folder]).await)
            .await
            .unwrap_err();
        assert!(matches!(err, AncestryError::UnknownCategory(_)));
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_dropped() {
        let fx = Fixture::new();
        let ghost = ResourceId::new();
        let proposed = DirectParents::from_entries([DirectParent::new(ghost, "collection")]);
        let err = validator(&fx)
            .validate_parents(None, &"document".into(), proposed)
            .await
            .unwrap_err();
        assert!(matches!(err, AncestryError::NotFound { id, .. } if id == ghost.into_uuid()));
    }

    #[tokio::test]
    async fn test_redundant_parent_is_pruned() {
        let fx = Fixture::new();
        let outer = insert_resource(&fx.store, "collection", &[]).await;
        let inner = insert_resource(&fx.store, "collection", &[outer]).await;

        let validated = validator(&fx)
            .validate_parents(None, &"document".into(), fx.parents(&[outer, inner]).await)
            .await
            .unwrap();
        assert_eq!(validated.parents.ids(), vec![inner]);
        assert_eq!(validated.pruned, vec![outer]);
        assert_eq!(validated.ancestors.get(inner).unwrap().depth, 1);
        assert_eq!(validated.ancestors.get(outer).unwrap().depth, 2);
    }

    #[tokio::test]
    async fn test_duplicates_merge_parent_of() {
        let fx = Fixture::new();
        let folder = insert_resource(&fx.store, "collection", &[]).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let proposed = DirectParents::from_entries([
            DirectParent::new(folder, "collection").on_behalf_of(a),
            DirectParent::new(folder, "collection").on_behalf_of(b),
        ]);

        let validated = validator(&fx)
            .validate_parents(None, &"document".into(), proposed)
            .await
            .unwrap();
        assert_eq!(validated.parents.len(), 1);
        let entry = validated.parents.get(folder).unwrap();
        assert!(entry.parent_of.contains(&a) && entry.parent_of.contains(&b));
    }

    #[tokio::test]
    async fn test_file_parents_skip_type_rules_and_keep_every_attachment() {
        let fx = Fixture::new();
        let folder = insert_resource(&fx.store, "collection", &[]).await;
        let doc = insert_resource(&fx.store, "document", &[folder]).await;
        let file = FileRecordId::new();

        let validated = validator(&fx)
            .validate_file_parents(file, fx.parents(&[doc, folder, doc]).await)
            .await
            .unwrap();
        assert_eq!(validated.parents.ids(), vec![doc, folder]);
        assert!(validated.pruned.is_empty());

        let via_doc = validated.ancestors.get(doc).unwrap();
        assert_eq!(via_doc.depth, 1);
        assert!(via_doc.descendant_ids.contains(file.as_uuid()));

        // Reached directly and through doc; the direct edge sets the depth.
        let via_folder = validated.ancestors.get(folder).unwrap();
        assert_eq!(via_folder.depth, 1);
        assert!(via_folder.descendant_ids.contains(file.as_uuid()));
        assert!(via_folder.descendant_ids.contains(doc.as_uuid()));
    }

    #[tokio::test]
    async fn test_compatibility_with_unknown_child_is_false() {
        let fx = Fixture::new();
        let v = validator(&fx);
        assert!(
            v.is_compatible_parent_category(&"document".into(), &"collection".into())
                .await
                .unwrap()
        );
        assert!(
            !v.is_compatible_parent_category(&"sculpture".into(), &"collection".into())
                .await
                .unwrap()
        );
    }
}
