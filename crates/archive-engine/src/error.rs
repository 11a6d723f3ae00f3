//! Ancestry engine errors.

use uuid::Uuid;

use archive_core::error::{AppError, ErrorKind};
use archive_core::types::ResourceId;
use archive_entity::category::CategorySlug;

/// Result alias for engine operations.
pub type AncestryResult<T> = Result<T, AncestryError>;

/// Failures raised while validating, resolving, or cascading ancestry.
///
/// Validation variants are returned before anything is written.
/// `CascadeIncomplete` is raised after the direct node's update already
/// committed; the cascade is safe to re-run.
#[derive(Debug, thiserror::Error)]
pub enum AncestryError {
    /// A resource listed itself as a parent.
    #[error("Resource {0} cannot be its own parent")]
    SelfParent(ResourceId),

    /// Accepting the proposed parents would close a loop.
    #[error("Cycle detected: {}", format_path(.path))]
    Cycle {
        /// The loop, starting and ending at the same id.
        path: Vec<ResourceId>,
    },

    /// A parent's category is not accepted by the child's category.
    #[error(
        "Category '{child_category}' does not accept parent {parent} of category '{parent_category}'"
    )]
    TypeIncompatible {
        /// The child's category.
        child_category: CategorySlug,
        /// The rejected parent.
        parent: ResourceId,
        /// The parent's stored category.
        parent_category: CategorySlug,
    },

    /// The type registry does not know the category.
    #[error("Unknown category '{0}'")]
    UnknownCategory(CategorySlug),

    /// A referenced document does not exist.
    #[error("{entity} {id} not found{}", referenced_suffix(.referenced_by))]
    NotFound {
        /// What kind of document was looked up.
        entity: &'static str,
        /// The missing id.
        id: Uuid,
        /// The document holding the dangling reference, if any.
        referenced_by: Option<Uuid>,
    },

    /// A cascade stopped before visiting every descendant.
    #[error(
        "Cascade from {root} incomplete after {processed} nodes, {remaining} still queued: {reason}"
    )]
    CascadeIncomplete {
        /// Where the cascade started.
        root: ResourceId,
        /// Nodes processed before stopping.
        processed: usize,
        /// Nodes still queued.
        remaining: usize,
        /// Why it stopped.
        reason: String,
    },

    /// A traversal fetched more nodes than allowed.
    #[error("Ancestry traversal exceeded {limit} nodes")]
    TraversalLimit {
        /// The configured limit.
        limit: usize,
    },

    /// Store or cache failure.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl AncestryError {
    /// A missing resource, optionally naming the child that points at it.
    pub fn resource_not_found(id: ResourceId, referenced_by: Option<Uuid>) -> Self {
        Self::NotFound {
            entity: "Resource",
            id: id.into_uuid(),
            referenced_by,
        }
    }

    /// A missing file record.
    pub fn file_not_found(id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity: "File record",
            id: id.into(),
            referenced_by: None,
        }
    }

    /// A missing access-right option.
    pub fn option_not_found(id: impl Into<Uuid>, referenced_by: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity: "Access right",
            id: id.into(),
            referenced_by: Some(referenced_by.into()),
        }
    }

    /// Whether re-running the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CascadeIncomplete { .. })
    }

    /// The workspace error kind this maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelfParent(_)
            | Self::TypeIncompatible { .. }
            | Self::UnknownCategory(_)
            | Self::TraversalLimit { .. } => ErrorKind::Validation,
            Self::Cycle { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CascadeIncomplete { .. } => ErrorKind::Incomplete,
            Self::Store(e) => e.kind,
        }
    }
}

impl From<AncestryError> for AppError {
    fn from(err: AncestryError) -> Self {
        match err {
            AncestryError::Store(inner) => inner,
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

fn format_path(path: &[ResourceId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn referenced_suffix(referenced_by: &Option<Uuid>) -> String {
    referenced_by
        .map(|r| format!(" (referenced by {r})"))
        .unwrap_or_default()
}
