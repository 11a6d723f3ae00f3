//! Category and access-right option tables.
//!
//! These back the static type registry and option resolver used when no
//! external registry service is wired in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category and access-right definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Known resource categories.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Known access-right options.
    #[serde(default)]
    pub access_rights: Vec<AccessRightConfig>,
}

/// A single category entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category slug (post type).
    pub slug: String,
    /// Whether resources of this category may nest under the same category.
    #[serde(default)]
    pub hierarchical: bool,
    /// Slugs of categories this category accepts as parents.
    #[serde(default)]
    pub allowed_parents: Vec<String>,
}

/// A single access-right option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRightConfig {
    /// Option identifier.
    pub id: Uuid,
    /// Display term.
    pub term: String,
}
