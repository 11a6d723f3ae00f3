//! Access-right values and their provenance.

use serde::{Deserialize, Serialize};

use archive_core::types::{AccessRightId, ResourceId};

/// An access-right option resolved to its display term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRight {
    /// Option identifier.
    pub id: AccessRightId,
    /// Display term (e.g. `restricted`).
    pub term: String,
}

/// Where an effective access right came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessSource {
    /// Declared on the document itself.
    Own,
    /// Inherited from the nearest declaring ancestor.
    Inherited {
        /// The ancestor that declares the right.
        from: ResourceId,
        /// Its depth in the document's closure.
        depth: u32,
    },
}

/// An access right together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveAccessRight {
    /// The resolved right.
    pub right: AccessRight,
    /// Where it came from.
    pub source: AccessSource,
}
