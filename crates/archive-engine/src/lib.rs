//! # archive-engine
//!
//! Resource ancestry and access-resolution engine.
//!
//! - [`ancestry`]: transitive closure of a resource's parents
//! - [`validation`]: self-parent, type, and cycle checks plus redundant-parent pruning
//! - [`cascade`]: recomputation of descendants and attached file records, subtree delete
//! - [`access`]: effective access rights
//! - [`memo`]: read-through memoization flushed on structural change
//! - [`engine`]: the [`AncestryEngine`] facade

pub mod access;
pub mod ancestry;
pub mod cascade;
pub mod context;
pub mod engine;
pub mod error;
pub mod memo;
pub mod registry;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use cascade::{CascadeOptions, CascadeReport, DeleteReport};
pub use context::RequestContext;
pub use engine::AncestryEngine;
pub use error::{AncestryError, AncestryResult};
pub use validation::ValidatedParents;
