//! Transitive ancestor resolution.

pub(crate) mod graph;
pub mod resolver;

pub use resolver::AncestryResolver;
