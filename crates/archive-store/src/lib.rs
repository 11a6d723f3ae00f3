//! # archive-store
//!
//! Collaborator traits consumed by the ancestry engine (resource store,
//! type registry, option resolver) and their implementations:
//!
//! - [`MemoryResourceStore`] for tests and single-node use
//! - [`postgres::PgResourceStore`] backed by PostgreSQL (feature `postgres`)
//! - [`StaticTypeRegistry`] / [`StaticOptionResolver`] loaded from configuration

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod registry;
pub mod traits;

pub use memory::MemoryResourceStore;
pub use registry::{StaticOptionResolver, StaticTypeRegistry};
pub use traits::{OptionResolver, ResourceStore, TypeRegistry};
