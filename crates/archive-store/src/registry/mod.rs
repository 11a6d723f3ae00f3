//! Configuration-backed type registry and option resolver.

pub mod category;
pub mod options;

pub use category::StaticTypeRegistry;
pub use options::StaticOptionResolver;
