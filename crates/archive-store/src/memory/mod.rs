//! In-memory resource store.

pub mod store;

pub use store::MemoryResourceStore;
