//! Read-through memoization in front of the resolvers and registry lookups.

pub mod cache;
pub mod operation;

pub use cache::{MemoCache, MemoStats};
pub use operation::MemoOperation;
