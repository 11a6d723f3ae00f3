//! Direct-parent validation and pruning.

pub mod parents;

pub use parents::{ParentValidator, ValidatedParents};
