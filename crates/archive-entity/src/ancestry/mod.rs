//! Parent edges and transitive ancestry.

pub mod ancestor;
pub mod parent;

pub use ancestor::{Ancestor, Ancestry};
pub use parent::{DirectParent, DirectParents};
