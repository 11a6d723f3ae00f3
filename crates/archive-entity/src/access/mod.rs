//! Access-right values.

pub mod model;

pub use model::{AccessRight, AccessSource, EffectiveAccessRight};
