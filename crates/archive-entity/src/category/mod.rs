//! Resource categories (post types).

pub mod model;

pub use model::{Category, CategorySlug};
