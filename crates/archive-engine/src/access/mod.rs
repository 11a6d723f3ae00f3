//! Effective access-right resolution.

pub mod resolver;

pub use resolver::AccessResolver;
