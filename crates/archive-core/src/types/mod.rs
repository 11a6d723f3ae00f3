//! Core type definitions used across the archive workspace.

pub mod id;

pub use id::*;
