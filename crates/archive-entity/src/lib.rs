//! # archive-entity
//!
//! Domain entity models for the archive. Every struct in this crate
//! represents a stored document or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod access;
pub mod ancestry;
pub mod category;
pub mod file_record;
pub mod resource;
