//! File record entity.

pub mod model;

pub use model::{FileRecord, FileRecordPatch, NewFileRecord};
