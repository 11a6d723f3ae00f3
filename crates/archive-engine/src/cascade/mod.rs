//! Propagation of structural changes to descendants and attached files.

pub mod delete;
pub mod options;
pub mod report;
pub mod updater;

pub use options::CascadeOptions;
pub use report::{CascadeReport, DeleteReport};
pub use updater::CascadeUpdater;
