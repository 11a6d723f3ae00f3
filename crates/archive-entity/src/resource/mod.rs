//! Resource entity and status.

pub mod model;
pub mod status;

pub use model::{NewResource, Resource, ResourceFilter, ResourcePatch};
pub use status::ResourceStatus;
