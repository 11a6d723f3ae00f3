//! Collaborator interfaces consumed by the ancestry engine.
//!
//! Each trait is object safe so the engine can hold `Arc<dyn ...>` handles
//! injected at construction.

use async_trait::async_trait;

use archive_core::result::AppResult;
use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_entity::access::AccessRight;
use archive_entity::category::{Category, CategorySlug};
use archive_entity::file_record::{FileRecord, FileRecordPatch};
use archive_entity::resource::{Resource, ResourceFilter, ResourcePatch};

/// Durable keyed storage for resource and file-record documents.
#[async_trait]
pub trait ResourceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a resource by id.
    async fn get_resource(&self, id: ResourceId) -> AppResult<Option<Resource>>;

    /// Fetch every resource matching `filter`.
    async fn find_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>>;

    /// Resources whose direct parents reference `id`.
    async fn find_children(&self, id: ResourceId) -> AppResult<Vec<Resource>> {
        self.find_resources(&ResourceFilter::children_of(id)).await
    }

    /// Insert a new resource. Fails with a conflict if the id exists.
    async fn insert_resource(&self, resource: &Resource) -> AppResult<()>;

    /// Apply a patch and return the updated resource. Fails with not-found if missing.
    async fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> AppResult<Resource>;

    /// Delete a resource. Returns `true` if it existed.
    async fn delete_resource(&self, id: ResourceId) -> AppResult<bool>;

    /// Fetch a file record by id.
    async fn get_file_record(&self, id: FileRecordId) -> AppResult<Option<FileRecord>>;

    /// File records whose direct parents reference `resource`.
    async fn find_file_records_attached_to(&self, resource: ResourceId) -> AppResult<Vec<FileRecord>>;

    /// Every file record in the store.
    async fn list_file_records(&self) -> AppResult<Vec<FileRecord>>;

    /// Insert a new file record. Fails with a conflict if the id exists.
    async fn insert_file_record(&self, record: &FileRecord) -> AppResult<()>;

    /// Apply a patch and return the updated record. Fails with not-found if missing.
    async fn update_file_record(
        &self,
        id: FileRecordId,
        patch: &FileRecordPatch,
    ) -> AppResult<FileRecord>;

    /// Delete a file record. Returns `true` if it existed.
    async fn delete_file_record(&self, id: FileRecordId) -> AppResult<bool>;
}

/// Maps a category slug to its nesting rules.
#[async_trait]
pub trait TypeRegistry: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a category. `None` when the slug is unknown.
    async fn get_category(&self, slug: &CategorySlug) -> AppResult<Option<Category>>;
}

/// Maps an access-right identifier to its display term.
#[async_trait]
pub trait OptionResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve an option. `None` when the id is unknown.
    async fn resolve_option(&self, id: AccessRightId) -> AppResult<Option<AccessRight>>;
}
