//! In-memory resource store using a Tokio lock for single-node deployments.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use archive_core::error::AppError;
use archive_core::result::AppResult;
use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::file_record::{FileRecord, FileRecordPatch};
use archive_entity::resource::{Resource, ResourceFilter, ResourcePatch};

use crate::traits::ResourceStore;

/// Internal state for the memory store.
#[derive(Debug, Default)]
struct InnerState {
    /// Resources keyed by id.
    resources: BTreeMap<ResourceId, Resource>,
    /// File records keyed by id.
    files: BTreeMap<FileRecordId, FileRecord>,
}

/// In-memory resource store.
///
/// Iteration order is by id, so query results are deterministic. Suitable
/// for tests and single-node tooling only.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceStore {
    /// Protected inner state.
    state: Arc<RwLock<InnerState>>,
    /// Number of successful update calls (resources and file records).
    writes: Arc<AtomicU64>,
}

impl MemoryResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of update calls that changed a stored document.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored resources.
    pub async fn resource_count(&self) -> usize {
        self.state.read().await.resources.len()
    }

    /// Number of stored file records.
    pub async fn file_record_count(&self) -> usize {
        self.state.read().await.files.len()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get_resource(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        Ok(self.state.read().await.resources.get(&id).cloned())
    }

    async fn find_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn insert_resource(&self, resource: &Resource) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.resources.contains_key(&resource.id) {
            return Err(AppError::conflict(format!(
                "Resource {} already exists",
                resource.id
            )));
        }
        state.resources.insert(resource.id, resource.clone());
        debug!(resource_id = %resource.id, "Inserted resource");
        Ok(())
    }

    async fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> AppResult<Resource> {
        let mut state = self.state.write().await;
        let resource = state
            .resources
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Resource {id} not found")))?;
        resource.apply(patch);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(resource.clone())
    }

    async fn delete_resource(&self, id: ResourceId) -> AppResult<bool> {
        Ok(self.state.write().await.resources.remove(&id).is_some())
    }

    async fn get_file_record(&self, id: FileRecordId) -> AppResult<Option<FileRecord>> {
        Ok(self.state.read().await.files.get(&id).cloned())
    }

    async fn find_file_records_attached_to(&self, resource: ResourceId) -> AppResult<Vec<FileRecord>> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.is_attached_to(resource))
            .cloned()
            .collect())
    }

    async fn list_file_records(&self) -> AppResult<Vec<FileRecord>> {
        Ok(self.state.read().await.files.values().cloned().collect())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.files.contains_key(&record.id) {
            return Err(AppError::conflict(format!(
                "File record {} already exists",
                record.id
            )));
        }
        state.files.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_file_record(
        &self,
        id: FileRecordId,
        patch: &FileRecordPatch,
    ) -> AppResult<FileRecord> {
        let mut state = self.state.write().await;
        let record = state
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File record {id} not found")))?;
        record.apply(patch);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete_file_record(&self, id: FileRecordId) -> AppResult<bool> {
        Ok(self.state.write().await.files.remove(&id).is_some())
    }
}
