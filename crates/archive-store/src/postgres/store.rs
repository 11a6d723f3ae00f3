//! PostgreSQL implementation of [`ResourceStore`].
//!
//! Parent and ancestor lists live in JSONB columns; child and attachment
//! lookups use `@>` containment backed by GIN indexes. Updates are
//! read-modify-write inside a transaction holding a row lock.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use archive_core::error::{AppError, ErrorKind};
use archive_core::result::AppResult;
use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::file_record::{FileRecord, FileRecordPatch};
use archive_entity::resource::{Resource, ResourceFilter, ResourcePatch};

use super::rows::{FileRecordRow, ResourceRow, id_containment};
use crate::traits::ResourceStore;

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Resource store backed by the `resources` and `file_records` tables.
#[derive(Debug, Clone)]
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn get_resource(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>("SELECT * FROM resources WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find resource", e))?;
        row.map(Resource::try_from).transpose()
    }

    async fn find_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT * FROM resources WHERE TRUE");

        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.as_str().to_string());
        }
        if let Some(parent) = filter.parent {
            query
                .push(" AND direct_parents @> ")
                .push_bind(Json(id_containment(parent)));
        }
        if let Some(ancestor) = filter.ancestor {
            query
                .push(" AND ancestors @> ")
                .push_bind(Json(id_containment(ancestor)));
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY id ASC");

        let rows = query
            .build_query_as::<ResourceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query resources", e))?;

        rows.into_iter().map(Resource::try_from).collect()
    }

    async fn insert_resource(&self, resource: &Resource) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO resources \
             (id, category, direct_parents, ancestors, access_right, status, attached_files, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(resource.id.into_uuid())
        .bind(resource.category.as_str())
        .bind(Json(&resource.direct_parents))
        .bind(Json(&resource.ancestors))
        .bind(resource.access_right.map(|r| r.into_uuid()))
        .bind(resource.status.as_str())
        .bind(Json(&resource.attached_files))
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("Resource {} already exists", resource.id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert resource", e)
            }
        })?;
        Ok(())
    }

    async fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> AppResult<Resource> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        let row = sqlx::query_as::<_, ResourceRow>("SELECT * FROM resources WHERE id = $1 FOR UPDATE")
            .bind(id.into_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock resource", e))?
            .ok_or_else(|| AppError::not_found(format!("Resource {id} not found")))?;

        let mut resource = Resource::try_from(row)?;
        resource.apply(patch);

        sqlx::query(
            "UPDATE resources SET direct_parents = $2, ancestors = $3, access_right = $4, \
             status = $5, attached_files = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(id.into_uuid())
        .bind(Json(&resource.direct_parents))
        .bind(Json(&resource.ancestors))
        .bind(resource.access_right.map(|r| r.into_uuid()))
        .bind(resource.status.as_str())
        .bind(Json(&resource.attached_files))
        .bind(resource.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update resource", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit resource update", e))?;

        Ok(resource)
    }

    async fn delete_resource(&self, id: ResourceId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete resource", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_file_record(&self, id: FileRecordId) -> AppResult<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRecordRow>("SELECT * FROM file_records WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file record", e))?;
        Ok(row.map(FileRecord::from))
    }

    async fn find_file_records_attached_to(&self, resource: ResourceId) -> AppResult<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRecordRow>(
            "SELECT * FROM file_records WHERE direct_parents @> $1 ORDER BY id ASC",
        )
        .bind(Json(id_containment(resource)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find attached file records", e)
        })?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn list_file_records(&self) -> AppResult<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRecordRow>("SELECT * FROM file_records ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list file records", e))?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_records \
             (id, direct_parents, ancestors, access_right, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.into_uuid())
        .bind(Json(&record.direct_parents))
        .bind(Json(&record.ancestors))
        .bind(record.access_right.map(|r| r.into_uuid()))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("File record {} already exists", record.id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert file record", e)
            }
        })?;
        Ok(())
    }

    async fn update_file_record(
        &self,
        id: FileRecordId,
        patch: &FileRecordPatch,
    ) -> AppResult<FileRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        let row = sqlx::query_as::<_, FileRecordRow>(
            "SELECT * FROM file_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id.into_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock file record", e))?
        .ok_or_else(|| AppError::not_found(format!("File record {id} not found")))?;

        let mut record = FileRecord::from(row);
        record.apply(patch);

        sqlx::query(
            "UPDATE file_records SET direct_parents = $2, ancestors = $3, access_right = $4, \
             updated_at = $5 WHERE id = $1",
        )
        .bind(id.into_uuid())
        .bind(Json(&record.direct_parents))
        .bind(Json(&record.ancestors))
        .bind(record.access_right.map(|r| r.into_uuid()))
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file record", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file record update", e)
        })?;

        Ok(record)
    }

    async fn delete_file_record(&self, id: FileRecordId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM file_records WHERE id = $1")
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete file record", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
