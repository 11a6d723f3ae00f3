//! Row types mapping the `resources` and `file_records` tables.
//!
//! Structural fields are stored as JSONB documents and decoded through
//! [`sqlx::types::Json`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use archive_core::error::AppError;
use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_entity::ancestry::{Ancestry, DirectParents};
use archive_entity::category::CategorySlug;
use archive_entity::file_record::FileRecord;
use archive_entity::resource::{Resource, ResourceStatus};

/// A row of the `resources` table.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub category: String,
    pub direct_parents: Json<DirectParents>,
    pub ancestors: Json<Ancestry>,
    pub access_right: Option<Uuid>,
    pub status: String,
    pub attached_files: Json<BTreeSet<FileRecordId>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = AppError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            id: ResourceId::from_uuid(row.id),
            category: CategorySlug::new(row.category),
            direct_parents: row.direct_parents.0,
            ancestors: row.ancestors.0,
            access_right: row.access_right.map(AccessRightId::from_uuid),
            status: row.status.parse::<ResourceStatus>()?,
            attached_files: row.attached_files.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `file_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct FileRecordRow {
    pub id: Uuid,
    pub direct_parents: Json<DirectParents>,
    pub ancestors: Json<Ancestry>,
    pub access_right: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecordRow> for FileRecord {
    fn from(row: FileRecordRow) -> Self {
        FileRecord {
            id: FileRecordId::from_uuid(row.id),
            direct_parents: row.direct_parents.0,
            ancestors: row.ancestors.0,
            access_right: row.access_right.map(AccessRightId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// JSONB containment filter matching documents whose array holds an entry with `id`.
pub fn id_containment(id: ResourceId) -> serde_json::Value {
    serde_json::json!([{ "id": id }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_row_conversion() {
        let now = Utc::now();
        let row = ResourceRow {
            id: Uuid::new_v4(),
            category: "collection".to_string(),
            direct_parents: Json(DirectParents::new()),
            ancestors: Json(Ancestry::new()),
            access_right: None,
            status: "published".to_string(),
            attached_files: Json(BTreeSet::new()),
            created_at: now,
            updated_at: now,
        };
        let resource = Resource::try_from(row).unwrap();
        assert_eq!(resource.status, ResourceStatus::Published);
        assert_eq!(resource.category.as_str(), "collection");
        assert!(resource.is_root());
    }

    #[test]
    fn test_bad_status_is_rejected() {
        let now = Utc::now();
        let row = ResourceRow {
            id: Uuid::new_v4(),
            category: "collection".to_string(),
            direct_parents: Json(DirectParents::new()),
            ancestors: Json(Ancestry::new()),
            access_right: None,
            status: "archived".to_string(),
            attached_files: Json(BTreeSet::new()),
            created_at: now,
            updated_at: now,
        };
        assert!(Resource::try_from(row).is_err());
    }

    #[test]
    fn test_id_containment_shape() {
        let id = ResourceId::new();
        let doc = id_containment(id);
        assert_eq!(doc[0]["id"], serde_json::json!(id.to_string()));
    }
}
