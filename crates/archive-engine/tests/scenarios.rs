//! End-to-end engine behaviour over the in-memory store.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use archive_core::config::ancestry::AncestryConfig;
use archive_core::error::AppError;
use archive_core::events::AncestryEvent;
use archive_core::result::AppResult;
use archive_core::types::{FileRecordId, ResourceId};
use archive_engine::{AncestryError, CascadeOptions};
use archive_entity::access::AccessSource;
use archive_entity::ancestry::{Ancestry, DirectParent, DirectParents};
use archive_entity::file_record::{FileRecord, FileRecordPatch, NewFileRecord};
use archive_entity::resource::{NewResource, Resource, ResourceFilter, ResourcePatch};
use archive_store::{MemoryResourceStore, ResourceStore};

use common::Harness;

async fn stored(h: &Harness, id: ResourceId) -> Resource {
    h.store.get_resource(id).await.unwrap().unwrap()
}

async fn stored_file(h: &Harness, id: FileRecordId) -> FileRecord {
    h.store.get_file_record(id).await.unwrap().unwrap()
}

// ── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_document_inherits_from_folder() {
    let h = Harness::new().await;
    let folder1 = h
        .engine
        .create_resource(
            &h.ctx,
            NewResource::new("collection").with_access_right(h.restricted.id),
        )
        .await
        .unwrap()
        .id;
    let doc1 = h.create("document", &[folder1]).await;

    let ancestors = h.engine.resolve_ancestors(doc1).await.unwrap();
    assert_eq!(ancestors.ids(), vec![folder1]);
    assert_eq!(ancestors.get(folder1).unwrap().depth, 1);
    assert_eq!(stored(&h, doc1).await.ancestors, ancestors);

    let right = h.engine.resolve_access_right(doc1).await.unwrap();
    assert_eq!(right.map(|r| r.term), Some("restricted".to_string()));
}

#[tokio::test]
async fn test_self_parent_is_rejected_before_write() {
    let h = Harness::new().await;
    let doc2 = h.create("document", &[]).await;
    let writes = h.store.write_count();

    let proposed = DirectParents::from_entries([DirectParent::new(doc2, "document")]);
    let err = h.engine.set_parents(&h.ctx, doc2, proposed).await.unwrap_err();

    assert!(matches!(err, AncestryError::SelfParent(id) if id == doc2));
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn test_cycle_is_rejected() {
    let h = Harness::new().await;
    let folder1 = h.create("collection", &[]).await;
    let folder2 = h.create("collection", &[folder1]).await;

    let proposed = h.parents(&[folder2]).await;
    let err = h
        .engine
        .set_parents(&h.ctx, folder1, proposed)
        .await
        .unwrap_err();

    match err {
        AncestryError::Cycle { path } => {
            assert_eq!(path.first(), Some(&folder1));
            assert_eq!(path.last(), Some(&folder1));
            assert!(path.contains(&folder2));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(stored(&h, folder1).await.direct_parents.is_empty());
}

#[tokio::test]
async fn test_redundant_parent_is_pruned_on_create() {
    let h = Harness::new().await;
    let folder1 = h.create("collection", &[]).await;
    let folder2 = h.create("collection", &[folder1]).await;
    let doc3 = h.create("document", &[folder1, folder2]).await;

    let doc = stored(&h, doc3).await;
    assert_eq!(doc.direct_parents.ids(), vec![folder2]);
    assert_eq!(doc.ancestors.ids(), vec![folder2, folder1]);
    assert_eq!(doc.ancestors.get(folder1).unwrap().depth, 2);
}

#[tokio::test]
async fn test_delete_subtree_removes_descendants_and_orphans() {
    let h = Harness::new().await;
    let folder1 = h.create("collection", &[]).await;
    let sub = h.create("collection", &[folder1]).await;
    let doc1 = h.create("document", &[folder1]).await;
    let deep = h.create("document", &[sub]).await;
    let elsewhere = h.create("collection", &[]).await;

    let only_doc1 = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[doc1]).await))
        .await
        .unwrap()
        .id;
    let shared = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[deep, elsewhere]).await))
        .await
        .unwrap()
        .id;

    let report = h.engine.delete_subtree(&h.ctx, folder1).await.unwrap();

    assert_eq!(report.resources_deleted, 4);
    assert_eq!(report.files_deleted, 1);
    assert_eq!(report.files_detached, 1);
    for id in [folder1, sub, doc1, deep] {
        assert!(h.store.get_resource(id).await.unwrap().is_none());
    }
    assert!(h.store.get_resource(elsewhere).await.unwrap().is_some());
    assert!(h.store.get_file_record(only_doc1).await.unwrap().is_none());

    let survivor = stored_file(&h, shared).await;
    assert_eq!(survivor.direct_parents.ids(), vec![elsewhere]);
    assert_eq!(survivor.ancestors.ids(), vec![elsewhere]);
}

#[tokio::test]
async fn test_file_under_folder_and_its_document_survives_document_delete() {
    let h = Harness::new().await;
    let folder = h.create("collection", &[]).await;
    let doc = h.create("document", &[folder]).await;

    let file = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[folder, doc]).await))
        .await
        .unwrap();
    assert_eq!(file.direct_parents.ids(), vec![folder, doc]);
    assert_eq!(file.ancestors.get(folder).unwrap().depth, 1);
    assert_eq!(file.ancestors.get(doc).unwrap().depth, 1);
    assert!(stored(&h, folder).await.attached_files.contains(&file.id));
    assert!(stored(&h, doc).await.attached_files.contains(&file.id));

    let report = h.engine.delete_subtree(&h.ctx, doc).await.unwrap();
    assert_eq!(report.files_deleted, 0);
    assert_eq!(report.files_detached, 1);

    let survivor = stored_file(&h, file.id).await;
    assert_eq!(survivor.direct_parents.ids(), vec![folder]);
    assert_eq!(survivor.ancestors.ids(), vec![folder]);
    assert!(stored(&h, folder).await.attached_files.contains(&file.id));
}

#[tokio::test]
async fn test_delete_missing_root_is_not_found() {
    let h = Harness::new().await;
    let err = h
        .engine
        .delete_subtree(&h.ctx, ResourceId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AncestryError::NotFound { .. }));
}

// ── Cascade ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_moving_a_folder_rewrites_descendants_and_files() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;
    let b = h.create("collection", &[a]).await;
    let c = h.create("document", &[b]).await;
    let d = h.create("collection", &[]).await;
    let file = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[c]).await))
        .await
        .unwrap()
        .id;

    h.engine
        .set_parents(&h.ctx, b, h.parents(&[d]).await)
        .await
        .unwrap();

    assert_eq!(stored(&h, c).await.ancestors.ids(), vec![b, d]);
    assert_eq!(stored_file(&h, file).await.ancestors.ids(), vec![c, b, d]);
    assert_eq!(h.engine.resolve_ancestors(c).await.unwrap().ids(), vec![b, d]);
}

#[tokio::test]
async fn test_second_cascade_writes_nothing() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;
    let b = h.create("collection", &[a]).await;
    let c = h.create("collection", &[a, b]).await;
    h.create("document", &[c]).await;
    h.engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[c]).await))
        .await
        .unwrap();

    let first = h.engine.cascade(&h.ctx, a).await.unwrap();
    let snapshot = h.store.find_resources(&ResourceFilter::all()).await.unwrap();
    let writes = h.store.write_count();

    let second = h.engine.cascade(&h.ctx, a).await.unwrap();

    assert_eq!(first.resources_visited, second.resources_visited);
    assert!(!second.wrote_anything());
    assert_eq!(h.store.write_count(), writes);
    assert_eq!(
        h.store.find_resources(&ResourceFilter::all()).await.unwrap(),
        snapshot
    );
}

#[tokio::test]
async fn test_multi_parent_descendant_visited_once() {
    let h = Harness::new().await;
    let root = h.create("collection", &[]).await;
    let left = h.create("collection", &[root]).await;
    let right = h.create("collection", &[root]).await;
    h.create("document", &[left, right]).await;

    let report = h.engine.cascade(&h.ctx, root).await.unwrap();
    assert_eq!(report.resources_visited, 4);
}

#[tokio::test]
async fn test_cancelled_cascade_is_incomplete_and_rerunnable() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;
    h.create("document", &[a]).await;

    let token = CancellationToken::new();
    token.cancel();
    let options = CascadeOptions::default().cancelled_by(token);
    let err = h.engine.cascade_with(&h.ctx, a, &options).await.unwrap_err();

    match &err {
        AncestryError::CascadeIncomplete {
            processed,
            remaining,
            ..
        } => {
            assert_eq!(*processed, 0);
            assert_eq!(*remaining, 1);
        }
        other => panic!("expected incomplete cascade, got {other:?}"),
    }
    assert!(err.is_retryable());
    assert!(h.engine.cascade(&h.ctx, a).await.is_ok());
}

#[tokio::test]
async fn test_zero_timeout_stops_cascade() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;

    let options = CascadeOptions::with_timeout(Duration::ZERO);
    let err = h.engine.cascade_with(&h.ctx, a, &options).await.unwrap_err();
    assert!(matches!(err, AncestryError::CascadeIncomplete { .. }));
}

/// Store whose child lookups can be made to fail.
#[derive(Debug)]
struct FlakyStore {
    inner: Arc<MemoryResourceStore>,
    fail_children: AtomicBool,
}

#[async_trait]
impl ResourceStore for FlakyStore {
    async fn get_resource(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        self.inner.get_resource(id).await
    }
    async fn find_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>> {
        if filter.parent.is_some() && self.fail_children.load(Ordering::SeqCst) {
            return Err(AppError::database("connection reset"));
        }
        self.inner.find_resources(filter).await
    }
    async fn insert_resource(&self, resource: &Resource) -> AppResult<()> {
        self.inner.insert_resource(resource).await
    }
    async fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> AppResult<Resource> {
        self.inner.update_resource(id, patch).await
    }
    async fn delete_resource(&self, id: ResourceId) -> AppResult<bool> {
        self.inner.delete_resource(id).await
    }
    async fn get_file_record(&self, id: FileRecordId) -> AppResult<Option<FileRecord>> {
        self.inner.get_file_record(id).await
    }
    async fn find_file_records_attached_to(&self, resource: ResourceId) -> AppResult<Vec<FileRecord>> {
        self.inner.find_file_records_attached_to(resource).await
    }
    async fn list_file_records(&self) -> AppResult<Vec<FileRecord>> {
        self.inner.list_file_records().await
    }
    async fn insert_file_record(&self, record: &FileRecord) -> AppResult<()> {
        self.inner.insert_file_record(record).await
    }
    async fn update_file_record(
        &self,
        id: FileRecordId,
        patch: &FileRecordPatch,
    ) -> AppResult<FileRecord> {
        self.inner.update_file_record(id, patch).await
    }
    async fn delete_file_record(&self, id: FileRecordId) -> AppResult<bool> {
        self.inner.delete_file_record(id).await
    }
}

#[tokio::test]
async fn test_store_failure_mid_cascade_is_incomplete() {
    let store = Arc::new(MemoryResourceStore::new());
    let flaky = Arc::new(FlakyStore {
        inner: store.clone(),
        fail_children: AtomicBool::new(false),
    });
    let h = Harness::build(store, flaky.clone(), AncestryConfig::default()).await;
    let a = h.create("collection", &[]).await;
    let b = h.create("collection", &[a]).await;
    h.create("document", &[b]).await;

    flaky.fail_children.store(true, Ordering::SeqCst);
    let err = h.engine.cascade(&h.ctx, a).await.unwrap_err();
    match &err {
        AncestryError::CascadeIncomplete { reason, processed, .. } => {
            assert!(reason.contains("connection reset"), "{reason}");
            assert_eq!(*processed, 1);
        }
        other => panic!("expected incomplete cascade, got {other:?}"),
    }

    flaky.fail_children.store(false, Ordering::SeqCst);
    let report = h.engine.cascade(&h.ctx, a).await.unwrap();
    assert_eq!(report.resources_visited, 3);
}

// ── Access rights ──────────────────────────────────────────────────

#[tokio::test]
async fn test_access_follows_nearest_declaring_ancestor() {
    let h = Harness::new().await;
    let top = h.create("collection", &[]).await;
    let mid = h.create("collection", &[top]).await;
    let leaf = h.create("document", &[mid]).await;

    h.engine
        .set_access_right(&h.ctx, top, Some(h.restricted.id))
        .await
        .unwrap();
    let effective = h.engine.resolve_effective_access(leaf).await.unwrap().unwrap();
    assert_eq!(effective.right, h.restricted);
    assert_eq!(
        effective.source,
        AccessSource::Inherited { from: top, depth: 2 }
    );

    h.engine
        .set_access_right(&h.ctx, mid, Some(h.public.id))
        .await
        .unwrap();
    let effective = h.engine.resolve_effective_access(leaf).await.unwrap().unwrap();
    assert_eq!(effective.right, h.public);
    assert_eq!(
        effective.source,
        AccessSource::Inherited { from: mid, depth: 1 }
    );

    h.engine.set_access_right(&h.ctx, mid, None).await.unwrap();
    assert_eq!(
        h.engine.resolve_access_right(leaf).await.unwrap(),
        Some(h.restricted.clone())
    );
}

#[tokio::test]
async fn test_unknown_access_option_is_rejected() {
    let h = Harness::new().await;
    let folder = h.create("collection", &[]).await;
    let err = h
        .engine
        .set_access_right(&h.ctx, folder, Some(archive_core::types::AccessRightId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AncestryError::NotFound { .. }));
}

#[tokio::test]
async fn test_file_access_inherits_through_closure() {
    let h = Harness::new().await;
    let folder = h.create("collection", &[]).await;
    let doc = h.create("document", &[folder]).await;
    h.engine
        .set_access_right(&h.ctx, folder, Some(h.restricted.id))
        .await
        .unwrap();
    let file = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[doc]).await))
        .await
        .unwrap()
        .id;

    let effective = h
        .engine
        .resolve_file_effective_access(file)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(effective.right, h.restricted);
    assert_eq!(
        effective.source,
        AccessSource::Inherited {
            from: folder,
            depth: 2
        }
    );
}

// ── File records ───────────────────────────────────────────────────

#[tokio::test]
async fn test_attachments_stay_in_sync() {
    let h = Harness::new().await;
    let folder1 = h.create("collection", &[]).await;
    let folder2 = h.create("collection", &[]).await;
    let doc = h.create("document", &[folder1]).await;

    let file = h
        .engine
        .attach_file(&h.ctx, NewFileRecord::new(h.parents(&[doc]).await))
        .await
        .unwrap();
    assert!(stored(&h, doc).await.attached_files.contains(&file.id));
    assert_eq!(file.ancestors.ids(), vec![doc, folder1]);

    let moved = h
        .engine
        .set_file_parents(&h.ctx, file.id, h.parents(&[folder2]).await)
        .await
        .unwrap();
    assert_eq!(moved.ancestors.ids(), vec![folder2]);
    assert!(!stored(&h, doc).await.attached_files.contains(&file.id));
    assert!(stored(&h, folder2).await.attached_files.contains(&file.id));
    assert_eq!(
        h.engine.resolve_file_ancestors(file.id).await.unwrap(),
        moved.ancestors
    );
}

#[tokio::test]
async fn test_file_with_missing_parent_is_rejected() {
    let h = Harness::new().await;
    let ghost = ResourceId::new();
    let err = h
        .engine
        .attach_file(
            &h.ctx,
            NewFileRecord::new(DirectParents::from_entries([DirectParent::new(
                ghost,
                "document",
            )])),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AncestryError::NotFound { .. }));
    assert!(h.store.list_file_records().await.unwrap().is_empty());
}

// ── Maintenance ────────────────────────────────────────────────────

#[tokio::test]
async fn test_rebuild_repairs_stale_closures() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;
    let b = h.create("document", &[a]).await;
    h.store
        .update_resource(b, &ResourcePatch::ancestors(Ancestry::new()))
        .await
        .unwrap();

    let report = h.engine.rebuild_all(&h.ctx).await.unwrap();
    assert_eq!(report.resources_updated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(stored(&h, b).await.ancestors.ids(), vec![a]);
}

#[tokio::test]
async fn test_descendants_breadth_first() {
    let h = Harness::new().await;
    let root = h.create("collection", &[]).await;
    let child = h.create("collection", &[root]).await;
    let grandchild = h.create("document", &[child]).await;

    assert_eq!(
        h.engine.descendants(root).await.unwrap(),
        vec![child, grandchild]
    );
    assert!(h.engine.descendants(grandchild).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_category_cannot_be_created() {
    let h = Harness::new().await;
    let err = h
        .engine
        .create_resource(&h.ctx, NewResource::new("sculpture"))
        .await
        .unwrap_err();
    assert!(matches!(err, AncestryError::UnknownCategory(_)));
}

// ── Cache and events ───────────────────────────────────────────────

#[tokio::test]
async fn test_memoized_reads_do_not_go_stale_after_mutation() {
    let h = Harness::new().await;
    let a = h.create("collection", &[]).await;
    let b = h.create("collection", &[]).await;
    let doc = h.create("document", &[a]).await;

    let first = h.engine.resolve_ancestors(doc).await.unwrap();
    let hits = h.engine.memo().stats().hits;
    assert_eq!(h.engine.resolve_ancestors(doc).await.unwrap(), first);
    assert_eq!(h.engine.memo().stats().hits, hits + 1);

    h.engine
        .set_parents(&h.ctx, doc, h.parents(&[b]).await)
        .await
        .unwrap();
    assert_eq!(h.engine.resolve_ancestors(doc).await.unwrap().ids(), vec![b]);
}

#[tokio::test]
async fn test_events_are_published() {
    let h = Harness::new().await;
    let folder = h.create("collection", &[]).await;
    let doc = h.create("document", &[]).await;
    let mut events = h.engine.subscribe().unwrap();

    h.engine
        .set_parents(&h.ctx, doc, h.parents(&[folder]).await)
        .await
        .unwrap();

    let first = events.recv().await.unwrap();
    assert_eq!(first.actor_id, Some(h.ctx.user_id));
    assert!(matches!(
        first.payload,
        AncestryEvent::ParentsChanged { resource_id, .. } if resource_id == doc
    ));
    let second = events.recv().await.unwrap();
    assert!(matches!(second.payload, AncestryEvent::CascadeCompleted { root, .. } if root == doc));
}
