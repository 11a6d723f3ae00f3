//! Ancestor closure resolution for resources and file records.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use archive_core::types::{FileRecordId, ResourceId};
use archive_entity::ancestry::{Ancestry, DirectParents};
use archive_store::ResourceStore;

use super::graph::ParentGraph;
use crate::error::{AncestryError, AncestryResult};
use crate::memo::{MemoCache, MemoOperation};

/// Computes deduplicated ancestor closures from the direct-parent graph.
///
/// The resolver only reads from the store.
#[derive(Debug, Clone)]
pub struct AncestryResolver {
    store: Arc<dyn ResourceStore>,
    memo: MemoCache,
    /// Upper bound on resources fetched by one resolution.
    max_nodes: usize,
}

impl AncestryResolver {
    /// Creates a new resolver.
    pub fn new(store: Arc<dyn ResourceStore>, memo: MemoCache, max_nodes: usize) -> Self {
        Self {
            store,
            memo,
            max_nodes,
        }
    }

    /// Closure of a stored resource, computed from its stored direct parents.
    pub async fn resolve_ancestors(&self, id: ResourceId) -> AncestryResult<Ancestry> {
        self.memo
            .get_or_compute(MemoOperation::Ancestors, &id.to_string(), || {
                self.ancestors_uncached(id)
            })
            .await
    }

    async fn ancestors_uncached(&self, id: ResourceId) -> AncestryResult<Ancestry> {
        let resource = self
            .store
            .get_resource(id)
            .await?
            .ok_or_else(|| AncestryError::resource_not_found(id, None))?;
        self.resolve_for_parents(Some(id), &resource.direct_parents)
            .await
    }

    /// Closure of a stored file record, computed from its stored direct parents.
    pub async fn resolve_file_ancestors(&self, id: FileRecordId) -> AncestryResult<Ancestry> {
        self.memo
            .get_or_compute(MemoOperation::FileAncestors, &id.to_string(), || {
                self.file_ancestors_uncached(id)
            })
            .await
    }

    async fn file_ancestors_uncached(&self, id: FileRecordId) -> AncestryResult<Ancestry> {
        let record = self
            .store
            .get_file_record(id)
            .await?
            .ok_or_else(|| AncestryError::file_not_found(id))?;
        self.resolve_for_file(id, &record.direct_parents).await
    }

    /// Closure of `origin` if its direct parents were `parents`.
    ///
    /// `origin` is `None` for a resource that has no id yet. Never cached.
    pub async fn resolve_for_parents(
        &self,
        origin: Option<ResourceId>,
        parents: &DirectParents,
    ) -> AncestryResult<Ancestry> {
        let graph = self.graph(origin, parents).await?;
        graph.check_acyclic()?;
        Ok(graph.closure())
    }

    /// Closure of a file record if its direct parents were `parents`. Never cached.
    pub async fn resolve_for_file(
        &self,
        id: FileRecordId,
        parents: &DirectParents,
    ) -> AncestryResult<Ancestry> {
        let graph = self.file_graph(id, parents).await?;
        graph.check_acyclic()?;
        Ok(graph.closure())
    }

    /// Fetch the parent graph above a resource.
    pub(crate) async fn graph(
        &self,
        origin: Option<ResourceId>,
        parents: &DirectParents,
    ) -> AncestryResult<ParentGraph> {
        let marker = origin.map(|id| id.into_uuid()).unwrap_or_else(Uuid::nil);
        let graph = ParentGraph::fetch(
            self.store.as_ref(),
            origin,
            marker,
            parents,
            self.max_nodes,
        )
        .await?;
        debug!(origin = ?origin, nodes = graph.node_count(), "Fetched parent graph");
        Ok(graph)
    }

    /// Fetch the parent graph above a file record.
    pub(crate) async fn file_graph(
        &self,
        id: FileRecordId,
        parents: &DirectParents,
    ) -> AncestryResult<ParentGraph> {
        ParentGraph::fetch(
            self.store.as_ref(),
            None,
            id.into_uuid(),
            parents,
            self.max_nodes,
        )
        .await
    }
}
