//! Parent-graph snapshot and closure computation.
//!
//! A closure is computed in three passes over a snapshot fetched once from
//! the store:
//!
//! 1. breadth-first fetch of every node reachable through parent edges,
//! 2. depth-first cycle check with an on-path set,
//! 3. breadth-first walk assigning minimum depth and collecting the
//!    immediate descendants of each ancestor.
//!
//! The origin node is never read from the store. Its parents are the
//! proposed list, so a stale stored parent list cannot leak into the result.

use std::collections::{HashMap, HashSet, VecDeque};

use futures::future::try_join_all;
use uuid::Uuid;

use archive_core::types::ResourceId;
use archive_entity::ancestry::{Ancestor, Ancestry, DirectParents};
use archive_entity::category::CategorySlug;
use archive_store::ResourceStore;

use crate::error::{AncestryError, AncestryResult};

/// A fetched resource reduced to what the closure needs.
#[derive(Debug, Clone)]
pub(crate) struct GraphNode {
    /// Stored category.
    pub category: CategorySlug,
    /// Stored direct parent ids, in declaration order.
    pub parents: Vec<ResourceId>,
}

/// Snapshot of every resource reachable upward from a set of seeds.
#[derive(Debug, Clone)]
pub(crate) struct ParentGraph {
    /// The resource whose parents are being resolved, if it is a resource.
    origin: Option<ResourceId>,
    /// Id recorded as the descendant of each depth-1 ancestor.
    marker: Uuid,
    /// Proposed parents of the origin.
    seeds: Vec<ResourceId>,
    /// Fetched nodes.
    nodes: HashMap<ResourceId, GraphNode>,
}

/// Working state of the depth pass.
#[derive(Debug, Default)]
struct ClosureWalk {
    entries: HashMap<ResourceId, Ancestor>,
    /// Discovery order.
    order: Vec<ResourceId>,
    queue: VecDeque<(ResourceId, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

impl ParentGraph {
    /// Fetch every resource reachable from `seeds`.
    ///
    /// Nodes are fetched one breadth-first level at a time, with the reads
    /// of a level issued concurrently. A missing node is reported together
    /// with the child that references it.
    pub async fn fetch(
        store: &dyn ResourceStore,
        origin: Option<ResourceId>,
        marker: Uuid,
        seeds: &DirectParents,
        max_nodes: usize,
    ) -> AncestryResult<Self> {
        let seeds = seeds.ids();
        let mut nodes: HashMap<ResourceId, GraphNode> = HashMap::new();
        let mut seen: HashSet<ResourceId> = origin.into_iter().collect();

        let seed_referrer = (!marker.is_nil()).then_some(marker);
        let mut frontier: Vec<(ResourceId, Option<Uuid>)> = Vec::new();
        for seed in &seeds {
            if seen.insert(*seed) {
                frontier.push((*seed, seed_referrer));
            }
        }

        while !frontier.is_empty() {
            if nodes.len() + frontier.len() > max_nodes {
                return Err(AncestryError::TraversalLimit { limit: max_nodes });
            }

            let fetched =
                try_join_all(frontier.iter().map(|(id, _)| store.get_resource(*id))).await?;

            let mut next = Vec::new();
            for ((id, referenced_by), resource) in frontier.into_iter().zip(fetched) {
                let resource = resource
                    .ok_or_else(|| AncestryError::resource_not_found(id, referenced_by))?;
                let parents = resource.direct_parents.ids();
                for parent in &parents {
                    if seen.insert(*parent) {
                        next.push((*parent, Some(id.into_uuid())));
                    }
                }
                nodes.insert(
                    id,
                    GraphNode {
                        category: resource.category,
                        parents,
                    },
                );
            }
            frontier = next;
        }

        Ok(Self {
            origin,
            marker,
            seeds,
            nodes,
        })
    }

    /// Stored category of a fetched node.
    pub fn category_of(&self, id: ResourceId) -> Option<&CategorySlug> {
        self.nodes.get(&id).map(|n| &n.category)
    }

    /// Number of fetched nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn parents_of(&self, id: ResourceId) -> &[ResourceId] {
        if self.origin == Some(id) {
            return &self.seeds;
        }
        self.nodes
            .get(&id)
            .map(|n| n.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Fail with the offending path if any parent chain loops.
    pub fn check_acyclic(&self) -> AncestryResult<()> {
        let roots: Vec<ResourceId> = match self.origin {
            Some(origin) => vec![origin],
            None => self.seeds.clone(),
        };

        let mut marks: HashMap<ResourceId, Mark> = HashMap::new();
        for root in roots {
            if marks.contains_key(&root) {
                continue;
            }

            let mut path = vec![root];
            let mut stack: Vec<(ResourceId, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::OnPath);

            while let Some(&(node, cursor)) = stack.last() {
                let parents = self.parents_of(node);
                if cursor == parents.len() {
                    marks.insert(node, Mark::Done);
                    path.pop();
                    stack.pop();
                    continue;
                }

                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let next = parents[cursor];
                match marks.get(&next) {
                    Some(Mark::OnPath) => {
                        let start = path.iter().position(|p| *p == next).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(next);
                        return Err(AncestryError::Cycle { path: cycle });
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::OnPath);
                        path.push(next);
                        stack.push((next, 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Closure of the origin with `parents` as its direct parents.
    ///
    /// `parents` must be a subset of the seeds the graph was fetched for.
    /// Call [`Self::check_acyclic`] first; on a cyclic graph the walk still
    /// terminates but the result is meaningless.
    pub fn closure_for(&self, parents: &[ResourceId]) -> Ancestry {
        let mut walk = ClosureWalk::default();
        for parent in parents {
            self.reach(&mut walk, *parent, 1, self.marker);
        }
        while let Some((node, depth)) = walk.queue.pop_front() {
            for parent in self.parents_of(node) {
                self.reach(&mut walk, *parent, depth + 1, node.into_uuid());
            }
        }

        let ClosureWalk {
            mut entries, order, ..
        } = walk;
        Ancestry::from_ordered(
            order
                .into_iter()
                .filter_map(|id| entries.remove(&id))
                .collect(),
        )
    }

    /// Record that `descendant` reaches `id`, discovering `id` at `depth` on first sight.
    fn reach(&self, walk: &mut ClosureWalk, id: ResourceId, depth: u32, descendant: Uuid) {
        if Some(id) == self.origin {
            return;
        }
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let entry = walk.entries.entry(id).or_insert_with(|| {
            walk.order.push(id);
            walk.queue.push_back((id, depth));
            Ancestor {
                id,
                category: node.category.clone(),
                depth,
                descendant_ids: Default::default(),
            }
        });
        entry.descendant_ids.insert(descendant);
    }

    /// Closure of the origin with every seed as a direct parent.
    pub fn closure(&self) -> Ancestry {
        self.closure_for(&self.seeds)
    }
}
