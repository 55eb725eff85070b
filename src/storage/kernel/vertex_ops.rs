use std::cmp::Ordering;

use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use super::{GraphKernel, VertexRecord};
use crate::error::{GraphError, Result};
use crate::storage::metrics::ElementKind;
use crate::storage::sequence::SeqAnchor;
use crate::types::{ClassTag, VertexId};

/// Read-only view of a vertex handed to sort comparators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexView {
    /// Vertex id.
    pub id: VertexId,
    /// Vertex class.
    pub class: ClassTag,
    /// Number of incidences.
    pub degree: usize,
}

impl VertexRecord {
    pub(super) fn new(class: ClassTag, generation: u64) -> Self {
        Self {
            class,
            generation,
            prev: None,
            next: None,
            incidences: SeqAnchor::new(),
        }
    }
}

impl GraphKernel {
    /// Creates a vertex at the end of the global vertex sequence, growing the
    /// vertex table if every id is taken.
    pub fn create_vertex(&mut self, class: ClassTag) -> Result<VertexId> {
        self.ensure_not_loading()?;
        let v = self.allocate_vertex_id()?;
        let generation = self.take_generation();
        self.vertices.fill(v.0, VertexRecord::new(class, generation));
        self.vseq.append(&mut self.vertices, v);
        self.graph_version += 1;
        self.metrics.vertex_created();
        self.listeners.notify(|l| l.vertex_added(v));
        trace!(vertex = %v, class = %class, "kernel.vertex.created");
        Ok(v)
    }

    /// Deletes `v`, every edge incident to it, and recursively every vertex
    /// it owns through an ownership edge. Returns the number of vertices
    /// removed.
    pub fn delete_vertex(&mut self, v: VertexId) -> usize {
        self.assert_not_loading("delete_vertex");
        assert!(self.is_vertex_live(v), "vertex {v} is not live");
        let mut worklist: SmallVec<[VertexId; 8]> = smallvec![v];
        let mut removed = 0usize;
        let mut edges_removed = 0usize;
        while let Some(w) = worklist.pop() {
            if !self.vertices.contains(w.0) {
                continue;
            }
            self.vseq.remove(&mut self.vertices, w);
            self.listeners.notify(|l| l.vertex_deleted(w));
            while let Some(inc) = self.vertices[w.0].incidences.first() {
                let e = inc.edge();
                let record = &self.edges[e.0];
                // Ownership has to be read while the edge still exists.
                if let Some(owned_end) = self.schema.ownership_kind(record.class).owned_end() {
                    if owned_end != inc.end() {
                        let owned = record.vertices[owned_end.slot()];
                        if owned != w {
                            worklist.push(owned);
                        }
                    }
                }
                self.remove_edge(e);
                edges_removed += 1;
            }
            self.vertices.release(w.0);
            self.metrics.vertex_deleted();
            removed += 1;
            trace!(vertex = %w, "kernel.vertex.deleted");
        }
        self.graph_version += 1;
        self.metrics.cascade_deleted(removed as u64);
        if removed > 1 {
            debug!(
                root = %v,
                vertices = removed,
                edges = edges_removed,
                "kernel.delete.cascade"
            );
        }
        removed
    }

    /// Moves `moved` directly in front of `target` in the vertex sequence.
    pub fn put_vertex_before(&mut self, target: VertexId, moved: VertexId) {
        self.assert_not_loading("put_vertex_before");
        let before = self.vseq.version();
        self.vseq.put_before(&mut self.vertices, target, moved);
        if self.vseq.version() != before {
            self.graph_version += 1;
        }
    }

    /// Moves `moved` directly behind `target` in the vertex sequence.
    pub fn put_vertex_after(&mut self, target: VertexId, moved: VertexId) {
        self.assert_not_loading("put_vertex_after");
        let before = self.vseq.version();
        self.vseq.put_after(&mut self.vertices, target, moved);
        if self.vseq.version() != before {
            self.graph_version += 1;
        }
    }

    /// Stable sort of the global vertex sequence.
    pub fn sort_vertices<F>(&mut self, mut cmp: F)
    where
        F: FnMut(VertexView, VertexView) -> Ordering,
    {
        self.assert_not_loading("sort_vertices");
        if self.vseq.len() < 2 {
            return;
        }
        self.vseq.sort_by(&mut self.vertices, |table, a, b| {
            let view = |v: VertexId| VertexView {
                id: v,
                class: table[v.0].class,
                degree: table[v.0].incidences.len(),
            };
            cmp(view(a), view(b))
        });
        self.graph_version += 1;
    }

    fn allocate_vertex_id(&mut self) -> Result<VertexId> {
        if let Some(id) = self.vertices.allocate() {
            return Ok(VertexId(id));
        }
        let current = self.vertices.capacity();
        self.expand_vertices(self.growth.next_capacity(current))?;
        self.vertices
            .allocate()
            .map(VertexId)
            .ok_or(GraphError::InvalidCapacity {
                requested: current + 1,
                current,
            })
    }

    pub(super) fn take_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    pub(super) fn notify_vertex_growth(&mut self, capacity: usize) {
        self.metrics.expanded(ElementKind::Vertex);
        self.listeners
            .notify(|l| l.max_vertex_count_increased(capacity));
    }
}
