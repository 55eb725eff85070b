use std::cmp::Ordering;

use tracing::trace;

use super::{EdgeRecord, GraphKernel};
use crate::error::{GraphError, Result};
use crate::storage::metrics::ElementKind;
use crate::storage::sequence::LinkSlots;
use crate::types::{ClassTag, EdgeEnd, EdgeId, Incidence, VertexId};

/// Read-only view of an edge handed to sort comparators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeView {
    /// Edge id.
    pub id: EdgeId,
    /// Edge class.
    pub class: ClassTag,
    /// Source vertex.
    pub alpha: VertexId,
    /// Target vertex.
    pub omega: VertexId,
}

/// Read-only view of an incidence handed to sort comparators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncidenceView {
    /// The incidence being placed.
    pub incidence: Incidence,
    /// Class of its edge.
    pub class: ClassTag,
    /// The vertex owning the sequence being sorted.
    pub this: VertexId,
    /// The vertex at the opposite end.
    pub that: VertexId,
}

impl EdgeView {
    fn of(id: EdgeId, record: &EdgeRecord) -> Self {
        Self {
            id,
            class: record.class,
            alpha: record.vertices[0],
            omega: record.vertices[1],
        }
    }
}

impl IncidenceView {
    fn of(inc: Incidence, record: &EdgeRecord) -> Self {
        let slot = inc.end().slot();
        Self {
            incidence: inc,
            class: record.class,
            this: record.vertices[slot],
            that: record.vertices[1 - slot],
        }
    }
}

impl GraphKernel {
    /// Creates an edge from `alpha` to `omega`.
    ///
    /// Both ends are checked against the schema first; on
    /// [`GraphError::ConstraintViolation`] nothing has changed. The normal
    /// incidence is appended to `alpha`'s sequence and the reversed one to
    /// `omega`'s.
    pub fn create_edge(
        &mut self,
        class: ClassTag,
        alpha: VertexId,
        omega: VertexId,
    ) -> Result<EdgeId> {
        self.ensure_not_loading()?;
        self.check_end(class, alpha, EdgeEnd::Alpha)?;
        self.check_end(class, omega, EdgeEnd::Omega)?;
        let e = self.allocate_edge_id()?;
        self.edges.fill(e.0, EdgeRecord::new(class, alpha, omega));
        self.vertices[alpha.0]
            .incidences
            .append(&mut self.edges, Incidence::normal(e));
        self.vertices[omega.0]
            .incidences
            .append(&mut self.edges, Incidence::reversed_of(e));
        self.eseq.append(&mut self.edges, e);
        self.graph_version += 1;
        self.metrics.edge_created();
        self.listeners.notify(|l| l.edge_added(e));
        trace!(edge = %e, class = %class, alpha = %alpha, omega = %omega, "kernel.edge.created");
        Ok(e)
    }

    /// Deletes `e`. Never cascades to its endpoints.
    pub fn delete_edge(&mut self, e: EdgeId) {
        self.assert_not_loading("delete_edge");
        assert!(self.is_edge_live(e), "edge {e} is not live");
        self.remove_edge(e);
        self.graph_version += 1;
    }

    /// Reattaches one end of `e` to `vertex`.
    ///
    /// The new end is validated against the schema before anything changes.
    /// Relinking to the current endpoint is a no-op.
    pub fn relink_edge_end(&mut self, e: EdgeId, vertex: VertexId, end: EdgeEnd) -> Result<()> {
        self.ensure_not_loading()?;
        let record = &self.edges[e.0];
        let class = record.class;
        let old = record.vertices[end.slot()];
        self.check_end(class, vertex, end)?;
        if old == vertex {
            return Ok(());
        }
        let inc = Incidence::new(e, end);
        self.vertices[old.0].incidences.remove(&mut self.edges, inc);
        self.edges[e.0].vertices[end.slot()] = vertex;
        self.vertices[vertex.0].incidences.append(&mut self.edges, inc);
        self.graph_version += 1;
        trace!(edge = %e, ?end, from = %old, to = %vertex, "kernel.edge.relinked");
        Ok(())
    }

    /// Relinks the alpha end of `e`; see [`Self::relink_edge_end`].
    pub fn set_alpha(&mut self, e: EdgeId, vertex: VertexId) -> Result<()> {
        self.relink_edge_end(e, vertex, EdgeEnd::Alpha)
    }

    /// Relinks the omega end of `e`; see [`Self::relink_edge_end`].
    pub fn set_omega(&mut self, e: EdgeId, vertex: VertexId) -> Result<()> {
        self.relink_edge_end(e, vertex, EdgeEnd::Omega)
    }

    /// Moves `moved` directly before `target` in the edge sequence.
    pub fn put_edge_before(&mut self, target: EdgeId, moved: EdgeId) {
        self.assert_not_loading("put_edge_before");
        let before = self.eseq.version();
        self.eseq.put_before(&mut self.edges, target, moved);
        if self.eseq.version() != before {
            self.graph_version += 1;
        }
    }

    /// Moves `moved` directly after `target` in the edge sequence.
    pub fn put_edge_after(&mut self, target: EdgeId, moved: EdgeId) {
        self.assert_not_loading("put_edge_after");
        let before = self.eseq.version();
        self.eseq.put_after(&mut self.edges, target, moved);
        if self.eseq.version() != before {
            self.graph_version += 1;
        }
    }

    /// Moves `moved` in front of `target` within their common vertex's
    /// incidence sequence.
    ///
    /// # Panics
    ///
    /// If the two incidences belong to different vertices.
    pub fn put_incidence_before(&mut self, target: Incidence, moved: Incidence) {
        self.reorder_incidence(target, moved, true);
    }

    /// Moves `moved` behind `target` within their common vertex's incidence
    /// sequence.
    ///
    /// # Panics
    ///
    /// If the two incidences belong to different vertices.
    pub fn put_incidence_after(&mut self, target: Incidence, moved: Incidence) {
        self.reorder_incidence(target, moved, false);
    }

    /// Stable sort of `v`'s incidence sequence.
    pub fn sort_incidences<F>(&mut self, v: VertexId, mut cmp: F)
    where
        F: FnMut(IncidenceView, IncidenceView) -> Ordering,
    {
        self.assert_not_loading("sort_incidences");
        let anchor = &mut self.vertices[v.0].incidences;
        if anchor.len() < 2 {
            return;
        }
        anchor.sort_by(&mut self.edges, |table, a, b| {
            cmp(
                IncidenceView::of(a, &table[a.edge().0]),
                IncidenceView::of(b, &table[b.edge().0]),
            )
        });
        self.graph_version += 1;
    }

    /// Stable sort of the global edge sequence.
    pub fn sort_edges<F>(&mut self, mut cmp: F)
    where
        F: FnMut(EdgeView, EdgeView) -> Ordering,
    {
        self.assert_not_loading("sort_edges");
        if self.eseq.len() < 2 {
            return;
        }
        self.eseq.sort_by(&mut self.edges, |table, a: EdgeId, b: EdgeId| {
            cmp(EdgeView::of(a, &table[a.0]), EdgeView::of(b, &table[b.0]))
        });
        self.graph_version += 1;
    }

    /// Unlinks `e` from both incidence sequences and the edge sequence and
    /// frees its id. Callers bump the graph version.
    pub(super) fn remove_edge(&mut self, e: EdgeId) {
        let [alpha, omega] = self.edges[e.0].vertices;
        self.vertices[alpha.0]
            .incidences
            .remove(&mut self.edges, Incidence::normal(e));
        self.vertices[omega.0]
            .incidences
            .remove(&mut self.edges, Incidence::reversed_of(e));
        self.eseq.remove(&mut self.edges, e);
        self.edges.release(e.0);
        self.metrics.edge_deleted();
        self.listeners.notify(|l| l.edge_deleted(e));
        trace!(edge = %e, "kernel.edge.deleted");
    }

    fn reorder_incidence(&mut self, target: Incidence, moved: Incidence, before: bool) {
        self.assert_not_loading("put_incidence");
        let v = self.this(target);
        assert_eq!(
            v,
            self.this(moved),
            "{moved} does not belong to the incidence sequence of {v}"
        );
        let anchor = &mut self.vertices[v.0].incidences;
        let version = anchor.version();
        if before {
            anchor.put_before(&mut self.edges, target, moved);
        } else {
            anchor.put_after(&mut self.edges, target, moved);
        }
        if anchor.version() != version {
            self.graph_version += 1;
        }
    }

    fn allocate_edge_id(&mut self) -> Result<EdgeId> {
        if let Some(id) = self.edges.allocate() {
            return Ok(EdgeId(id));
        }
        let current = self.edges.capacity();
        self.expand_edges(self.growth.next_capacity(current))?;
        self.edges
            .allocate()
            .map(EdgeId)
            .ok_or(GraphError::InvalidCapacity {
                requested: current + 1,
                current,
            })
    }

    pub(super) fn notify_edge_growth(&mut self, capacity: usize) {
        self.metrics.expanded(ElementKind::Edge);
        self.listeners.notify(|l| l.max_edge_count_increased(capacity));
    }

    /// Next incidence in the raw sequence, ignoring filters.
    pub(super) fn raw_next_incidence(&self, inc: Incidence) -> Option<Incidence> {
        LinkSlots::<Incidence>::next(&self.edges, inc)
    }
}
