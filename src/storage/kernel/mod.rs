//! The graph kernel: vertex and edge tables, the global sequences, and the
//! per-vertex incidence sequences, kept consistent by every mutation.
//!
//! Records are stored in [`ElementTable`]s and refer to one another only by
//! id. Links for the global vertex sequence live on vertex records; links for
//! the global edge sequence and for both incidence ends live on edge records.
//!
//! # Versions
//!
//! Four counters let callers detect change without diffing:
//! - [`GraphKernel::graph_version`] moves on every structural mutation.
//! - [`GraphKernel::vertex_list_version`] and [`GraphKernel::edge_list_version`]
//!   move when the membership or order of the global sequences changes.
//! - [`GraphKernel::incidence_version`] moves when one vertex's incidence
//!   sequence changes.

use std::sync::Arc;

use tracing::trace;

use super::listener::{ListenerId, Listeners, StructureListener};
use super::metrics::{KernelMetrics, NoopMetrics};
use super::options::KernelOptions;
use super::schema::Schema;
use super::sequence::{LinkSlots, SeqAnchor};
use super::table::{ElementTable, GrowthPolicy};
use crate::error::{GraphError, Result};
use crate::types::{ClassTag, Direction, EdgeEnd, EdgeId, Incidence, VertexId};

mod edge_ops;
mod iter;
mod layout;
mod load;
mod tests;
mod verify;
mod vertex_ops;

pub use edge_ops::{EdgeView, IncidenceView};
pub use iter::{
    ClassFilter, EdgeCursor, EdgeIter, IncidenceCursor, IncidenceIter, VertexCursor, VertexIter,
};
pub use layout::DefragStats;
pub use load::incidence_slot;
pub use verify::VerifyReport;
pub use vertex_ops::VertexView;

#[derive(Clone, Debug)]
pub(crate) struct VertexRecord {
    class: ClassTag,
    /// Unique per created vertex, so a reused id never matches an old cursor.
    generation: u64,
    prev: Option<VertexId>,
    next: Option<VertexId>,
    incidences: SeqAnchor<Incidence>,
}

#[derive(Clone, Copy, Debug, Default)]
struct EndLinks {
    prev: Option<Incidence>,
    next: Option<Incidence>,
}

#[derive(Clone, Debug)]
pub(crate) struct EdgeRecord {
    class: ClassTag,
    /// Alpha then omega.
    vertices: [VertexId; 2],
    prev: Option<EdgeId>,
    next: Option<EdgeId>,
    ends: [EndLinks; 2],
}

impl EdgeRecord {
    fn new(class: ClassTag, alpha: VertexId, omega: VertexId) -> Self {
        Self {
            class,
            vertices: [alpha, omega],
            prev: None,
            next: None,
            ends: [EndLinks::default(); 2],
        }
    }
}

impl LinkSlots<VertexId> for ElementTable<VertexRecord> {
    fn prev(&self, key: VertexId) -> Option<VertexId> {
        self[key.0].prev
    }
    fn next(&self, key: VertexId) -> Option<VertexId> {
        self[key.0].next
    }
    fn set_prev(&mut self, key: VertexId, prev: Option<VertexId>) {
        self[key.0].prev = prev;
    }
    fn set_next(&mut self, key: VertexId, next: Option<VertexId>) {
        self[key.0].next = next;
    }
}

impl LinkSlots<EdgeId> for ElementTable<EdgeRecord> {
    fn prev(&self, key: EdgeId) -> Option<EdgeId> {
        self[key.0].prev
    }
    fn next(&self, key: EdgeId) -> Option<EdgeId> {
        self[key.0].next
    }
    fn set_prev(&mut self, key: EdgeId, prev: Option<EdgeId>) {
        self[key.0].prev = prev;
    }
    fn set_next(&mut self, key: EdgeId, next: Option<EdgeId>) {
        self[key.0].next = next;
    }
}

impl LinkSlots<Incidence> for ElementTable<EdgeRecord> {
    fn prev(&self, key: Incidence) -> Option<Incidence> {
        self[key.edge().0].ends[key.end().slot()].prev
    }
    fn next(&self, key: Incidence) -> Option<Incidence> {
        self[key.edge().0].ends[key.end().slot()].next
    }
    fn set_prev(&mut self, key: Incidence, prev: Option<Incidence>) {
        self[key.edge().0].ends[key.end().slot()].prev = prev;
    }
    fn set_next(&mut self, key: Incidence, next: Option<Incidence>) {
        self[key.edge().0].ends[key.end().slot()].next = next;
    }
}

/// Snapshot of kernel sizes and versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelStats {
    /// Live vertices.
    pub vertex_count: usize,
    /// Live edges.
    pub edge_count: usize,
    /// Vertex table capacity.
    pub vertex_capacity: usize,
    /// Edge table capacity.
    pub edge_capacity: usize,
    /// See [`GraphKernel::graph_version`].
    pub graph_version: u64,
    /// See [`GraphKernel::vertex_list_version`].
    pub vertex_list_version: u64,
    /// See [`GraphKernel::edge_list_version`].
    pub edge_list_version: u64,
    /// Whether live vertex ids have gaps.
    pub vertices_fragmented: bool,
    /// Whether live edge ids have gaps.
    pub edges_fragmented: bool,
    /// Whether bulk loading is in progress.
    pub loading: bool,
}

/// In-memory graph storage kernel.
///
/// Single-threaded: all mutation goes through `&mut self`. Precondition
/// violations such as passing a dead id panic rather than returning errors.
pub struct GraphKernel {
    vertices: ElementTable<VertexRecord>,
    edges: ElementTable<EdgeRecord>,
    vseq: SeqAnchor<VertexId>,
    eseq: SeqAnchor<EdgeId>,
    graph_version: u64,
    next_generation: u64,
    schema: Arc<dyn Schema>,
    growth: GrowthPolicy,
    metrics: Arc<dyn KernelMetrics>,
    listeners: Listeners,
    loading: bool,
}

impl GraphKernel {
    /// Creates an empty kernel.
    ///
    /// Fails with [`GraphError::InvalidCapacity`] when an initial capacity
    /// exceeds the id range.
    pub fn new(options: KernelOptions) -> Result<Self> {
        let KernelOptions {
            schema,
            config,
            metrics,
        } = options;
        let mut vertices = ElementTable::with_capacity("vertex", config.initial_vertex_capacity)?;
        let mut edges = ElementTable::with_capacity("edge", config.initial_edge_capacity)?;
        config.check()?;
        vertices.set_validating(config.validate);
        edges.set_validating(config.validate);
        Ok(Self {
            vertices,
            edges,
            vseq: SeqAnchor::new(),
            eseq: SeqAnchor::new(),
            graph_version: 0,
            next_generation: 0,
            schema,
            growth: config.growth,
            metrics: metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
            listeners: Listeners::default(),
            loading: false,
        })
    }

    /// Schema consulted on creation, relinking and deletion.
    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.schema
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertex ids available before the table must grow.
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Edge ids available before the table must grow.
    pub fn edge_capacity(&self) -> usize {
        self.edges.capacity()
    }

    /// Bumped by every structural mutation.
    pub fn graph_version(&self) -> u64 {
        self.graph_version
    }

    /// Version of the global vertex sequence.
    pub fn vertex_list_version(&self) -> u64 {
        self.vseq.version()
    }

    /// Version of the global edge sequence.
    pub fn edge_list_version(&self) -> u64 {
        self.eseq.version()
    }

    /// Version of `v`'s incidence sequence.
    pub fn incidence_version(&self, v: VertexId) -> u64 {
        self.vertices[v.0].incidences.version()
    }

    /// Whether the kernel is between `begin_loading` and `finish_loading`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Counts, versions and fragmentation in one snapshot.
    pub fn stats(&self) -> KernelStats {
        KernelStats {
            vertex_count: self.vertex_count(),
            edge_count: self.edge_count(),
            vertex_capacity: self.vertex_capacity(),
            edge_capacity: self.edge_capacity(),
            graph_version: self.graph_version,
            vertex_list_version: self.vertex_list_version(),
            edge_list_version: self.edge_list_version(),
            vertices_fragmented: self.vertices.ids().is_fragmented(),
            edges_fragmented: self.edges.ids().is_fragmented(),
            loading: self.is_loading(),
        }
    }

    /// Registers a structure listener.
    pub fn add_listener(&mut self, listener: Box<dyn StructureListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a listener and hands it back.
    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn StructureListener>> {
        self.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // Lookups

    /// Whether `v` names a live vertex.
    pub fn is_vertex_live(&self, v: VertexId) -> bool {
        self.vertices.contains(v.0)
    }

    /// Whether `e` names a live edge.
    pub fn is_edge_live(&self, e: EdgeId) -> bool {
        self.edges.contains(e.0)
    }

    /// Resolves a signed edge id; negative ids denote the reversed end.
    pub fn incidence(&self, signed: i64) -> Option<Incidence> {
        let inc = Incidence::from_signed(signed)?;
        self.is_edge_live(inc.edge()).then_some(inc)
    }

    /// Class of live vertex `v`.
    pub fn vertex_class(&self, v: VertexId) -> ClassTag {
        self.vertices[v.0].class
    }

    /// Class of live edge `e`.
    pub fn edge_class(&self, e: EdgeId) -> ClassTag {
        self.edges[e.0].class
    }

    /// Source vertex of `e`.
    pub fn alpha(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].vertices[0]
    }

    /// Target vertex of `e`.
    pub fn omega(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].vertices[1]
    }

    /// Vertex at `end` of `e`.
    pub fn endpoint(&self, e: EdgeId, end: EdgeEnd) -> VertexId {
        self.edges[e.0].vertices[end.slot()]
    }

    /// The vertex whose incidence sequence holds `inc`.
    pub fn this(&self, inc: Incidence) -> VertexId {
        self.endpoint(inc.edge(), inc.end())
    }

    /// The vertex at the other end of `inc`.
    pub fn that(&self, inc: Incidence) -> VertexId {
        self.endpoint(inc.edge(), inc.end().opposite())
    }

    // Navigation

    /// First vertex passing `filter`.
    pub fn first_vertex(&self, filter: ClassFilter) -> Option<VertexId> {
        self.skip_vertices(self.vseq.first(), filter, |k, v| k.vertices[v.0].next)
    }

    /// Last vertex passing `filter`.
    pub fn last_vertex(&self, filter: ClassFilter) -> Option<VertexId> {
        self.skip_vertices(self.vseq.last(), filter, |k, v| k.vertices[v.0].prev)
    }

    /// Next vertex after `v` passing `filter`.
    pub fn next_vertex(&self, v: VertexId, filter: ClassFilter) -> Option<VertexId> {
        self.skip_vertices(self.vertices[v.0].next, filter, |k, v| k.vertices[v.0].next)
    }

    /// Previous vertex before `v` passing `filter`.
    pub fn prev_vertex(&self, v: VertexId, filter: ClassFilter) -> Option<VertexId> {
        self.skip_vertices(self.vertices[v.0].prev, filter, |k, v| k.vertices[v.0].prev)
    }

    /// First edge passing `filter`.
    pub fn first_edge(&self, filter: ClassFilter) -> Option<EdgeId> {
        self.skip_edges(self.eseq.first(), filter, |k, e| k.edges[e.0].next)
    }

    /// Last edge passing `filter`.
    pub fn last_edge(&self, filter: ClassFilter) -> Option<EdgeId> {
        self.skip_edges(self.eseq.last(), filter, |k, e| k.edges[e.0].prev)
    }

    /// Next edge after `e` passing `filter`.
    pub fn next_edge(&self, e: EdgeId, filter: ClassFilter) -> Option<EdgeId> {
        self.skip_edges(self.edges[e.0].next, filter, |k, e| k.edges[e.0].next)
    }

    /// Previous edge before `e` passing `filter`.
    pub fn prev_edge(&self, e: EdgeId, filter: ClassFilter) -> Option<EdgeId> {
        self.skip_edges(self.edges[e.0].prev, filter, |k, e| k.edges[e.0].prev)
    }

    /// First incidence of `v` matching `direction` and `filter`.
    pub fn first_incidence(
        &self,
        v: VertexId,
        direction: Direction,
        filter: ClassFilter,
    ) -> Option<Incidence> {
        self.skip_incidences(self.vertices[v.0].incidences.first(), direction, filter)
    }

    /// Last incidence of `v` matching `direction` and `filter`.
    pub fn last_incidence(
        &self,
        v: VertexId,
        direction: Direction,
        filter: ClassFilter,
    ) -> Option<Incidence> {
        let mut cursor = self.vertices[v.0].incidences.last();
        while let Some(inc) = cursor {
            if direction.accepts(inc) && filter.matches(self.edges[inc.edge().0].class) {
                return Some(inc);
            }
            cursor = LinkSlots::<Incidence>::prev(&self.edges, inc);
        }
        None
    }

    /// Incidence after `inc` in its vertex's sequence, filtered.
    pub fn next_incidence(
        &self,
        inc: Incidence,
        direction: Direction,
        filter: ClassFilter,
    ) -> Option<Incidence> {
        self.skip_incidences(LinkSlots::<Incidence>::next(&self.edges, inc), direction, filter)
    }

    /// Incidence before `inc` in its vertex's sequence, filtered.
    pub fn prev_incidence(
        &self,
        inc: Incidence,
        direction: Direction,
        filter: ClassFilter,
    ) -> Option<Incidence> {
        let mut cursor = LinkSlots::<Incidence>::prev(&self.edges, inc);
        while let Some(i) = cursor {
            if direction.accepts(i) && filter.matches(self.edges[i.edge().0].class) {
                return Some(i);
            }
            cursor = LinkSlots::<Incidence>::prev(&self.edges, i);
        }
        None
    }

    /// Number of incidences of `v` in `direction`. A self-loop counts twice
    /// for [`Direction::Both`].
    pub fn degree(&self, v: VertexId, direction: Direction) -> usize {
        let anchor = &self.vertices[v.0].incidences;
        match direction {
            Direction::Both => anchor.len(),
            _ => anchor
                .iter(&self.edges)
                .filter(|inc| direction.accepts(*inc))
                .count(),
        }
    }

    /// Incidences of `v` matching both `direction` and `filter`.
    pub fn degree_of(&self, v: VertexId, direction: Direction, filter: ClassFilter) -> usize {
        if filter.is_any() {
            return self.degree(v, direction);
        }
        self.vertices[v.0]
            .incidences
            .iter(&self.edges)
            .filter(|inc| direction.accepts(*inc) && filter.matches(self.edges[inc.edge().0].class))
            .count()
    }

    /// Whether `a` precedes `b` in the vertex sequence.
    pub fn is_vertex_before(&self, a: VertexId, b: VertexId) -> bool {
        self.vseq.is_before(&self.vertices, a, b)
    }

    /// Whether `a` precedes `b` in the edge sequence.
    pub fn is_edge_before(&self, a: EdgeId, b: EdgeId) -> bool {
        self.eseq.is_before(&self.edges, a, b)
    }

    /// Whether `a` precedes `b` in their shared vertex's incidence sequence.
    pub fn is_incidence_before(&self, a: Incidence, b: Incidence) -> bool {
        let v = self.this(a);
        debug_assert_eq!(v, self.this(b), "incidences belong to different vertices");
        self.vertices[v.0].incidences.is_before(&self.edges, a, b)
    }

    // Internal helpers shared by the op modules

    fn skip_vertices(
        &self,
        mut cursor: Option<VertexId>,
        filter: ClassFilter,
        step: impl Fn(&Self, VertexId) -> Option<VertexId>,
    ) -> Option<VertexId> {
        while let Some(v) = cursor {
            if filter.matches(self.vertices[v.0].class) {
                return Some(v);
            }
            cursor = step(self, v);
        }
        None
    }

    fn skip_edges(
        &self,
        mut cursor: Option<EdgeId>,
        filter: ClassFilter,
        step: impl Fn(&Self, EdgeId) -> Option<EdgeId>,
    ) -> Option<EdgeId> {
        while let Some(e) = cursor {
            if filter.matches(self.edges[e.0].class) {
                return Some(e);
            }
            cursor = step(self, e);
        }
        None
    }

    fn skip_incidences(
        &self,
        mut cursor: Option<Incidence>,
        direction: Direction,
        filter: ClassFilter,
    ) -> Option<Incidence> {
        while let Some(inc) = cursor {
            if direction.accepts(inc) && filter.matches(self.edges[inc.edge().0].class) {
                return Some(inc);
            }
            cursor = LinkSlots::<Incidence>::next(&self.edges, inc);
        }
        None
    }

    /// Asks the schema whether `v` may sit at `end` of an edge of `edge_class`.
    fn check_end(&self, edge_class: ClassTag, v: VertexId, end: EdgeEnd) -> Result<()> {
        let vertex_class = self.vertices[v.0].class;
        if self.schema.is_valid_edge_end(edge_class, vertex_class, end) {
            Ok(())
        } else {
            trace!(edge_class = %edge_class, vertex = %v, ?end, "kernel.constraint.rejected");
            Err(GraphError::ConstraintViolation {
                edge_class,
                vertex_class,
                end,
            })
        }
    }

    fn ensure_not_loading(&self) -> Result<()> {
        if self.is_loading() {
            Err(GraphError::Loading)
        } else {
            Ok(())
        }
    }

    fn assert_not_loading(&self, op: &'static str) {
        assert!(!self.is_loading(), "{op} is not allowed in loading mode");
    }
}
