//! Iteration over the global sequences and incidence sequences.
//!
//! Two flavours are offered. The borrowing iterators ([`VertexIter`],
//! [`EdgeIter`], [`IncidenceIter`]) hold `&GraphKernel`, so the borrow checker
//! rules out mutation while they are alive. The cursors ([`VertexCursor`],
//! [`EdgeCursor`], [`IncidenceCursor`]) hold no borrow; they snapshot the
//! version of the sequence they walk and fail with
//! [`GraphError::StaleIterator`] once it moves.

use super::GraphKernel;
use crate::error::{GraphError, Result};
use crate::types::{ClassTag, Direction, EdgeId, Incidence, VertexId};

/// Class predicate applied during iteration and navigation.
#[derive(Clone, Copy, Debug, Default)]
pub enum ClassFilter {
    /// Every class.
    #[default]
    Any,
    /// Exactly this class.
    Exact(ClassTag),
    /// Arbitrary predicate, e.g. "this class or any subclass" as decided by
    /// the schema layer.
    Matching(fn(ClassTag) -> bool),
}

impl ClassFilter {
    /// Whether `class` passes the filter.
    pub fn matches(&self, class: ClassTag) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Exact(tag) => *tag == class,
            ClassFilter::Matching(pred) => pred(class),
        }
    }

    /// True for [`ClassFilter::Any`].
    pub fn is_any(&self) -> bool {
        matches!(self, ClassFilter::Any)
    }
}

impl From<ClassTag> for ClassFilter {
    fn from(tag: ClassTag) -> Self {
        ClassFilter::Exact(tag)
    }
}

/// Borrowing iterator over the vertex sequence.
pub struct VertexIter<'a> {
    kernel: &'a GraphKernel,
    next: Option<VertexId>,
    filter: ClassFilter,
}

impl Iterator for VertexIter<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        let v = self.next?;
        self.next = self.kernel.next_vertex(v, self.filter);
        Some(v)
    }
}

/// Borrowing iterator over the edge sequence.
pub struct EdgeIter<'a> {
    kernel: &'a GraphKernel,
    next: Option<EdgeId>,
    filter: ClassFilter,
}

impl Iterator for EdgeIter<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let e = self.next?;
        self.next = self.kernel.next_edge(e, self.filter);
        Some(e)
    }
}

/// Borrowing iterator over one vertex's incidences.
pub struct IncidenceIter<'a> {
    kernel: &'a GraphKernel,
    next: Option<Incidence>,
    direction: Direction,
    filter: ClassFilter,
}

impl Iterator for IncidenceIter<'_> {
    type Item = Incidence;

    fn next(&mut self) -> Option<Incidence> {
        let inc = self.next?;
        self.next = self.kernel.next_incidence(inc, self.direction, self.filter);
        Some(inc)
    }
}

/// Detached, fail-fast walk over the global vertex sequence.
#[derive(Clone, Debug)]
pub struct VertexCursor {
    filter: ClassFilter,
    version: u64,
    next: Option<VertexId>,
}

impl VertexCursor {
    /// Whether another matching vertex follows.
    pub fn has_next(&self, kernel: &GraphKernel) -> Result<bool> {
        self.check(kernel)?;
        Ok(self.next.is_some())
    }

    /// Advances to the next matching vertex.
    pub fn next(&mut self, kernel: &GraphKernel) -> Result<Option<VertexId>> {
        self.check(kernel)?;
        let Some(v) = self.next else {
            return Ok(None);
        };
        self.next = kernel.next_vertex(v, self.filter);
        Ok(Some(v))
    }

    /// Restarts from the head of the current sequence.
    pub fn reset(&mut self, kernel: &GraphKernel) {
        *self = kernel.vertex_cursor(self.filter);
    }

    fn check(&self, kernel: &GraphKernel) -> Result<()> {
        if kernel.vseq.version() != self.version {
            return Err(GraphError::StaleIterator("vertex sequence"));
        }
        Ok(())
    }
}

/// Detached, fail-fast walk over the global edge sequence.
#[derive(Clone, Debug)]
pub struct EdgeCursor {
    filter: ClassFilter,
    version: u64,
    next: Option<EdgeId>,
}

impl EdgeCursor {
    /// Whether another matching edge follows.
    pub fn has_next(&self, kernel: &GraphKernel) -> Result<bool> {
        self.check(kernel)?;
        Ok(self.next.is_some())
    }

    /// Advances to the next matching edge.
    pub fn next(&mut self, kernel: &GraphKernel) -> Result<Option<EdgeId>> {
        self.check(kernel)?;
        let Some(e) = self.next else {
            return Ok(None);
        };
        self.next = kernel.next_edge(e, self.filter);
        Ok(Some(e))
    }

    /// Restarts from the head with a fresh version snapshot.
    pub fn reset(&mut self, kernel: &GraphKernel) {
        *self = kernel.edge_cursor(self.filter);
    }

    fn check(&self, kernel: &GraphKernel) -> Result<()> {
        if kernel.eseq.version() != self.version {
            return Err(GraphError::StaleIterator("edge sequence"));
        }
        Ok(())
    }
}

/// Detached, fail-fast walk over one vertex's incidence sequence.
///
/// Goes stale when the sequence changes or when the vertex is deleted, even
/// if its id has since been reused.
#[derive(Clone, Debug)]
pub struct IncidenceCursor {
    vertex: VertexId,
    generation: u64,
    direction: Direction,
    filter: ClassFilter,
    version: u64,
    next: Option<Incidence>,
}

impl IncidenceCursor {
    /// Vertex whose incidences are walked.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Whether another matching incidence follows.
    pub fn has_next(&self, kernel: &GraphKernel) -> Result<bool> {
        self.check(kernel)?;
        Ok(self.next.is_some())
    }

    /// Advances to the next matching incidence.
    pub fn next(&mut self, kernel: &GraphKernel) -> Result<Option<Incidence>> {
        self.check(kernel)?;
        let Some(inc) = self.next else {
            return Ok(None);
        };
        self.next = kernel.next_incidence(inc, self.direction, self.filter);
        Ok(Some(inc))
    }

    /// Restarts from the first incidence. Fails if the vertex is gone.
    pub fn reset(&mut self, kernel: &GraphKernel) -> Result<()> {
        if !self.vertex_matches(kernel) {
            return Err(GraphError::StaleIterator("incidence sequence"));
        }
        *self = kernel.incidence_cursor(self.vertex, self.direction, self.filter);
        Ok(())
    }

    fn vertex_matches(&self, kernel: &GraphKernel) -> bool {
        kernel
            .vertices
            .get(self.vertex.0)
            .is_some_and(|record| record.generation == self.generation)
    }

    fn check(&self, kernel: &GraphKernel) -> Result<()> {
        let fresh = self.vertex_matches(kernel)
            && kernel.vertices[self.vertex.0].incidences.version() == self.version;
        if !fresh {
            return Err(GraphError::StaleIterator("incidence sequence"));
        }
        Ok(())
    }
}

impl GraphKernel {
    /// Vertices passing `filter`, in sequence order.
    pub fn vertices(&self, filter: ClassFilter) -> VertexIter<'_> {
        VertexIter {
            kernel: self,
            next: self.first_vertex(filter),
            filter,
        }
    }

    /// Edges passing `filter`, in sequence order.
    pub fn edges(&self, filter: ClassFilter) -> EdgeIter<'_> {
        EdgeIter {
            kernel: self,
            next: self.first_edge(filter),
            filter,
        }
    }

    /// Incidences of `v` in sequence order.
    pub fn incidences(
        &self,
        v: VertexId,
        direction: Direction,
        filter: ClassFilter,
    ) -> IncidenceIter<'_> {
        IncidenceIter {
            kernel: self,
            next: self.first_incidence(v, direction, filter),
            direction,
            filter,
        }
    }

    /// Detached cursor over the vertex sequence.
    pub fn vertex_cursor(&self, filter: ClassFilter) -> VertexCursor {
        VertexCursor {
            filter,
            version: self.vseq.version(),
            next: self.first_vertex(filter),
        }
    }

    /// Detached cursor over the edge sequence.
    pub fn edge_cursor(&self, filter: ClassFilter) -> EdgeCursor {
        EdgeCursor {
            filter,
            version: self.eseq.version(),
            next: self.first_edge(filter),
        }
    }

    /// # Panics
    ///
    /// If `v` is not live.
    pub fn incidence_cursor(
        &self,
        v: VertexId,
        direction: Direction,
        filter: ClassFilter,
    ) -> IncidenceCursor {
        let record = &self.vertices[v.0];
        IncidenceCursor {
            vertex: v,
            generation: record.generation,
            direction,
            filter,
            version: record.incidences.version(),
            next: self.first_incidence(v, direction, filter),
        }
    }
}
