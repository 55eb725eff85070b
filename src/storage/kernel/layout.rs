use tracing::{debug, info};

use super::GraphKernel;
use crate::error::Result;
use crate::storage::metrics::ElementKind;
use crate::types::{EdgeEnd, EdgeId, Incidence, VertexId};

/// Outcome of [`GraphKernel::defragment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefragStats {
    /// Vertices renumbered.
    pub vertices_moved: usize,
    /// Edges renumbered.
    pub edges_moved: usize,
    /// Vertex capacity after shrinking.
    pub vertex_capacity: usize,
    /// Edge capacity after shrinking.
    pub edge_capacity: usize,
}

impl GraphKernel {
    /// Grows the vertex table to `new_capacity` ids, keeping every id and
    /// record in place.
    ///
    /// Fails with [`crate::GraphError::InvalidCapacity`] unless
    /// `new_capacity` is strictly greater than the current capacity.
    pub fn expand_vertices(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.vertices.capacity();
        self.vertices.expand(new_capacity)?;
        debug!(from = current, to = new_capacity, "kernel.expand.vertices");
        if !self.is_loading() {
            self.notify_vertex_growth(new_capacity);
        }
        Ok(())
    }

    /// Grows the edge table to `new_capacity` ids.
    pub fn expand_edges(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.edges.capacity();
        self.edges.expand(new_capacity)?;
        debug!(from = current, to = new_capacity, "kernel.expand.edges");
        if !self.is_loading() {
            self.notify_edge_growth(new_capacity);
        }
        Ok(())
    }

    /// Renumbers live vertices and edges to the contiguous ranges
    /// `1..=count` and shrinks both tables to exactly the live count.
    ///
    /// Relative sequence order is preserved; every id above the live count
    /// changes, so previously obtained ids and cursors must be discarded.
    pub fn defragment(&mut self) -> DefragStats {
        self.assert_not_loading("defragment");
        let mut stats = DefragStats::default();
        while let Some((from, to)) = self.vertices.next_compaction_move() {
            self.move_vertex(VertexId(from), VertexId(to));
            stats.vertices_moved += 1;
        }
        self.vertices.shrink_to_live();
        while let Some((from, to)) = self.edges.next_compaction_move() {
            self.move_edge(EdgeId(from), EdgeId(to));
            stats.edges_moved += 1;
        }
        self.edges.shrink_to_live();
        stats.vertex_capacity = self.vertices.capacity();
        stats.edge_capacity = self.edges.capacity();
        self.graph_version += 1;
        self.metrics
            .defragmented(ElementKind::Vertex, stats.vertices_moved as u64);
        self.metrics
            .defragmented(ElementKind::Edge, stats.edges_moved as u64);
        info!(
            vertices_moved = stats.vertices_moved,
            edges_moved = stats.edges_moved,
            vertex_capacity = stats.vertex_capacity,
            edge_capacity = stats.edge_capacity,
            "kernel.defragment.completed"
        );
        stats
    }

    fn move_vertex(&mut self, from: VertexId, to: VertexId) {
        self.vertices.relocate(from.0, to.0);
        self.vseq.rename(&mut self.vertices, from, to);
        let mut cursor = self.vertices[to.0].incidences.first();
        while let Some(inc) = cursor {
            self.edges[inc.edge().0].vertices[inc.end().slot()] = to;
            cursor = self.raw_next_incidence(inc);
        }
    }

    fn move_edge(&mut self, from: EdgeId, to: EdgeId) {
        self.edges.relocate(from.0, to.0);
        let record = &mut self.edges[to.0];
        // A self-loop may link its two ends to each other.
        let rename = |link: &mut Option<Incidence>| {
            if let Some(inc) = *link {
                if inc.edge() == from {
                    *link = Some(Incidence::new(to, inc.end()));
                }
            }
        };
        for end in record.ends.iter_mut() {
            rename(&mut end.prev);
            rename(&mut end.next);
        }
        self.eseq.rename(&mut self.edges, from, to);
        for end in [EdgeEnd::Alpha, EdgeEnd::Omega] {
            let v = self.edges[to.0].vertices[end.slot()];
            self.vertices[v.0].incidences.rename(
                &mut self.edges,
                Incidence::new(from, end),
                Incidence::new(to, end),
            );
        }
    }
}
