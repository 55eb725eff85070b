//! Bulk loading with externally supplied ids.
//!
//! A loader calls [`GraphKernel::begin_loading`], places every vertex and
//! edge with [`GraphKernel::load_vertex`] / [`GraphKernel::load_edge`], and
//! finishes with [`GraphKernel::finish_loading`], which links all incidence
//! sequences at once from two parallel arrays:
//!
//! - `first_incidence[v]`: signed edge id of the first incidence of vertex
//!   `v`, or 0 if it has none. Length: vertex capacity + 1.
//! - `next_incidence[incidence_slot(i)]`: signed edge id following incidence
//!   `i` in its vertex's sequence, or 0 at the end. Length: 2 * (edge
//!   capacity + 1).
//!
//! Element placement neither bumps versions per call nor notifies listeners.
//! Counts include placed elements right away; the free lists are rebuilt and
//! every version counter is bumped once at the end.

use tracing::info;

use super::{EdgeRecord, GraphKernel, VertexRecord};
use crate::error::{GraphError, Result};
use crate::types::{ClassTag, EdgeEnd, EdgeId, Incidence, VertexId};

/// Position of `inc` in a `next_incidence` load array.
pub fn incidence_slot(inc: Incidence) -> usize {
    inc.edge().0 as usize * 2 + inc.end().slot()
}

impl GraphKernel {
    /// Enters loading mode. Normal creation fails with
    /// [`GraphError::Loading`] until [`Self::finish_loading`] returns.
    pub fn begin_loading(&mut self) -> Result<()> {
        if self.is_loading() {
            return Err(GraphError::Loading);
        }
        self.loading = true;
        Ok(())
    }

    /// Places a vertex at `id`, growing the table as needed. Loaded vertices
    /// join the vertex sequence in load order.
    pub fn load_vertex(&mut self, id: VertexId, class: ClassTag) -> Result<()> {
        if !self.is_loading() {
            return Err(GraphError::NotLoading);
        }
        if id.0 == 0 || self.vertices.contains(id.0) {
            return Err(GraphError::InvalidArgument(format!(
                "vertex id {} is reserved or already loaded",
                id.0
            )));
        }
        self.reserve_vertex_slot(id.0 as usize)?;
        let generation = self.take_generation();
        self.vertices.place(id.0, VertexRecord::new(class, generation));
        self.vseq.link_last(&mut self.vertices, id);
        Ok(())
    }

    /// Places an edge at `id` between two loaded vertices. Its incidences
    /// stay unlinked until [`Self::finish_loading`].
    pub fn load_edge(
        &mut self,
        id: EdgeId,
        class: ClassTag,
        alpha: VertexId,
        omega: VertexId,
    ) -> Result<()> {
        if !self.is_loading() {
            return Err(GraphError::NotLoading);
        }
        if id.0 == 0 || self.edges.contains(id.0) {
            return Err(GraphError::InvalidArgument(format!(
                "edge id {} is reserved or already loaded",
                id.0
            )));
        }
        for v in [alpha, omega] {
            if !self.is_vertex_live(v) {
                return Err(GraphError::InvalidArgument(format!(
                    "edge {} references unknown vertex {}",
                    id.0, v.0
                )));
            }
        }
        self.check_end(class, alpha, EdgeEnd::Alpha)?;
        self.check_end(class, omega, EdgeEnd::Omega)?;
        self.reserve_edge_slot(id.0 as usize)?;
        self.edges.place(id.0, EdgeRecord::new(class, alpha, omega));
        self.eseq.link_last(&mut self.edges, id);
        Ok(())
    }

    /// Links every incidence sequence from the load arrays and leaves
    /// loading mode.
    ///
    /// The arrays are validated before anything is linked: every chain must
    /// belong to its vertex and every edge end must appear exactly once. On
    /// error the kernel stays in loading mode.
    pub fn finish_loading(
        &mut self,
        first_incidence: &[i64],
        next_incidence: &[i64],
    ) -> Result<()> {
        if !self.is_loading() {
            return Err(GraphError::NotLoading);
        }
        // `place` leaves the id lists behind; index placed slots first.
        self.vertices.rebuild_ids();
        self.edges.rebuild_ids();
        self.check_load_arrays(first_incidence, next_incidence)?;

        for id in 1..=self.edges.capacity() as u32 {
            if !self.edges.contains(id) {
                continue;
            }
            let record = &mut self.edges[id];
            for end in [EdgeEnd::Alpha, EdgeEnd::Omega] {
                let slot = incidence_slot(Incidence::new(EdgeId(id), end));
                record.ends[end.slot()].next = Incidence::from_signed(next_incidence[slot]);
            }
        }
        for id in 1..=self.vertices.capacity() as u32 {
            if !self.vertices.contains(id) {
                continue;
            }
            let head = Incidence::from_signed(first_incidence[id as usize]);
            self.vertices[id].incidences.adopt_chain(&mut self.edges, head);
        }

        self.vseq.bump();
        self.eseq.bump();
        self.graph_version += 1;
        self.loading = false;
        info!(
            vertices = self.vertex_count(),
            edges = self.edge_count(),
            "kernel.load.finished"
        );
        Ok(())
    }

    fn check_load_arrays(&self, first_incidence: &[i64], next_incidence: &[i64]) -> Result<()> {
        let vertex_len = self.vertices.capacity() + 1;
        let edge_len = 2 * (self.edges.capacity() + 1);
        if first_incidence.len() != vertex_len || next_incidence.len() != edge_len {
            return Err(GraphError::InvalidArgument(format!(
                "load arrays must have lengths {vertex_len} and {edge_len}, got {} and {}",
                first_incidence.len(),
                next_incidence.len()
            )));
        }
        let invalid = |msg: String| Err(GraphError::InvalidArgument(msg));
        let mut seen = vec![false; edge_len];
        let mut linked = 0usize;
        for (v, &raw_head) in first_incidence.iter().enumerate().skip(1) {
            let live = self.vertices.contains(v as u32);
            if !live {
                if raw_head != 0 {
                    return invalid(format!("vertex {v} is not loaded but has incidences"));
                }
                continue;
            }
            let mut raw = raw_head;
            while raw != 0 {
                let Some(inc) = Incidence::from_signed(raw) else {
                    return invalid(format!("incidence value {raw} is out of range"));
                };
                if !self.edges.contains(inc.edge().0) {
                    return invalid(format!("incidence {inc} names an unloaded edge"));
                }
                if self.this(inc).0 as usize != v {
                    return invalid(format!("incidence {inc} listed under vertex {v}"));
                }
                let slot = incidence_slot(inc);
                if seen[slot] {
                    return invalid(format!("incidence {inc} appears twice"));
                }
                seen[slot] = true;
                linked += 1;
                raw = next_incidence[slot];
            }
        }
        if linked != 2 * self.edges.len() {
            return invalid(format!(
                "{linked} incidences linked but {} edges need {}",
                self.edges.len(),
                2 * self.edges.len()
            ));
        }
        Ok(())
    }

    fn reserve_vertex_slot(&mut self, id: usize) -> Result<()> {
        let current = self.vertices.capacity();
        if id > current {
            self.expand_vertices(self.growth.next_capacity(current).max(id))?;
        }
        Ok(())
    }

    fn reserve_edge_slot(&mut self, id: usize) -> Result<()> {
        let current = self.edges.capacity();
        if id > current {
            self.expand_edges(self.growth.next_capacity(current).max(id))?;
        }
        Ok(())
    }
}
