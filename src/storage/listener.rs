use crate::types::{EdgeId, VertexId};

/// Observer of structural changes to a kernel.
///
/// All methods default to no-ops. Callbacks run synchronously inside the
/// mutating call and are not invoked while the kernel is in loading mode.
pub trait StructureListener {
    /// Called after a vertex joins the graph.
    fn vertex_added(&mut self, _v: VertexId) {}

    /// Called once the vertex is unlinked, before its incident edges go.
    fn vertex_deleted(&mut self, _v: VertexId) {}

    /// Called after an edge is linked.
    fn edge_added(&mut self, _e: EdgeId) {}

    /// Called once an edge is unlinked.
    fn edge_deleted(&mut self, _e: EdgeId) {}

    /// Called after the vertex table grows.
    fn max_vertex_count_increased(&mut self, _new_capacity: usize) {}

    /// Called after the edge table grows.
    fn max_edge_count_increased(&mut self, _new_capacity: usize) {}
}

/// Handle returned by registration, used to unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn StructureListener>)>,
}

impl Listeners {
    pub fn add(&mut self, listener: Box<dyn StructureListener>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<Box<dyn StructureListener>> {
        let pos = self.entries.iter().position(|(lid, _)| *lid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn notify(&mut self, mut f: impl FnMut(&mut dyn StructureListener)) {
        for (_, listener) in self.entries.iter_mut() {
            f(listener.as_mut());
        }
    }
}
