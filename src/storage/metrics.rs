use std::sync::atomic::{AtomicU64, Ordering};

/// Element family an aggregate event applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// The vertex table.
    Vertex,
    /// The edge table.
    Edge,
}

/// Trait for tracking kernel operations.
///
/// Implementations collect counts of element creation and deletion, cascade
/// sizes, and storage reshaping. The kernel calls these synchronously on the
/// mutating path, so implementations should be cheap.
pub trait KernelMetrics: Send + Sync {
    /// Records one vertex creation.
    fn vertex_created(&self);

    /// Records one vertex deletion.
    fn vertex_deleted(&self);

    /// Records one edge creation.
    fn edge_created(&self);

    /// Records one edge deletion.
    fn edge_deleted(&self);

    /// Records a cascading vertex delete that removed `vertices` vertices in total.
    fn cascade_deleted(&self, vertices: u64);

    /// Records a capacity expansion of the given table.
    fn expanded(&self, kind: ElementKind);

    /// Records a defragmentation pass that renumbered `moved` elements.
    fn defragmented(&self, kind: ElementKind, moved: u64);
}

/// A no-op implementation of [`KernelMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl KernelMetrics for NoopMetrics {
    fn vertex_created(&self) {}
    fn vertex_deleted(&self) {}
    fn edge_created(&self) {}
    fn edge_deleted(&self) {}
    fn cascade_deleted(&self, _vertices: u64) {}
    fn expanded(&self, _kind: ElementKind) {}
    fn defragmented(&self, _kind: ElementKind, _moved: u64) {}
}

/// Atomic counter implementation of [`KernelMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Vertices created.
    pub vertices_created: AtomicU64,
    /// Vertices deleted.
    pub vertices_deleted: AtomicU64,
    /// Edges created.
    pub edges_created: AtomicU64,
    /// Edges deleted.
    pub edges_deleted: AtomicU64,
    /// Number of cascading deletes that removed more than the requested vertex.
    pub cascades: AtomicU64,
    /// Vertex table expansions.
    pub vertex_expansions: AtomicU64,
    /// Edge table expansions.
    pub edge_expansions: AtomicU64,
    /// Elements renumbered across all defragmentation passes.
    pub elements_moved: AtomicU64,
}

impl KernelMetrics for CounterMetrics {
    fn vertex_created(&self) {
        self.vertices_created.fetch_add(1, Ordering::Relaxed);
    }

    fn vertex_deleted(&self) {
        self.vertices_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn edge_created(&self) {
        self.edges_created.fetch_add(1, Ordering::Relaxed);
    }

    fn edge_deleted(&self) {
        self.edges_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn cascade_deleted(&self, vertices: u64) {
        if vertices > 1 {
            self.cascades.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn expanded(&self, kind: ElementKind) {
        match kind {
            ElementKind::Vertex => self.vertex_expansions.fetch_add(1, Ordering::Relaxed),
            ElementKind::Edge => self.edge_expansions.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn defragmented(&self, _kind: ElementKind, moved: u64) {
        self.elements_moved.fetch_add(moved, Ordering::Relaxed);
    }
}

impl CounterMetrics {
    /// Copies the current counter values.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            vertices_created: self.vertices_created.load(Ordering::Relaxed),
            vertices_deleted: self.vertices_deleted.load(Ordering::Relaxed),
            edges_created: self.edges_created.load(Ordering::Relaxed),
            edges_deleted: self.edges_deleted.load(Ordering::Relaxed),
            cascades: self.cascades.load(Ordering::Relaxed),
            vertex_expansions: self.vertex_expansions.load(Ordering::Relaxed),
            edge_expansions: self.edge_expansions.load(Ordering::Relaxed),
            elements_moved: self.elements_moved.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Vertices created.
    pub vertices_created: u64,
    /// Vertices deleted.
    pub vertices_deleted: u64,
    /// Edges created.
    pub edges_created: u64,
    /// Edges deleted.
    pub edges_deleted: u64,
    /// Cascading deletes.
    pub cascades: u64,
    /// Vertex table expansions.
    pub vertex_expansions: u64,
    /// Edge table expansions.
    pub edge_expansions: u64,
    /// Elements renumbered by defragmentation.
    pub elements_moved: u64,
}
