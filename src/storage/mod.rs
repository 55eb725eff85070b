//! Graph storage kernel and the data structures beneath it.
//!
//! Leaves first: [`FreeIndexList`] tracks used ids as signed runs,
//! [`ElementTable`] stores records by id, [`SeqAnchor`] links records into
//! sequences, and [`GraphKernel`] keeps all of them consistent.

/// Run-length encoded id allocation.
pub mod free_index;

/// Id-indexed record storage with a growth policy.
pub mod table;

/// Intrusive doubly linked sequences.
pub mod sequence;

/// Schema collaborator interface.
pub mod schema;

mod kernel;
mod listener;
mod metrics;
mod options;

pub use free_index::FreeIndexList;
pub use kernel::{
    incidence_slot, ClassFilter, DefragStats, EdgeCursor, EdgeIter, EdgeView, GraphKernel,
    IncidenceCursor, IncidenceIter, IncidenceView, KernelStats, VertexCursor, VertexIter,
    VertexView, VerifyReport,
};
pub use listener::{ListenerId, StructureListener};
pub use metrics::{CounterMetrics, CounterSnapshot, ElementKind, KernelMetrics, NoopMetrics};
pub use options::{KernelConfig, KernelOptions};
pub use schema::{OpenSchema, Ownership, Schema, TableSchema};
pub use sequence::{LinkSlots, SeqAnchor, SeqIter};
pub use table::{ElementTable, GrowthPolicy, MAX_CAPACITY};
