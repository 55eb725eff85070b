//! Trellis: an in-memory graph storage kernel.
//!
//! Vertices and edges live in id-indexed tables backed by run-length encoded
//! free lists. Every element belongs to a global sequence, and every vertex
//! owns a sequence of incidences (edge ends). Structural changes are tracked
//! by version counters so callers can detect staleness cheaply.
//!
//! ```
//! use trellis::{ClassFilter, ClassTag, Direction, GraphKernel, KernelOptions};
//!
//! let mut kernel = GraphKernel::new(KernelOptions::default())?;
//! let a = kernel.create_vertex(ClassTag(1))?;
//! let b = kernel.create_vertex(ClassTag(1))?;
//! kernel.create_edge(ClassTag(10), a, b)?;
//! assert_eq!(kernel.degree(a, Direction::Out), 1);
//! assert_eq!(kernel.vertices(ClassFilter::Any).count(), 2);
//! # Ok::<(), trellis::GraphError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod storage;
pub mod types;

pub use error::{GraphError, Result};
pub use storage::{
    ClassFilter, GraphKernel, KernelConfig, KernelOptions, Ownership, Schema, StructureListener,
    TableSchema,
};
pub use types::{ClassTag, Direction, EdgeEnd, EdgeId, Incidence, VertexId};
