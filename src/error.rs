//! Error handling for kernel operations.
//!
//! Recoverable failures surface as [`GraphError`] through the [`Result`]
//! alias. Programmer errors (double frees, touching a dead id, moving an
//! incidence between vertices) are not represented here: they are guarded by
//! assertions and panic, the same way out-of-bounds slice indexing does.

use std::io;

use thiserror::Error;

use crate::types::{ClassTag, EdgeEnd};

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while mutating or iterating a graph kernel.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The schema refused to attach an edge of `edge_class` to a vertex of
    /// `vertex_class` at the given end.
    ///
    /// Raised by edge creation and relinking before any state is touched, so
    /// the caller may pick another vertex and retry.
    #[error("constraint violation: edge class {edge_class} cannot have a {vertex_class} vertex at its {end:?} end")]
    ConstraintViolation {
        /// Class of the edge being attached.
        edge_class: ClassTag,
        /// Class of the refused vertex.
        vertex_class: ClassTag,
        /// End being attached.
        end: EdgeEnd,
    },

    /// A growth target was not strictly greater than the current capacity,
    /// or exceeded the addressable id range.
    #[error("invalid capacity: requested {requested}, current {current}")]
    InvalidCapacity {
        /// Capacity asked for.
        requested: usize,
        /// Capacity at the time of the request.
        current: usize,
    },

    /// A detached cursor observed a structural change to the sequence it was
    /// walking. The graph is intact; restart the iteration.
    #[error("stale iterator: {0} changed since the cursor was created")]
    StaleIterator(&'static str),

    /// A bulk-load call was made while the kernel was not in loading mode.
    #[error("kernel is not in loading mode")]
    NotLoading,

    /// The call is not allowed while the kernel is in loading mode.
    #[error("kernel is in loading mode")]
    Loading,

    /// Invalid argument, configuration value, or load payload.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration text could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl GraphError {
    /// Whether the caller can reasonably retry after adjusting its input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GraphError::Io(_))
    }
}

impl From<toml::de::Error> for GraphError {
    fn from(err: toml::de::Error) -> Self {
        GraphError::Config(err.to_string())
    }
}
