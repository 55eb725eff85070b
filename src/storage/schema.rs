//! The two schema questions the kernel needs answered.
//!
//! Class hierarchies, attribute domains and constraint checking live outside
//! the kernel. Implementations of [`Schema`] answer whether an edge end may
//! attach to a vertex and whether an edge class owns one of its endpoints.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::{ClassTag, EdgeEnd};

/// Ownership carried by an edge class, driving cascading deletes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Ownership {
    /// Deleting either end leaves the other alone.
    #[default]
    None,
    /// The alpha vertex owns the omega vertex: deleting alpha deletes omega.
    OwnsFrom,
    /// The omega vertex owns the alpha vertex: deleting omega deletes alpha.
    OwnsTo,
}

impl Ownership {
    /// The end whose vertex is owned, if any.
    pub fn owned_end(self) -> Option<EdgeEnd> {
        match self {
            Ownership::None => None,
            Ownership::OwnsFrom => Some(EdgeEnd::Omega),
            Ownership::OwnsTo => Some(EdgeEnd::Alpha),
        }
    }
}

/// Schema collaborator consulted on edge creation, relinking, and deletion.
pub trait Schema: Send + Sync {
    /// Whether an edge of `edge_class` may have a `vertex_class` vertex at `end`.
    fn is_valid_edge_end(&self, edge_class: ClassTag, vertex_class: ClassTag, end: EdgeEnd) -> bool;

    /// Ownership carried by edges of `edge_class`.
    fn ownership_kind(&self, edge_class: ClassTag) -> Ownership;
}

/// Accepts every edge end; no class owns anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSchema;

impl Schema for OpenSchema {
    fn is_valid_edge_end(&self, _: ClassTag, _: ClassTag, _: EdgeEnd) -> bool {
        true
    }

    fn ownership_kind(&self, _: ClassTag) -> Ownership {
        Ownership::None
    }
}

/// Table-driven schema.
///
/// Edge classes without registered end rules accept any vertex class.
#[derive(Clone, Debug, Default)]
pub struct TableSchema {
    ends: FxHashMap<(ClassTag, EdgeEnd), FxHashSet<ClassTag>>,
    ownership: FxHashMap<ClassTag, Ownership>,
}

impl TableSchema {
    /// Empty rule table: every end accepted, nothing owned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `edge_class`'s `end` to the given vertex classes.
    pub fn allow_end(
        mut self,
        edge_class: ClassTag,
        end: EdgeEnd,
        vertex_classes: impl IntoIterator<Item = ClassTag>,
    ) -> Self {
        self.ends
            .entry((edge_class, end))
            .or_default()
            .extend(vertex_classes);
        self
    }

    /// Sets the ownership carried by `edge_class`.
    pub fn ownership(mut self, edge_class: ClassTag, ownership: Ownership) -> Self {
        self.ownership.insert(edge_class, ownership);
        self
    }
}

impl Schema for TableSchema {
    fn is_valid_edge_end(
        &self,
        edge_class: ClassTag,
        vertex_class: ClassTag,
        end: EdgeEnd,
    ) -> bool {
        self.ends
            .get(&(edge_class, end))
            .map_or(true, |allowed| allowed.contains(&vertex_class))
    }

    fn ownership_kind(&self, edge_class: ClassTag) -> Ownership {
        self.ownership.get(&edge_class).copied().unwrap_or_default()
    }
}
