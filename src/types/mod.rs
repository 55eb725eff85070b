//! Identifier newtypes shared by every kernel structure.
//!
//! Vertices and edges are addressed by dense `u32` ids starting at 1; the value
//! 0 is never handed out. An [`Incidence`] names one end of an edge as a signed
//! edge id: positive for the normal (alpha) end, negative for the reversed
//! (omega) end.

use std::fmt;

/// Dense vertex id. 0 is reserved.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u32);
/// Dense edge id. 0 is reserved.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u32);

/// Opaque schema-owned class of a vertex or edge.
///
/// The kernel stores and compares tags, it never interprets them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ClassTag(pub u32);

/// Which end of an edge an incidence represents.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EdgeEnd {
    /// Source end; the incidence sits in the alpha vertex's sequence.
    Alpha,
    /// Target end; the incidence sits in the omega vertex's sequence.
    Omega,
}

impl EdgeEnd {
    /// The other end.
    pub const fn opposite(self) -> Self {
        match self {
            EdgeEnd::Alpha => EdgeEnd::Omega,
            EdgeEnd::Omega => EdgeEnd::Alpha,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            EdgeEnd::Alpha => 0,
            EdgeEnd::Omega => 1,
        }
    }
}

/// Direction filter applied when walking a vertex's incidences.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Direction {
    /// Incidences where the vertex is alpha.
    Out,
    /// Incidences where the vertex is omega.
    In,
    /// Every incidence.
    #[default]
    Both,
}

impl Direction {
    /// Whether `inc` passes this direction.
    pub fn accepts(self, inc: Incidence) -> bool {
        match self {
            Direction::Out => inc.is_normal(),
            Direction::In => !inc.is_normal(),
            Direction::Both => true,
        }
    }
}

/// One end of an edge, encoded as a signed edge id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Incidence(i64);

impl Incidence {
    /// Incidence for `end` of `edge`.
    pub fn new(edge: EdgeId, end: EdgeEnd) -> Self {
        debug_assert!(edge.0 != 0, "edge id 0 is reserved");
        let raw = i64::from(edge.0);
        match end {
            EdgeEnd::Alpha => Incidence(raw),
            EdgeEnd::Omega => Incidence(-raw),
        }
    }

    /// Alpha end of `edge`.
    pub fn normal(edge: EdgeId) -> Self {
        Self::new(edge, EdgeEnd::Alpha)
    }

    /// Omega end of `edge`.
    pub fn reversed_of(edge: EdgeId) -> Self {
        Self::new(edge, EdgeEnd::Omega)
    }

    /// Decodes a signed edge id, returning `None` for 0 or out-of-range values.
    pub fn from_signed(raw: i64) -> Option<Self> {
        if raw == 0 || raw.unsigned_abs() > u64::from(u32::MAX) {
            None
        } else {
            Some(Incidence(raw))
        }
    }

    /// Signed encoding: `+e` for alpha, `-e` for omega.
    pub fn signed(self) -> i64 {
        self.0
    }

    /// The edge this incidence belongs to.
    pub fn edge(self) -> EdgeId {
        EdgeId(self.0.unsigned_abs() as u32)
    }

    /// Which end of the edge this is.
    pub fn end(self) -> EdgeEnd {
        if self.0 > 0 {
            EdgeEnd::Alpha
        } else {
            EdgeEnd::Omega
        }
    }

    /// Whether this is the alpha end.
    pub fn is_normal(self) -> bool {
        self.0 > 0
    }

    /// The other end of the same edge.
    pub fn reversed(self) -> Self {
        Incidence(-self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for Incidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_normal() {
            write!(f, "+e{}", self.0)
        } else {
            write!(f, "-e{}", -self.0)
        }
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClassTag {
    fn from(value: u32) -> Self {
        ClassTag(value)
    }
}

impl From<ClassTag> for u32 {
    fn from(value: ClassTag) -> Self {
        value.0
    }
}

impl From<EdgeId> for Incidence {
    fn from(edge: EdgeId) -> Self {
        Incidence::normal(edge)
    }
}
