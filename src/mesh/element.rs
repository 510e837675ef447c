//! `ElementId` and the polymorphic element record.
//!
//! Mesh elements are kept in an arena and referenced by a strong, non-zero
//! id. The partitioner never dispatches on concrete element geometry; the
//! record exposes exactly the capability set it needs: neighbor-by-side,
//! active flag, AMR parent/children, interior parent, node count,
//! dimensionality, and a mutable owner attribute.

use crate::error::MeshPartError;
use std::{fmt, num::NonZeroU64};

/// Owning process / partition id written back by the partitioners.
pub type ProcessorId = u32;

/// Strong handle for a mesh element.
///
/// Wraps a `NonZeroU64` so 0 stays reserved as an invalid/sentinel value and
/// `Option<ElementId>` costs nothing extra. `repr(transparent)` guarantees
/// the same layout as `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Creates a new `ElementId`, rejecting the reserved zero value.
    #[inline]
    pub fn new(raw: u64) -> Result<Self, MeshPartError> {
        NonZeroU64::new(raw)
            .map(ElementId)
            .ok_or(MeshPartError::InvalidElementId)
    }

    /// Returns the raw `u64` value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId").field(&self.get()).finish()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Geometric kind of an element.
///
/// `SplineNode` models the spline-node elements of isogeometric meshes: a
/// zero-dimensional carrier for many unconstrained DoFs, which breaks the
/// node-count-implies-work heuristic and gets a special vertex weight in the
/// partition graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ElementKind {
    /// 1D line with two nodes.
    Edge2,
    /// Linear triangle.
    Tri3,
    /// Bilinear quadrilateral.
    Quad4,
    /// Trilinear hexahedron.
    Hex8,
    /// Spline control node (IGA).
    SplineNode,
}

impl ElementKind {
    /// Number of nodes, used as the default vertex-weight proxy.
    pub const fn n_nodes(self) -> usize {
        match self {
            ElementKind::Edge2 => 2,
            ElementKind::Tri3 => 3,
            ElementKind::Quad4 => 4,
            ElementKind::Hex8 => 8,
            ElementKind::SplineNode => 1,
        }
    }

    /// Number of sides, i.e. slots in the neighbor list.
    pub const fn n_sides(self) -> usize {
        match self {
            ElementKind::Edge2 => 2,
            ElementKind::Tri3 => 3,
            ElementKind::Quad4 => 4,
            ElementKind::Hex8 => 6,
            ElementKind::SplineNode => 0,
        }
    }

    /// Topological dimension.
    pub const fn dim(self) -> u8 {
        match self {
            ElementKind::Edge2 => 1,
            ElementKind::Tri3 | ElementKind::Quad4 => 2,
            ElementKind::Hex8 => 3,
            ElementKind::SplineNode => 0,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Axis-aligned bounding box; doubles as the element's spatial footprint.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// The inverted box; union with anything yields that thing.
    pub const fn empty() -> Self {
        BoundingBox {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Box spanning two corner points (per-axis min/max taken).
    pub fn from_corners(a: [f64; 3], b: [f64; 3]) -> Self {
        let mut bb = BoundingBox::empty();
        bb.union_point(a);
        bb.union_point(b);
        bb
    }

    /// Grow to contain `p`.
    pub fn union_point(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Grow to contain `other`.
    pub fn union_box(&mut self, other: &BoundingBox) {
        self.union_point(other.min);
        self.union_point(other.max);
    }

    /// Midpoint of the box.
    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }
}

/// One arena entry. Field mutation goes through [`crate::mesh::Mesh`] so the
/// id maps and symmetric neighbor links stay consistent.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) bbox: BoundingBox,
    pub(crate) neighbors: Vec<Option<ElementId>>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) interior_parent: Option<ElementId>,
    pub(crate) active: bool,
    pub(crate) processor_id: ProcessorId,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, bbox: BoundingBox) -> Self {
        Element {
            kind,
            bbox,
            neighbors: vec![None; kind.n_sides()],
            parent: None,
            children: Vec::new(),
            interior_parent: None,
            active: true,
            processor_id: 0,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn dim(&self) -> u8 {
        self.kind.dim()
    }

    pub fn n_nodes(&self) -> usize {
        self.kind.n_nodes()
    }

    pub fn n_sides(&self) -> usize {
        self.kind.n_sides()
    }

    /// Neighbor across `side`; `None` is a domain boundary.
    pub fn neighbor(&self, side: usize) -> Option<ElementId> {
        self.neighbors[side]
    }

    /// AMR leaf flag: only active elements can be assigned to a partition.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Higher-dimensional host of a lower-dimensional boundary element.
    pub fn interior_parent(&self) -> Option<ElementId> {
        self.interior_parent
    }

    pub fn processor_id(&self) -> ProcessorId {
        self.processor_id
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn centroid(&self) -> [f64; 3] {
        self.bbox.center()
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    // repr(transparent) over NonZeroU64; Option<ElementId> must stay free.
    assert_eq_size!(ElementId, u64);
    assert_eq_size!(Option<ElementId>, u64);
}
