//! `MeshPartError`: unified error type for mesh-part public APIs.
//!
//! Fallible operations are those that validate caller-supplied input while a
//! mesh is being built or modified (element insertion, neighbor wiring,
//! refinement, gathering). Invariant violations detected *inside* the
//! partitioning pipeline are programming errors upstream and abort via
//! assertions instead of surfacing here.

use crate::mesh::ElementId;
use thiserror::Error;

/// Unified error type for mesh-part operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshPartError {
    /// Attempted to construct an `ElementId` with the reserved zero value.
    #[error("ElementId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidElementId,
    /// An element id was not found in the mesh arena.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    /// A side index was out of range for the element's kind.
    #[error("side {side} out of range for element {element} with {n_sides} sides")]
    InvalidSide {
        element: ElementId,
        side: usize,
        n_sides: usize,
    },
    /// An element was wired as its own neighbor.
    #[error("element {0} cannot be its own neighbor")]
    SelfNeighbor(ElementId),
    /// Refinement was requested on an element kind that does not support it.
    #[error("element {element} of kind {kind} cannot be refined")]
    NotRefinable { element: ElementId, kind: String },
    /// Refinement was requested on an element that is already inactive.
    #[error("element {0} is inactive and cannot be refined again")]
    AlreadyRefined(ElementId),
    /// An interior parent assignment violated the dimensionality contract.
    #[error("interior parent of {element} must have strictly higher dimension")]
    InvalidInteriorParent { element: ElementId },
    /// Mesh generation was asked for a degenerate shape.
    #[error("invalid mesh geometry: {0}")]
    InvalidGeometry(String),
    /// Element records could not be encoded or decoded during a gather.
    #[error("element exchange failed: {0}")]
    Exchange(String),
}
