//! # mesh-part
//!
//! mesh-part is a Rust library for graph-based mesh partitioning in finite
//! element and PDE codes. It turns an unstructured element adjacency graph
//! — including non-conforming AMR refinement and interior/boundary element
//! coupling — into a balanced multi-way partition, with element numbering
//! that is independent of iteration order and consistent across processes.
//!
//! ## Features
//! - Element arena with AMR parent/child bookkeeping and interior-parent
//!   links for embedded boundary elements
//! - Ordering-independent global element indexing from space-filling-curve
//!   hints, with deterministic deduplication of colliding hints
//! - Two-pass CSR connectivity graph construction with node-count (or
//!   user-supplied) vertex weights
//! - METIS-backed partitioning (`metis-support`) with a transparent
//!   space-filling-curve fallback behind the same `Partitioner` trait
//! - Pluggable collective communication (serial, MPI via `mpi-support`)
//!   following a strict all-ranks-call broadcast discipline
//!
//! ## Determinism
//!
//! Partition results depend on the element *set*, never on the order a
//! range is iterated in: global indices break space-filling-curve ties by
//! element id, and the fallback partitioner sorts on (curve key, id). The
//! METIS heuristic itself is the only accepted source of nondeterminism.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-part = "0.1"
//! # Optional features:
//! # features = ["metis-support", "mpi-support"]
//! ```

pub mod algs;
pub mod error;
pub mod mesh;
pub mod partitioning;

pub use error::MeshPartError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::error::MeshPartError;
    pub use crate::mesh::generation::structured_quad;
    pub use crate::mesh::{BoundingBox, Element, ElementId, ElementKind, Mesh, ProcessorId};
    pub use crate::partitioning::{
        CsrGraph, GlobalIndexMap, MetisPartitioner, Partitioner, SfcPartitioner,
        build_element_graph, single_partition_range,
    };
}
