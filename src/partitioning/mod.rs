//! Entry-point for mesh partitioning.
//!
//! The pipeline: [`global_index::GlobalIndexMap`] renumbers a range of
//! elements onto a dense, ordering-independent `[0, n)`; [`adjacency`]
//! builds the CSR connectivity graph over those indices; the
//! [`metis::MetisPartitioner`] runs the external engine on the coordinating
//! process and broadcasts the result; [`apply_partition`] scatters partition
//! ids back onto the elements. [`sfc_partitioner::SfcPartitioner`] is the
//! graph-free fallback behind the same [`Partitioner`] surface.

pub mod adjacency;
pub mod csr;
pub mod global_index;
pub mod metis;
pub mod metrics;
pub mod sfc;
pub mod sfc_partitioner;

pub use adjacency::build_element_graph;
pub use csr::CsrGraph;
pub use global_index::GlobalIndexMap;
pub use metis::MetisPartitioner;
pub use sfc_partitioner::SfcPartitioner;

use crate::algs::communicator::Communicator;
use crate::mesh::{ElementId, Mesh, ProcessorId};
use hashbrown::HashMap;

/// Partitioning strategy interface.
///
/// Implementations assign every element of a range an owner in
/// `[0, n_pieces)`. Calls are collective when the communicator spans more
/// than one process, and carry no state between invocations: the mesh may
/// have changed arbitrarily (AMR, rebalancing) since the previous call.
pub trait Partitioner {
    /// Partition the elements of `range` into `n_pieces`.
    ///
    /// # Panics
    /// Panics if `n_pieces == 0` (caller programming error).
    fn partition_range<C: Communicator>(
        &mut self,
        mesh: &mut Mesh,
        range: &[ElementId],
        n_pieces: usize,
        comm: &C,
    );

    /// Partition the mesh's full active-element range.
    fn partition<C: Communicator>(&mut self, mesh: &mut Mesh, n_pieces: usize, comm: &C) {
        let range = mesh.active_element_ids();
        self.partition_range(mesh, &range, n_pieces, comm);
    }

    /// Supply per-element weights overriding the node-count heuristic.
    /// Default: ignored (not every strategy is weight-aware).
    fn attach_weights(&mut self, _weights: HashMap<ElementId, i64>) {}
}

/// The trivial one-piece partition: everything in `range` goes to owner 0.
/// No index map or graph is built.
pub fn single_partition_range(mesh: &mut Mesh, range: &[ElementId]) {
    for &id in range {
        mesh.set_processor_id(id, 0);
    }
}

/// Scatter a broadcast partition vector back onto the elements.
///
/// `part` is indexed by the dense global index; every element of `range`
/// receives a definite owner. Validity (`< n_pieces`) is asserted — an
/// out-of-range id means the engine and the map disagree about `n`.
pub fn apply_partition(
    mesh: &mut Mesh,
    range: &[ElementId],
    map: &GlobalIndexMap,
    part: &[i32],
    n_pieces: usize,
) {
    for &id in range {
        let index = map
            .index_of(id)
            .unwrap_or_else(|| panic!("element {id} missing from its global index map"));
        assert!(index < part.len(), "partition vector shorter than the range");
        let pid = part[index];
        assert!(
            (0..n_pieces as i32).contains(&pid),
            "partition id {pid} out of range [0, {n_pieces})"
        );
        mesh.set_processor_id(id, pid as ProcessorId);
    }
}
