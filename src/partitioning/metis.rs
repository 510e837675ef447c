//! METIS-backed graph partitioner.
//!
//! Orchestrates the full pipeline: global index assignment, CSR graph
//! construction, the METIS call on the coordinating process, the broadcast
//! of the partition vector, and the scatter back onto element owners.
//!
//! The engine is optional at build time (`metis-support`). Without it the
//! partitioner substitutes [`crate::partitioning::SfcPartitioner`] under
//! the identical contract,
//! announcing the substitution once per process rather than once per call.

use crate::algs::communicator::Communicator;
use crate::mesh::{ElementId, Mesh};
#[cfg(not(feature = "metis-support"))]
use crate::partitioning::sfc_partitioner::SfcPartitioner;
use crate::partitioning::{Partitioner, single_partition_range};
use hashbrown::HashMap;
use std::sync::Once;

static GATHER_WARNING: Once = Once::new();
#[cfg(not(feature = "metis-support"))]
static FALLBACK_NOTICE: Once = Once::new();

/// Graph partitioner driven by METIS (recursive bisection or k-way).
#[derive(Debug, Default)]
pub struct MetisPartitioner {
    weights: Option<HashMap<ElementId, i64>>,
}

impl MetisPartitioner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for MetisPartitioner {
    fn partition_range<C: Communicator>(
        &mut self,
        mesh: &mut Mesh,
        range: &[ElementId],
        n_pieces: usize,
        comm: &C,
    ) {
        if range.is_empty() {
            return;
        }
        assert!(n_pieces > 0, "cannot partition into zero pieces");
        if n_pieces == 1 {
            single_partition_range(mesh, range);
            return;
        }

        // The graph algorithm needs global visibility of the element graph;
        // a distributed mesh is gathered first (collective).
        if !mesh.is_serial() {
            GATHER_WARNING.call_once(|| {
                log::warn!("forced to gather a distributed mesh for graph partitioning");
            });
            mesh.allgather(comm)
                .unwrap_or_else(|e| panic!("mesh gather failed: {e}"));
        }

        #[cfg(not(feature = "metis-support"))]
        {
            FALLBACK_NOTICE.call_once(|| {
                log::warn!(
                    "built without METIS support; using the space-filling-curve \
                     partitioner instead"
                );
            });
            let mut sfc = SfcPartitioner::new();
            if let Some(w) = self.weights.clone() {
                sfc.attach_weights(w);
            }
            sfc.partition_range(mesh, range, n_pieces, comm);
        }

        #[cfg(feature = "metis-support")]
        {
            self.partition_graph(mesh, range, n_pieces, comm);
        }
    }

    fn attach_weights(&mut self, weights: HashMap<ElementId, i64>) {
        self.weights = Some(weights);
    }
}

#[cfg(feature = "metis-support")]
impl MetisPartitioner {
    /// The non-trivial path: index, build, invoke, broadcast, apply.
    fn partition_graph<C: Communicator>(
        &self,
        mesh: &mut Mesh,
        range: &[ElementId],
        n_pieces: usize,
        comm: &C,
    ) {
        use crate::algs::communicator::broadcast_vec;
        use crate::partitioning::adjacency::build_element_graph;
        use crate::partitioning::apply_partition;
        use crate::partitioning::global_index::GlobalIndexMap;
        use metis::Idx;

        let n = range.len();

        // Dense, ordering-independent indexing of the range; identical on
        // every process (the mesh is replicated at this point).
        let map = GlobalIndexMap::build(mesh, range);
        assert_eq!(map.len(), n);

        // The engine runs on the coordinating process only; everyone else
        // keeps a zeroed vector of the right length for the broadcast.
        let mut part: Vec<Idx> = vec![0; n];
        if comm.rank() == 0 {
            let (graph, vwgt) = build_element_graph(mesh, range, &map, self.weights.as_ref());

            let mut xadj: Vec<Idx> = graph.offsets.iter().map(|&v| v as Idx).collect();
            let mut adjncy: Vec<Idx> = graph.values.iter().map(|&v| v as Idx).collect();
            let mut vwgt: Vec<Idx> = vwgt.iter().map(|&w| w as Idx).collect();

            let graph = metis::Graph::new(1, n_pieces as Idx, &mut xadj, &mut adjncy)
                .set_vwgt(&mut vwgt);

            // Recursive bisection gives better cuts for few parts; k-way
            // scales better beyond that.
            let result = if n_pieces <= 8 {
                graph.part_recursive(&mut part)
            } else {
                graph.part_kway(&mut part)
            };
            if let Err(e) = result {
                panic!("METIS partitioning failed: {e}");
            }
        }

        // Collective: every rank calls this, including rank 0.
        broadcast_vec(comm, 0, &mut part);

        apply_partition(mesh, range, &map, &part, n_pieces);
    }
}
