//! Space-filling-curve partitioner.
//!
//! Orders the range along a Morton curve and cuts it into `n_pieces`
//! weight-balanced contiguous chunks. Needs no connectivity graph and no
//! external engine; quality is lower than a graph partition but the
//! external contract is identical, which is what makes it a drop-in
//! fallback for [`crate::partitioning::MetisPartitioner`].

use crate::algs::communicator::Communicator;
use crate::mesh::{ElementId, Mesh, ProcessorId};
use crate::partitioning::adjacency::element_weight;
use crate::partitioning::sfc::morton_key;
use crate::partitioning::{Partitioner, single_partition_range};
use hashbrown::HashMap;

/// Deterministic spatial partitioner (SFC-order bisection).
#[derive(Debug, Default)]
pub struct SfcPartitioner {
    weights: Option<HashMap<ElementId, i64>>,
}

impl SfcPartitioner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for SfcPartitioner {
    fn partition_range<C: Communicator>(
        &mut self,
        mesh: &mut Mesh,
        range: &[ElementId],
        n_pieces: usize,
        _comm: &C,
    ) {
        if range.is_empty() {
            return;
        }
        assert!(n_pieces > 0, "cannot partition into zero pieces");
        if n_pieces == 1 {
            single_partition_range(mesh, range);
            return;
        }

        // Sort by (curve position, id): deterministic even when elements
        // overlap spatially and share a key.
        let bbox = mesh.bounding_box();
        let mut order: Vec<(u64, ElementId)> = range
            .iter()
            .map(|&id| (morton_key(&bbox, mesh.element(id).centroid()), id))
            .collect();
        order.sort_unstable();

        let total: i64 = order
            .iter()
            .map(|&(_, id)| element_weight(mesh, id, self.weights.as_ref()))
            .sum();

        // Proportional cut: an element goes to the piece its cumulative
        // weight midpoint falls into.
        let mut cum = 0i64;
        for &(_, id) in &order {
            let w = element_weight(mesh, id, self.weights.as_ref());
            let mid = 2 * cum + w;
            let piece = ((mid as i128 * n_pieces as i128) / (2 * total).max(1) as i128) as usize;
            mesh.set_processor_id(id, piece.min(n_pieces - 1) as ProcessorId);
            cum += w;
        }
    }

    fn attach_weights(&mut self, weights: HashMap<ElementId, i64>) {
        self.weights = Some(weights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::mesh::generation::structured_quad;

    fn part_counts(mesh: &Mesh, range: &[ElementId], n_pieces: usize) -> Vec<usize> {
        let mut counts = vec![0usize; n_pieces];
        for &id in range {
            counts[mesh.processor_id(id) as usize] += 1;
        }
        counts
    }

    #[test]
    fn four_by_four_into_four_is_balanced() {
        let (mut mesh, _) = structured_quad(4, 4).unwrap();
        let range = mesh.active_element_ids();
        SfcPartitioner::new().partition_range(&mut mesh, &range, 4, &NoComm);

        let counts = part_counts(&mesh, &range, 4);
        assert!(counts.iter().all(|&c| c > 0), "every piece used: {counts:?}");
        // Equal weights: proportional cuts land exactly on quarters.
        assert_eq!(counts, vec![4, 4, 4, 4]);
    }

    #[test]
    fn deterministic_across_runs_and_orders() {
        let (mut a, _) = structured_quad(5, 3).unwrap();
        let (mut b, _) = structured_quad(5, 3).unwrap();
        let range_a = a.active_element_ids();
        let mut range_b = b.active_element_ids();
        range_b.reverse();

        SfcPartitioner::new().partition_range(&mut a, &range_a, 3, &NoComm);
        SfcPartitioner::new().partition_range(&mut b, &range_b, 3, &NoComm);
        for &id in &range_a {
            assert_eq!(a.processor_id(id), b.processor_id(id));
        }
    }

    #[test]
    fn one_piece_short_circuits() {
        let (mut mesh, _) = structured_quad(2, 2).unwrap();
        let range = mesh.active_element_ids();
        SfcPartitioner::new().partition_range(&mut mesh, &range, 1, &NoComm);
        assert!(range.iter().all(|&id| mesh.processor_id(id) == 0));
    }

    #[test]
    fn weight_override_shifts_the_cuts() {
        let (mut mesh, grid) = structured_quad(4, 1).unwrap();
        let range = mesh.active_element_ids();
        let mut weights = HashMap::new();
        for row in &grid {
            for &id in row {
                weights.insert(id, 1i64);
            }
        }
        // One element dominates: it deserves a piece of its own.
        weights.insert(grid[0][0], 100);
        let mut p = SfcPartitioner::new();
        p.attach_weights(weights);
        p.partition_range(&mut mesh, &range, 2, &NoComm);

        let heavy = mesh.processor_id(grid[0][0]);
        let light: Vec<_> = [grid[0][1], grid[0][2], grid[0][3]]
            .iter()
            .map(|&id| mesh.processor_id(id))
            .collect();
        assert!(light.iter().all(|&p| p != heavy));
    }

    #[test]
    #[should_panic(expected = "zero pieces")]
    fn zero_pieces_is_a_caller_bug() {
        let (mut mesh, _) = structured_quad(2, 1).unwrap();
        let range = mesh.active_element_ids();
        SfcPartitioner::new().partition_range(&mut mesh, &range, 0, &NoComm);
    }
}
