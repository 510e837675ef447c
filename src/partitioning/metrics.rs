//! Partition quality metrics, intended for debugging, testing, and CI
//! validation of partitioning results.

use crate::mesh::ProcessorId;
use crate::partitioning::csr::CsrGraph;

/// Number of directed adjacency slots whose endpoints land in different
/// parts (O(E)).
///
/// The element graph is not guaranteed to be exactly symmetric (hanging
/// nodes can produce one-sided links), so this counts directed crossings
/// rather than halving; on a symmetric graph it is twice the undirected
/// edge cut.
pub fn edge_cut(graph: &CsrGraph, part: &[ProcessorId]) -> usize {
    assert_eq!(part.len(), graph.n_vertices());
    let mut cut = 0;
    for i in 0..graph.n_vertices() {
        for &j in graph.row(i) {
            if part[i] != part[j] {
                cut += 1;
            }
        }
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> CsrGraph {
        let mut g = CsrGraph::with_rows(n);
        for i in 0..n {
            let width = usize::from(i > 0) + usize::from(i + 1 < n);
            g.prep_row_width(i, width);
        }
        g.finalize_rows();
        for i in 0..n {
            let mut k = 0;
            if i > 0 {
                g.set(i, k, i - 1);
                k += 1;
            }
            if i + 1 < n {
                g.set(i, k, i + 1);
            }
        }
        g
    }

    #[test]
    fn path_cut_counts_crossings() {
        let g = path_graph(4);
        assert_eq!(edge_cut(&g, &[0, 0, 1, 1]), 2);
        assert_eq!(edge_cut(&g, &[0, 1, 0, 1]), 6);
        assert_eq!(edge_cut(&g, &[0, 0, 0, 0]), 0);
    }
}
