//! Compressed-sparse-row adjacency storage with a two-phase fill.
//!
//! CSR rows are contiguous, so every row width must be known before any
//! value can be written: callers declare widths with [`CsrGraph::prep_row_width`],
//! seal them with [`CsrGraph::finalize_rows`], then write values with
//! [`CsrGraph::set`].

/// CSR triple for the element connectivity graph.
///
/// `offsets[i]..offsets[i+1]` indexes the neighbor list of vertex `i` in
/// `values`. Vertex ids are the dense global indices of
/// [`crate::partitioning::global_index::GlobalIndexMap`].
#[derive(Debug, Clone)]
pub struct CsrGraph {
    /// Row offsets; monotone non-decreasing once finalized, length `n + 1`.
    pub offsets: Vec<usize>,
    /// Concatenated neighbor lists.
    pub values: Vec<usize>,
}

impl CsrGraph {
    /// Graph with `n` vertices and all row widths still zero.
    pub fn with_rows(n: usize) -> Self {
        CsrGraph {
            offsets: vec![0; n + 1],
            values: Vec::new(),
        }
    }

    pub fn n_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total declared edge slots (directed).
    pub fn n_edges(&self) -> usize {
        *self.offsets.last().expect("offsets never empty")
    }

    /// Declare the width of `row`. Each row may be declared once; a second
    /// declaration means the sizing pass visited a vertex twice.
    pub fn prep_row_width(&mut self, row: usize, width: usize) {
        debug_assert_eq!(
            self.offsets[row + 1],
            0,
            "row {row} width declared twice (global indices not unique?)"
        );
        self.offsets[row + 1] = width;
    }

    /// Seal the row widths: prefix-sum the offsets and allocate the value
    /// array. A graph with no edges at all still gets one value slot; the
    /// external partitioning engine crashes on a truly empty adjacency
    /// array.
    pub fn finalize_rows(&mut self) {
        for i in 1..self.offsets.len() {
            self.offsets[i] += self.offsets[i - 1];
        }
        self.values = vec![0; self.n_edges().max(1)];
    }

    /// Write the `k`-th neighbor of `row`. Only valid after
    /// [`Self::finalize_rows`].
    #[inline]
    pub fn set(&mut self, row: usize, k: usize, value: usize) {
        let at = self.offsets[row] + k;
        debug_assert!(
            at < self.offsets[row + 1],
            "write past the declared width of row {row}"
        );
        self.values[at] = value;
    }

    /// Neighbor slice of vertex `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_phase_fill() {
        let mut g = CsrGraph::with_rows(3);
        g.prep_row_width(0, 2);
        g.prep_row_width(1, 1);
        g.prep_row_width(2, 0);
        g.finalize_rows();
        assert_eq!(g.offsets, vec![0, 2, 3, 3]);

        g.set(0, 0, 1);
        g.set(0, 1, 2);
        g.set(1, 0, 0);
        assert_eq!(g.row(0), &[1, 2]);
        assert_eq!(g.row(1), &[0]);
        assert!(g.row(2).is_empty());
        assert_eq!(g.n_edges(), 3);
    }

    #[test]
    fn edgeless_graph_keeps_a_dummy_slot() {
        let mut g = CsrGraph::with_rows(2);
        g.prep_row_width(0, 0);
        g.prep_row_width(1, 0);
        g.finalize_rows();
        assert_eq!(g.n_edges(), 0);
        assert_eq!(g.values.len(), 1);
        assert!(g.row(0).is_empty());
    }
}
