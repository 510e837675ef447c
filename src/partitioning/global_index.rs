//! Ordering-independent global indices for a partitioning range.
//!
//! The graph partitioner needs every element of the range mapped onto a
//! dense `[0, n)` so the CSR graph and the broadcast partition vector line
//! up across processes. The map must not depend on the iteration order of
//! the range — otherwise partitioning would depend on an ordering that
//! itself depends on the previous partitioning.

use crate::mesh::{ElementId, Mesh};
use crate::partitioning::sfc::find_global_indices;
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Bijection from element ids of a range onto `[0, n)`.
#[derive(Clone, Debug, Default)]
pub struct GlobalIndexMap {
    index_of: HashMap<ElementId, usize>,
}

impl GlobalIndexMap {
    /// Build the map for `range` from spatial hints.
    ///
    /// Phase 1 buckets elements per hint in O(n). When every hint is unique
    /// (the common case; element ids are unique and centroids rarely
    /// coincide) the hints are already a dense bijection and are taken as
    /// is. Only when elements overlap spatially does a second O(n log n)
    /// pass run: buckets are walked in ascending hint order, ids ascending
    /// within each bucket, and a fresh dense numbering is assigned — still
    /// a pure function of the element *set*, never of the range order.
    ///
    /// # Panics
    /// Panics if `range` contains a duplicate id (malformed range).
    pub fn build(mesh: &Mesh, range: &[ElementId]) -> Self {
        let n = range.len();
        let bbox = mesh.bounding_box();
        let hints = find_global_indices(&bbox, mesh, range);
        debug_assert_eq!(hints.len(), n);

        let mut buckets: HashMap<usize, Vec<ElementId>> = HashMap::with_capacity(n);
        let mut found_duplicate_hints = false;
        for (&id, &hint) in range.iter().zip(&hints) {
            let bucket = buckets.entry(hint).or_default();
            if !bucket.is_empty() {
                found_duplicate_hints = true;
            }
            bucket.push(id);
        }

        let mut index_of = HashMap::with_capacity(n);
        if found_duplicate_hints {
            let sorted: BTreeMap<usize, Vec<ElementId>> = buckets.into_iter().collect();
            let mut next = 0usize;
            for (_hint, mut ids) in sorted {
                ids.sort_unstable();
                for id in ids {
                    index_of.insert(id, next);
                    next += 1;
                }
            }
        } else {
            for (&id, &hint) in range.iter().zip(&hints) {
                index_of.insert(id, hint);
            }
        }

        assert_eq!(index_of.len(), n, "range contains duplicate element ids");
        let map = GlobalIndexMap { index_of };
        map.debug_check_bijection(n);
        map
    }

    /// Dense index of `id`, or `None` when `id` is outside the range.
    #[inline]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_of.is_empty()
    }

    /// Postcondition check: indices are distinct and fill `[0, n)` exactly.
    fn debug_check_bijection(&self, n: usize) {
        if cfg!(debug_assertions) {
            let mut seen = vec![false; n];
            for &idx in self.index_of.values() {
                assert!(idx < n, "global index {idx} out of range [0, {n})");
                assert!(!seen[idx], "global index {idx} assigned twice");
                seen[idx] = true;
            }
        }
    }
}
