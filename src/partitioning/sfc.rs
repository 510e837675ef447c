//! Space-filling-curve hints for element ordering.
//!
//! Each element gets a Morton (z-order) key from its centroid, normalized
//! into the mesh bounding box with 21 bits per axis. Nearby elements get
//! nearby keys, so orderings derived from them are spatially coherent even
//! before any graph algorithm runs. Elements with coincident centroids get
//! *identical* keys; resolving such collisions is the job of
//! [`crate::partitioning::global_index::GlobalIndexMap`].

use crate::mesh::{BoundingBox, ElementId, Mesh};

const SFC_BITS: u32 = 21;
const SFC_SCALE: f64 = ((1u64 << SFC_BITS) - 1) as f64;

/// Spread the low 21 bits of `v` so consecutive bits land 3 apart.
#[inline]
fn spread3(v: u64) -> u64 {
    let mut x = v & 0x1f_ffff;
    x = (x | x << 32) & 0x1f00000000ffff;
    x = (x | x << 16) & 0x1f0000ff0000ff;
    x = (x | x << 8) & 0x100f00f00f00f00f;
    x = (x | x << 4) & 0x10c30c30c30c30c3;
    x = (x | x << 2) & 0x1249249249249249;
    x
}

/// Morton key of `point` inside `bbox`. Coordinates outside the box clamp
/// to its faces; a zero-extent axis contributes nothing.
pub fn morton_key(bbox: &BoundingBox, point: [f64; 3]) -> u64 {
    let mut key = 0u64;
    for axis in 0..3 {
        let extent = bbox.max[axis] - bbox.min[axis];
        let t = if extent > 0.0 {
            ((point[axis] - bbox.min[axis]) / extent).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cell = (t * SFC_SCALE) as u64;
        key |= spread3(cell) << axis;
    }
    key
}

/// Dense spatial indices for `range`, in range order.
///
/// Each element's index is the rank of its Morton key among the *distinct*
/// keys of the range. Elements with equal keys therefore receive equal
/// indices — the collision is surfaced to the caller rather than hidden, so
/// the global index map can deduplicate deterministically. When all keys
/// are distinct the result is a bijection onto `[0, n)`.
pub fn find_global_indices(bbox: &BoundingBox, mesh: &Mesh, range: &[ElementId]) -> Vec<usize> {
    let keys: Vec<u64> = range
        .iter()
        .map(|&id| morton_key(bbox, mesh.element(id).centroid()))
        .collect();

    let mut distinct = keys.clone();
    distinct.sort_unstable();
    distinct.dedup();

    keys.iter()
        .map(|k| {
            distinct
                .binary_search(k)
                .expect("key vanished from its own sort")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generation::structured_quad;

    fn unit_bbox() -> BoundingBox {
        BoundingBox::from_corners([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
    }

    #[test]
    fn keys_monotone_along_axis() {
        let bb = unit_bbox();
        let a = morton_key(&bb, [0.1, 0.0, 0.0]);
        let b = morton_key(&bb, [0.6, 0.0, 0.0]);
        assert!(a < b);
    }

    #[test]
    fn coincident_points_share_a_key() {
        let bb = unit_bbox();
        assert_eq!(
            morton_key(&bb, [0.3, 0.7, 0.0]),
            morton_key(&bb, [0.3, 0.7, 0.0])
        );
    }

    #[test]
    fn out_of_box_points_clamp() {
        let bb = unit_bbox();
        assert_eq!(morton_key(&bb, [-5.0, 0.0, 0.0]), morton_key(&bb, [0.0; 3]));
    }

    #[test]
    fn grid_indices_are_dense_without_collisions() {
        let (mesh, _) = structured_quad(3, 3).unwrap();
        let range = mesh.active_element_ids();
        let idx = find_global_indices(&mesh.bounding_box(), &mesh, &range);
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..9).collect::<Vec<_>>());
    }
}
