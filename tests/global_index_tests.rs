//! Global index map properties: bijection, order independence, and
//! deterministic deduplication of colliding spatial hints.

use mesh_part::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn assert_bijection(map: &GlobalIndexMap, range: &[ElementId]) {
    assert_eq!(map.len(), range.len());
    let mut seen = vec![false; range.len()];
    for &id in range {
        let idx = map.index_of(id).expect("every range element is mapped");
        assert!(idx < range.len(), "index {idx} out of [0, {})", range.len());
        assert!(!seen[idx], "index {idx} assigned twice");
        seen[idx] = true;
    }
}

#[test]
fn grid_bijection() {
    let (mesh, _) = structured_quad(5, 4).unwrap();
    let range = mesh.active_element_ids();
    let map = GlobalIndexMap::build(&mesh, &range);
    assert_bijection(&map, &range);
}

#[test]
fn shuffled_ranges_give_the_same_bijection() {
    let (mesh, _) = structured_quad(6, 6).unwrap();
    let range = mesh.active_element_ids();
    let reference = GlobalIndexMap::build(&mesh, &range);

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let mut shuffled = range.clone();
        shuffled.shuffle(&mut rng);
        let map = GlobalIndexMap::build(&mesh, &shuffled);
        for &id in &range {
            assert_eq!(map.index_of(id), reference.index_of(id));
        }
    }
}

#[test]
fn colliding_hints_are_resolved_reproducibly() {
    // Stack several elements on the same footprint so their SFC hints are
    // identical, then make sure the tie-break is deterministic.
    let mut mesh = Mesh::new(2);
    let stacked = BoundingBox::from_corners([0.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    let apart = BoundingBox::from_corners([3.0, 0.0, 0.0], [4.0, 1.0, 0.0]);
    let mut range = Vec::new();
    for _ in 0..4 {
        range.push(mesh.add_element(ElementKind::Quad4, stacked));
    }
    range.push(mesh.add_element(ElementKind::Quad4, apart));

    let first = GlobalIndexMap::build(&mesh, &range);
    assert_bijection(&first, &range);

    let mut reversed = range.clone();
    reversed.reverse();
    let second = GlobalIndexMap::build(&mesh, &reversed);
    for &id in &range {
        assert_eq!(first.index_of(id), second.index_of(id));
    }

    // Within the colliding bucket, indices ascend with element id.
    for pair in range[..4].windows(2) {
        assert!(first.index_of(pair[0]).unwrap() < first.index_of(pair[1]).unwrap());
    }
}

#[test]
fn subrange_maps_only_its_elements() {
    let (mesh, grid) = structured_quad(3, 3).unwrap();
    let sub: Vec<ElementId> = grid[0].clone();
    let map = GlobalIndexMap::build(&mesh, &sub);
    assert_bijection(&map, &sub);
    assert!(!map.contains(grid[2][2]));
}

proptest! {
    #[test]
    fn bijection_for_arbitrary_grids(nx in 1usize..7, ny in 1usize..7, seed in any::<u64>()) {
        let (mesh, _) = structured_quad(nx, ny).unwrap();
        let mut range = mesh.active_element_ids();
        let mut rng = StdRng::seed_from_u64(seed);
        range.shuffle(&mut rng);

        let map = GlobalIndexMap::build(&mesh, &range);
        assert_bijection(&map, &range);

        // Rebuilding from the canonical order changes nothing.
        let canonical = GlobalIndexMap::build(&mesh, &mesh.active_element_ids());
        for &id in &range {
            prop_assert_eq!(map.index_of(id), canonical.index_of(id));
        }
    }
}
