//! Structured mesh generators for tests and examples.

use crate::error::MeshPartError;
use crate::mesh::{BoundingBox, ElementId, ElementKind, Mesh};

/// Build an `nx` × `ny` grid of unit `Quad4` elements with symmetric
/// neighbor wiring. Element `(i, j)` spans `[i, i+1] × [j, j+1]`; ids are
/// assigned row-major from the lower-left corner.
pub fn structured_quad(nx: usize, ny: usize) -> Result<(Mesh, Vec<Vec<ElementId>>), MeshPartError> {
    if nx == 0 || ny == 0 {
        return Err(MeshPartError::InvalidGeometry(format!(
            "structured_quad needs positive extents, got {nx}x{ny}"
        )));
    }

    let mut mesh = Mesh::new(2);
    let mut grid = vec![vec![]; ny];
    for j in 0..ny {
        for i in 0..nx {
            let bbox = BoundingBox::from_corners(
                [i as f64, j as f64, 0.0],
                [(i + 1) as f64, (j + 1) as f64, 0.0],
            );
            grid[j].push(mesh.add_element(ElementKind::Quad4, bbox));
        }
    }

    // Quad side order: 0 bottom, 1 right, 2 top, 3 left.
    for j in 0..ny {
        for i in 0..nx {
            if i + 1 < nx {
                mesh.set_neighbors(grid[j][i], 1, grid[j][i + 1], 3)?;
            }
            if j + 1 < ny {
                mesh.set_neighbors(grid[j][i], 2, grid[j + 1][i], 0)?;
            }
        }
    }

    Ok((mesh, grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two_interior_degrees() {
        let (mesh, grid) = structured_quad(2, 2).unwrap();
        assert_eq!(mesh.n_elements(), 4);
        for row in &grid {
            for &id in row {
                let n = mesh.element(id).neighbors.iter().flatten().count();
                assert_eq!(n, 2, "corner element {id} should touch 2 others");
            }
        }
    }

    #[test]
    fn row_strip_wiring() {
        let (mesh, grid) = structured_quad(3, 1).unwrap();
        assert_eq!(mesh.element(grid[0][1]).neighbor(3), Some(grid[0][0]));
        assert_eq!(mesh.element(grid[0][1]).neighbor(1), Some(grid[0][2]));
        assert_eq!(mesh.element(grid[0][0]).neighbor(0), None);
    }

    #[test]
    fn degenerate_extent_rejected() {
        assert!(structured_quad(0, 3).is_err());
    }
}
