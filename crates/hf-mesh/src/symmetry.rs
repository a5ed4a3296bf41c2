//! Quarter symmetry of a mesh centered on the origin.
//!
//! A fracture symmetric about both axes is solved on the cells of the
//! closed positive quadrant only. Interior quadrant cells stand for four
//! mirror cells, cells on a positive half-axis for two, and the center cell
//! for itself; these counts are the volume weights of the active cells.

use crate::error::{MeshError, MeshResult};
use crate::mesh::CartesianMesh;

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterSymmetry {
    nx: usize,
    ny: usize,
    /// Active cells in numbering order
    active: Vec<usize>,
    /// Active representative of every cell
    representative: Vec<usize>,
}

impl QuarterSymmetry {
    pub fn new(mesh: &CartesianMesh) -> MeshResult<Self> {
        let [x0, x1] = mesh.x_limits();
        let [y0, y1] = mesh.y_limits();
        let tol = 1e-9 * (mesh.hx() + mesh.hy());
        if (x0 + x1).abs() > tol || (y0 + y1).abs() > tol {
            return Err(MeshError::NotSymmetric {
                x_limits: [x0, x1],
                y_limits: [y0, y1],
            });
        }
        let (nx, ny) = (mesh.nx(), mesh.ny());
        let (mx, my) = (nx / 2, ny / 2);
        let representative = (0..mesh.num_cells())
            .map(|c| {
                let (i, j) = mesh.ij(c);
                let ri = if i < mx { nx - 1 - i } else { i };
                let rj = if j < my { ny - 1 - j } else { j };
                mesh.index(ri, rj)
            })
            .collect::<Vec<_>>();
        let active = (0..mesh.num_cells())
            .filter(|&c| representative[c] == c)
            .collect();
        Ok(Self {
            nx,
            ny,
            active,
            representative,
        })
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn representative(&self, cell: usize) -> usize {
        self.representative[cell]
    }

    /// Distinct mirror images of `cell`, the cell itself first.
    pub fn mirrors(&self, cell: usize) -> Vec<usize> {
        let (i, j) = (cell % self.nx, cell / self.nx);
        let (fi, fj) = (self.nx - 1 - i, self.ny - 1 - j);
        let mut out = vec![cell];
        for (a, b) in [(fi, j), (i, fj), (fi, fj)] {
            let m = a + self.nx * b;
            if !out.contains(&m) {
                out.push(m);
            }
        }
        out
    }

    /// Number of cells `cell` stands for in the fracture volume.
    pub fn weight(&self, cell: usize) -> f64 {
        self.mirrors(cell).len() as f64
    }
}
