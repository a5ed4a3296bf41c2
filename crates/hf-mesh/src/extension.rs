//! Domain extension when the fracture reaches the end of the grid.
//!
//! The extended mesh keeps the cell size, adds an even number of cells on
//! each requested side (so an origin-centered cell stays centered), and
//! reports where every old cell lands in the new numbering.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{CartesianMesh, Side};

/// Which sides to grow and by how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPlan {
    pub sides: Vec<Side>,
    /// Growth factor of the extent along each extended axis half
    pub factor: f64,
}

/// Result of an extension: the new mesh and the old-to-new cell mapping.
#[derive(Debug, Clone)]
pub struct ExtendedMesh {
    pub mesh: CartesianMesh,
    pub old_to_new: Vec<usize>,
}

impl ExtendedMesh {
    /// Scatter per-cell values of the old mesh into the new numbering,
    /// filling the added cells with `fill`.
    pub fn remap<T: Clone>(&self, old: &[T], fill: T) -> Vec<T> {
        let mut out = vec![fill; self.mesh.num_cells()];
        for (old_cell, &new_cell) in self.old_to_new.iter().enumerate() {
            if let Some(v) = old.get(old_cell) {
                out[new_cell] = v.clone();
            }
        }
        out
    }

    /// Map a cell set of the old mesh, preserving ascending order.
    pub fn remap_cells(&self, cells: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = cells
            .iter()
            .filter_map(|&c| self.old_to_new.get(c).copied())
            .collect();
        out.sort_unstable();
        out
    }
}

/// Sides of the domain that any of `cells` is close to.
pub fn extension_sides_for(mesh: &CartesianMesh, cells: &[usize]) -> Vec<Side> {
    let mut sides = Vec::new();
    for &c in cells {
        let (i, j) = mesh.ij(c);
        let hits = [
            (j <= 1, Side::Bottom),
            (i + 2 >= mesh.nx(), Side::Right),
            (j + 2 >= mesh.ny(), Side::Top),
            (i <= 1, Side::Left),
        ];
        for (hit, side) in hits {
            if hit && !sides.contains(&side) {
                sides.push(side);
            }
        }
    }
    sides
}

fn cells_to_add(count: usize, factor: f64) -> usize {
    let raw = ((factor - 1.0) * count as f64 / 2.0).ceil() as usize;
    let even = raw + raw % 2;
    even.max(2)
}

impl CartesianMesh {
    /// Grow the domain on the requested sides.
    pub fn extend(&self, plan: &ExtensionPlan) -> MeshResult<ExtendedMesh> {
        if !(plan.factor > 1.0) || !plan.factor.is_finite() {
            return Err(MeshError::InvalidExtension {
                factor: plan.factor,
            });
        }
        let add_x = cells_to_add(self.nx(), plan.factor);
        let add_y = cells_to_add(self.ny(), plan.factor);
        let grow = |side| if plan.sides.contains(&side) { 1 } else { 0 };
        let (left, right) = (add_x * grow(Side::Left), add_x * grow(Side::Right));
        let (bottom, top) = (add_y * grow(Side::Bottom), add_y * grow(Side::Top));

        let [xmin, xmax] = self.x_limits();
        let [ymin, ymax] = self.y_limits();
        let mesh = CartesianMesh::with_limits(
            [xmin - left as f64 * self.hx(), xmax + right as f64 * self.hx()],
            [ymin - bottom as f64 * self.hy(), ymax + top as f64 * self.hy()],
            self.nx() + left + right,
            self.ny() + bottom + top,
        )?;

        let old_to_new = (0..self.num_cells())
            .map(|c| {
                let (i, j) = self.ij(c);
                mesh.index(i + left, j + bottom)
            })
            .collect();

        Ok(ExtendedMesh { mesh, old_to_new })
    }
}
