//! Narrow band selection and hole plugging.

use hf_core::CellMask;
use hf_mesh::CartesianMesh;

/// Cells within reach of the front as seen from the ribbon cells.
///
/// Each ribbon cell contributes a disk of radius `|φ| + 2.5·diag`
/// (`+ 1.5·diag` while `|φ|` is below one cell size). Outside cells enclosed
/// on three or more sides by the band are added to it.
pub fn front_region(mesh: &CartesianMesh, sd: &[f64], ribbon: &[usize]) -> Vec<usize> {
    let diag = mesh.cell_diag();
    let mut mask = CellMask::new(mesh.num_cells());
    for &r in ribbon {
        let d = sd[r].abs();
        let radius = if d > mesh.hx() && d > mesh.hy() {
            d + 2.5 * diag
        } else {
            d + 1.5 * diag
        };
        for c in mesh.cells_inside_circle(mesh.center(r), radius) {
            mask.insert(c);
        }
    }

    let plugged: Vec<usize> = (0..mesh.num_cells())
        .filter(|&c| !mask.contains(c) && enclosed_count(mesh, c, |n| mask.contains(n)) >= 3)
        .collect();
    for c in plugged {
        mask.insert(c);
    }
    mask.to_cells()
}

/// Reclassify exterior cells (`φ ≥ 0`) with interior values on three or more
/// of their four sides as interior.
///
/// The new value is the mean of the interior neighbors. This is a heuristic
/// against single-cell notches in the reconstructed footprint; it is applied
/// once (no cascading) and returns the cells it changed.
pub fn plug_holes(mesh: &CartesianMesh, sd: &mut [f64]) -> Vec<usize> {
    let changes: Vec<(usize, f64)> = (0..mesh.num_cells())
        .filter(|&c| sd[c] >= 0.0)
        .filter_map(|c| {
            let inside: Vec<f64> = distinct_neighbors(mesh, c)
                .filter(|&n| sd[n] < 0.0)
                .map(|n| sd[n])
                .collect();
            (inside.len() >= 3).then(|| (c, inside.iter().sum::<f64>() / inside.len() as f64))
        })
        .collect();
    for &(c, v) in &changes {
        sd[c] = v;
    }
    changes.into_iter().map(|(c, _)| c).collect()
}

fn distinct_neighbors(mesh: &CartesianMesh, cell: usize) -> impl Iterator<Item = usize> {
    mesh.neighbors(cell).into_iter().filter(move |&n| n != cell)
}

fn enclosed_count(mesh: &CartesianMesh, cell: usize, inside: impl Fn(usize) -> bool) -> usize {
    distinct_neighbors(mesh, cell).filter(|&n| inside(n)).count()
}
