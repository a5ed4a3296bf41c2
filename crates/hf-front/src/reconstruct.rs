//! Front reconstruction from a signed-distance field.
//!
//! All methods work on non-channel candidate cells and return one
//! [`TipGeometry`] per cell the front enters, together with its filling
//! fraction. Fully traversed cells are reported with a filling fraction of
//! one and are graduated to the channel by the classifier.

use hf_core::{CellMask, timing::step_timing};
use hf_levelset::plug_holes;
use hf_mesh::CartesianMesh;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::continuous;
use crate::error::{FrontError, FrontResult};
use crate::geometry::{Corner, TipGeometry};

/// Front reconstruction method, fixed for the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMethod {
    /// Zero-vertex value averaged from the four cells around the vertex
    #[default]
    Original,
    /// Normal from the level-set gradient at the cell center
    Gradient,
    /// Closed polylines traced across cell edges
    Continuous,
}

/// One connected front polyline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontLine {
    /// Tip cells in traversal order (cell order for the local methods)
    pub cells: Vec<usize>,
    pub segments: Vec<[[f64; 2]; 2]>,
    pub closed: bool,
}

impl FrontLine {
    /// Unordered front assembled from per-cell segments.
    fn from_tips(mesh: &CartesianMesh, tips: &[TipGeometry], fill: &[f64]) -> Self {
        let mut line = FrontLine::default();
        for (tip, &ff) in tips.iter().zip(fill) {
            if ff >= 1.0 {
                continue;
            }
            if let Some(seg) = tip.segment(mesh) {
                line.cells.push(tip.cell);
                line.segments.push(seg);
            }
        }
        line
    }

    /// Length of the polyline.
    pub fn length(&self) -> f64 {
        self.segments
            .iter()
            .map(|[a, b]| (b[0] - a[0]).hypot(b[1] - a[1]))
            .sum()
    }
}

/// Result of one reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Signed distance after hole plugging
    pub sd: Vec<f64>,
    /// Cells moved inside by hole plugging
    pub plugged: Vec<usize>,
    /// Geometry of every cell the front enters or has passed, ascending by cell
    pub tips: Vec<TipGeometry>,
    /// Filling fraction per entry of `tips`
    pub fill: Vec<f64>,
    pub fronts: Vec<FrontLine>,
}

/// Reconstruct the front over the `band` cells that are not in `channel`.
///
/// `max_iterations` bounds the search-band growth of the continuous method.
pub fn reconstruct_front(
    method: ReconstructionMethod,
    mesh: &CartesianMesh,
    sd: &[f64],
    channel: &[usize],
    band: &[usize],
    max_iterations: usize,
) -> FrontResult<Reconstruction> {
    let _t = step_timing::RECONSTRUCTION.scope();
    let mut sd = sd.to_vec();
    let plugged = plug_holes(mesh, &mut sd);
    if !plugged.is_empty() {
        debug!(cells = ?plugged, "hole plugging moved cells inside");
    }

    let channel_mask = CellMask::from_cells(mesh.num_cells(), channel);
    let candidates: Vec<usize> = band
        .iter()
        .copied()
        .filter(|&c| !channel_mask.contains(c))
        .collect();

    let (tips, fronts) = match method {
        ReconstructionMethod::Original => {
            let tips = collect_tips(&candidates, |c| vertex_local(mesh, &sd, c))?;
            (tips, None)
        }
        ReconstructionMethod::Gradient => {
            let vertices = vertex_field(mesh, &sd);
            let tips = collect_tips(&candidates, |c| gradient(mesh, &sd, &vertices, c))?;
            (tips, None)
        }
        ReconstructionMethod::Continuous => {
            let traced = continuous::trace(mesh, &sd, &channel_mask, &candidates, max_iterations)?;
            (traced.tips, Some(traced.fronts))
        }
    };

    let (hx, hy) = (mesh.hx(), mesh.hy());
    let fill: Vec<f64> = tips.iter().map(|t| t.filling_fraction(hx, hy)).collect();

    let at_boundary: Vec<usize> = tips
        .iter()
        .map(|t| t.cell)
        .filter(|&c| mesh.is_near_boundary(c))
        .collect();
    if !at_boundary.is_empty() {
        return Err(FrontError::ReachedEndOfGrid { cells: at_boundary });
    }

    let fronts = fronts.unwrap_or_else(|| vec![FrontLine::from_tips(mesh, &tips, &fill)]);
    debug!(
        ?method,
        tips = tips.len(),
        fronts = fronts.len(),
        "front reconstructed"
    );
    Ok(Reconstruction {
        sd,
        plugged,
        tips,
        fill,
        fronts,
    })
}

fn collect_tips(
    candidates: &[usize],
    mut f: impl FnMut(usize) -> FrontResult<Option<TipGeometry>>,
) -> FrontResult<Vec<TipGeometry>> {
    let mut tips = Vec::new();
    for &c in candidates {
        if let Some(tip) = f(c)? {
            tips.push(validate(tip)?);
        }
    }
    Ok(tips)
}

pub(crate) fn validate(tip: TipGeometry) -> FrontResult<TipGeometry> {
    if !tip.l.is_finite() || !tip.alpha.is_finite() {
        return Err(FrontError::NotTracked {
            cell: tip.cell,
            what: "non-finite front geometry",
        });
    }
    if tip.l < 0.0 {
        return Err(FrontError::NotTracked {
            cell: tip.cell,
            what: "negative front distance",
        });
    }
    if !(0.0..=std::f64::consts::FRAC_PI_2).contains(&tip.alpha) {
        return Err(FrontError::NotTracked {
            cell: tip.cell,
            what: "front angle out of range",
        });
    }
    Ok(tip)
}

fn non_finite(cell: usize) -> FrontError {
    FrontError::NotTracked {
        cell,
        what: "non-finite level set",
    }
}

/// Vertex-local geometry: the zero vertex faces the lower-valued neighbors
/// and its value is the mean of the four cells sharing it.
pub(crate) fn vertex_local(
    mesh: &CartesianMesh,
    sd: &[f64],
    cell: usize,
) -> FrontResult<Option<TipGeometry>> {
    let [left, right, bottom, top] = mesh.neighbors(cell);
    let x_positive = sd[left] <= sd[right];
    let y_positive = sd[bottom] <= sd[top];
    let nx = if x_positive { left } else { right };
    let ny = if y_positive { bottom } else { top };
    let [diag_left, diag_right, _, _] = mesh.neighbors(ny);
    let nd = if x_positive { diag_left } else { diag_right };

    let (pc, px, py, pd) = (sd[cell], sd[nx], sd[ny], sd[nd]);
    if ![pc, px, py, pd].iter().all(|v| v.is_finite()) {
        return Err(non_finite(cell));
    }
    let phi_vertex = (pc + px + py + pd) / 4.0;
    if phi_vertex >= 0.0 {
        return Ok(None);
    }

    let gx = (((pc - px) + (py - pd)) / (2.0 * mesh.hx())).max(0.0);
    let gy = (((pc - py) + (px - pd)) / (2.0 * mesh.hy())).max(0.0);
    if gx == 0.0 && gy == 0.0 {
        return Err(FrontError::NotTracked {
            cell,
            what: "vanishing level-set gradient",
        });
    }
    Ok(Some(TipGeometry {
        cell,
        zero_vertex: Corner::from_axes(x_positive, y_positive),
        l: -phi_vertex,
        alpha: gy.atan2(gx),
    }))
}

/// Level-set values at the mesh vertices, averaged over the cells sharing
/// each vertex.
pub fn vertex_field(mesh: &CartesianMesh, sd: &[f64]) -> Vec<f64> {
    (0..mesh.num_vertices())
        .map(|v| {
            let (sum, n) = mesh
                .vertex_cells(v)
                .into_iter()
                .flatten()
                .fold((0.0, 0usize), |(s, n), c| (s + sd[c], n + 1));
            sum / n as f64
        })
        .collect()
}

/// Gradient geometry: the normal follows the centered level-set gradient
/// and the zero vertex is the corner opposite to it.
pub(crate) fn gradient(
    mesh: &CartesianMesh,
    sd: &[f64],
    vertices: &[f64],
    cell: usize,
) -> FrontResult<Option<TipGeometry>> {
    let [left, right, bottom, top] = mesh.neighbors(cell);
    let span = |a: usize, b: usize, h: f64| if a == cell || b == cell { h } else { 2.0 * h };
    let gx = (sd[right] - sd[left]) / span(left, right, mesh.hx());
    let gy = (sd[top] - sd[bottom]) / span(bottom, top, mesh.hy());
    if !gx.is_finite() || !gy.is_finite() {
        return Err(non_finite(cell));
    }

    let corner = Corner::from_axes(gx >= 0.0, gy >= 0.0);
    let phi_zero = vertices[mesh.cell_vertices(cell)[corner.index()]];
    if !phi_zero.is_finite() {
        return Err(non_finite(cell));
    }
    if phi_zero >= 0.0 {
        return Ok(None);
    }
    if gx == 0.0 && gy == 0.0 {
        return Err(FrontError::NotTracked {
            cell,
            what: "vanishing level-set gradient",
        });
    }
    Ok(Some(TipGeometry {
        cell,
        zero_vertex: corner,
        l: -phi_zero,
        alpha: gy.abs().atan2(gx.abs()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar_sd(mesh: &CartesianMesh, x0: f64) -> Vec<f64> {
        mesh.centers().iter().map(|p| p[0] - x0).collect()
    }

    #[test]
    fn planar_front_is_recovered() {
        let mesh = CartesianMesh::new(4.0, 4.0, 9, 9).unwrap();
        let sd = planar_sd(&mesh, 0.3);
        let channel: Vec<usize> = (0..mesh.num_cells())
            .filter(|&c| mesh.center(c)[0] < -0.6)
            .collect();
        let band: Vec<usize> = (0..mesh.num_cells())
            .filter(|&c| mesh.ij(c).1 >= 2 && mesh.ij(c).1 <= 6)
            .collect();
        for method in [ReconstructionMethod::Original, ReconstructionMethod::Gradient] {
            let rec = reconstruct_front(method, &mesh, &sd, &channel, &band, 5).unwrap();
            let partial: Vec<&TipGeometry> = rec
                .tips
                .iter()
                .zip(&rec.fill)
                .filter(|(_, f)| **f < 1.0)
                .map(|(t, _)| t)
                .collect();
            assert!(!partial.is_empty());
            for tip in partial {
                assert_eq!(mesh.ij(tip.cell).0, 4, "{method:?}");
                assert!(tip.alpha.abs() < 1e-12);
                assert!((tip.l - 0.8).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn circular_front_reaches_every_corner() {
        let mesh = CartesianMesh::new(4.0, 4.0, 21, 21).unwrap();
        let sd: Vec<f64> = mesh
            .centers()
            .iter()
            .map(|p| p[0].hypot(p[1]) - 2.1)
            .collect();
        let channel: Vec<usize> = (0..mesh.num_cells()).filter(|&c| sd[c] < -0.6).collect();
        let band: Vec<usize> = (0..mesh.num_cells()).collect();
        for method in [ReconstructionMethod::Original, ReconstructionMethod::Gradient] {
            let rec = reconstruct_front(method, &mesh, &sd, &channel, &band, 5).unwrap();
            for corner in Corner::ALL {
                assert!(
                    rec.tips.iter().any(|t| t.zero_vertex == corner),
                    "{method:?} never used {corner:?}"
                );
            }
            for (tip, ff) in rec.tips.iter().zip(&rec.fill) {
                assert!(tip.l.is_finite() && tip.l >= 0.0);
                assert!((0.0..=std::f64::consts::FRAC_PI_2).contains(&tip.alpha));
                assert!(*ff > 0.0 && *ff <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn outside_cells_are_skipped() {
        let mesh = CartesianMesh::new(2.0, 2.0, 5, 5).unwrap();
        let sd = vec![1.0; mesh.num_cells()];
        assert_eq!(vertex_local(&mesh, &sd, mesh.index(2, 2)), Ok(None));
    }

    #[test]
    fn nan_is_not_tracked() {
        let mesh = CartesianMesh::new(2.0, 2.0, 5, 5).unwrap();
        let mut sd = vec![-1.0; mesh.num_cells()];
        sd[mesh.index(1, 2)] = f64::NAN;
        assert!(matches!(
            vertex_local(&mesh, &sd, mesh.index(2, 2)),
            Err(FrontError::NotTracked { .. })
        ));
    }

    #[test]
    fn vertex_field_averages_available_cells() {
        let mesh = CartesianMesh::new(1.0, 1.0, 3, 3).unwrap();
        let sd: Vec<f64> = (0..9).map(|c| c as f64).collect();
        let v = vertex_field(&mesh, &sd);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[mesh.cell_vertices(4)[0]], (0.0 + 1.0 + 3.0 + 4.0) / 4.0);
    }
}
