//! Stagnant tip cells: opening from the stress intensity factor implied by
//! the neighboring ribbon cell.

use hf_core::CellMask;
use hf_front::TipGeometry;
use hf_mesh::CartesianMesh;

use crate::asymptote::{TipAsymptote, TipParams};
use crate::error::{TipError, TipResult};

/// Ribbon cell among the eight neighbors of `tip_cell` lying deepest inside
/// the fracture.
pub fn ribbon_for_tip(
    mesh: &CartesianMesh,
    tip_cell: usize,
    ribbon: &CellMask,
    sd: &[f64],
) -> TipResult<usize> {
    mesh.neighbors8(tip_cell)
        .into_iter()
        .filter(|&n| n != tip_cell && ribbon.contains(n))
        .min_by(|&a, &b| sd[a].total_cmp(&sd[b]))
        .ok_or(TipError::RibbonNotFound { cell: tip_cell })
}

/// `K_I' = E'·w / √d` for a ribbon cell with opening `w` at distance `d`
/// from the front.
pub fn stagnant_kprime(e_prime: f64, ribbon_width: f64, ribbon_distance: f64) -> f64 {
    e_prime * ribbon_width / ribbon_distance.sqrt()
}

/// Volume of a stagnant tip cell from the toughness asymptote driven by the
/// ribbon cell's stress intensity factor.
pub fn stagnant_tip_volume(
    mesh: &CartesianMesh,
    tip: &TipGeometry,
    ribbon: &CellMask,
    sd: &[f64],
    width: &[f64],
    params: &TipParams,
) -> TipResult<f64> {
    let r = ribbon_for_tip(mesh, tip.cell, ribbon, sd)?;
    let distance = -sd[r];
    if !(distance > 0.0) {
        return Err(TipError::RibbonNotFound { cell: tip.cell });
    }
    let k_prime = stagnant_kprime(params.e_prime, width[r], distance);
    let p = TipParams { k_prime, ..*params };
    Ok(TipAsymptote::Toughness.cell_volume(&p, tip, mesh.hx(), mesh.hy(), 0.0))
}
