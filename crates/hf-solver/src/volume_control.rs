//! Volume control: a uniform fluid pressure per fracture closes the volume
//! balance of that fracture.
//!
//! ```text
//! [ Ccc  -E ] [ Δw ]   [ -σ0 - Ccc·w_prev - Cct·w_tip                 ]
//! [ Eᵀ·W  0 ] [ p  ] = [ ΣQ·Δt/A - Σ(w_tip - w_prev_tip) - ΣL/A per fracture ]
//! ```
//!
//! `E` maps each channel cell to the pressure of its fracture, a connected
//! component of the channel cells. Lobes that have not coalesced yet keep
//! separate pressures; once they touch they share one. `W` holds the volume
//! weights: one per cell on the full mesh, the mirror count when only the
//! positive quadrant of a symmetric fracture is solved.

use hf_core::{CellMask, LocalIndex};
use hf_mesh::{CartesianMesh, QuarterSymmetry};
use nalgebra::{DMatrix, DVector};

use crate::ehl::{EhlInput, EhlSolution, lu_solve};
use crate::error::{SolverError, SolverResult};

pub(crate) fn solve(input: &EhlInput<'_>) -> SolverResult<EhlSolution> {
    let n = input.channel.len();
    let area = input.mesh.cell_area();
    let (ccc, cct) = input.gather_blocks();
    let w_prev = input.channel_prev();
    let w_tip = input.tip_widths();
    let fractures = Fractures::label(input.mesh, input.channel, input.tip);
    let m = fractures.count;

    let mut a = DMatrix::zeros(n + m, n + m);
    a.view_mut((0, 0), (n, n)).copy_from(&ccc);
    for (i, &k) in fractures.channel.iter().enumerate() {
        a[(i, n + k)] = -1.0;
        a[(n + k, i)] = 1.0;
    }

    let sigma = DVector::from_iterator(n, input.channel.iter().map(|&c| input.sigma0[c]));
    let elastic = -(&sigma + &ccc * &w_prev + &cct * &w_tip);
    let mut b = DVector::zeros(n + m);
    b.rows_mut(0, n).copy_from(&elastic);
    for (i, &c) in input.channel.iter().enumerate() {
        b[n + fractures.channel[i]] += (input.injection[c] * input.dt - input.leak_off[c]) / area;
    }
    for (k, &c) in input.tip.iter().enumerate() {
        let f = fractures.tip[k];
        b[n + f] += (input.injection[c] * input.dt - input.leak_off[c]) / area;
        b[n + f] -= input.w_tip[k] - input.w_prev[c];
    }

    let x = lu_solve(a, &b)?;
    let w_channel = &w_prev + x.rows(0, n);
    let p_channel: Vec<f64> = fractures.channel.iter().map(|&k| x[n + k]).collect();
    let p_tip: Vec<f64> = fractures.tip.iter().map(|&k| x[n + k]).collect();
    Ok(input.finish(&w_channel, &p_channel, &p_tip, 1))
}

/// Volume control on the positive quadrant of a fracture symmetric about
/// both axes through the mesh center.
///
/// The elasticity of an active cell sums the influence of all its mirror
/// images, and the volume row weighs each active cell by its mirror count.
/// The solution is copied back onto the mirrors.
pub(crate) fn solve_symmetric(input: &EhlInput<'_>) -> SolverResult<EhlSolution> {
    let sym = QuarterSymmetry::new(input.mesh).map_err(|e| SolverError::ProblemSetup {
        what: e.to_string(),
    })?;
    let channel = active_part(&sym, input.mesh, input.channel, "channel")?;
    let tip = active_part(&sym, input.mesh, input.tip, "tip")?;
    let n = channel.len();
    let area = input.mesh.cell_area();

    let tip_rows = LocalIndex::new(input.mesh.num_cells(), input.tip);
    let mut w_tip = DVector::zeros(tip.len());
    for (k, &c) in tip.iter().enumerate() {
        let row = tip_rows.row(c).ok_or_else(|| SolverError::ProblemSetup {
            what: format!("tip cell {c} has no width"),
        })?;
        w_tip[k] = input.w_tip[row];
    }
    let w_prev = DVector::from_iterator(n, channel.iter().map(|&c| input.w_prev[c]));

    let ccc = mirrored_block(input, &sym, &channel, &channel);
    let cct = mirrored_block(input, &sym, &channel, &tip);

    let mut a = DMatrix::zeros(n + 1, n + 1);
    a.view_mut((0, 0), (n, n)).copy_from(&ccc);
    for (i, &c) in channel.iter().enumerate() {
        a[(i, n)] = -1.0;
        a[(n, i)] = sym.weight(c);
    }

    let sigma = DVector::from_iterator(n, channel.iter().map(|&c| input.sigma0[c]));
    let elastic = -(&sigma + &ccc * &w_prev + &cct * &w_tip);
    let crack = input.channel.iter().chain(input.tip);
    let injected: f64 = crack.clone().map(|&c| input.injection[c]).sum::<f64>() * input.dt;
    let leaked: f64 = crack.map(|&c| input.leak_off[c]).sum();
    let tip_growth: f64 = input
        .tip
        .iter()
        .zip(input.w_tip)
        .map(|(&c, &w)| w - input.w_prev[c])
        .sum();

    let mut b = DVector::zeros(n + 1);
    b.rows_mut(0, n).copy_from(&elastic);
    b[n] = (injected - leaked) / area - tip_growth;

    let x = lu_solve(a, &b)?;
    let rows = LocalIndex::new(input.mesh.num_cells(), &channel);
    let mut w_channel = DVector::zeros(input.channel.len());
    for (k, &c) in input.channel.iter().enumerate() {
        let Some(i) = rows.row(sym.representative(c)) else {
            return Err(SolverError::ProblemSetup {
                what: format!("channel cell {c} has no mirror in the positive quadrant"),
            });
        };
        w_channel[k] = w_prev[i] + x[i];
    }
    let p = x[n];
    Ok(input.finish(
        &w_channel,
        &vec![p; input.channel.len()],
        &vec![p; input.tip.len()],
        1,
    ))
}

/// Active cells of `cells`, checking that every mirror image is present.
fn active_part(
    sym: &QuarterSymmetry,
    mesh: &CartesianMesh,
    cells: &[usize],
    what: &str,
) -> SolverResult<Vec<usize>> {
    let mask = CellMask::from_cells(mesh.num_cells(), cells);
    let mut active = Vec::new();
    for &c in cells {
        if let Some(&m) = sym.mirrors(c).iter().find(|&&m| !mask.contains(m)) {
            return Err(SolverError::ProblemSetup {
                what: format!("{what} is not symmetric: cell {c} lacks its mirror {m}"),
            });
        }
        if sym.representative(c) == c {
            active.push(c);
        }
    }
    Ok(active)
}

/// `C[rows, cols]` with every column summed over the mirrors of its cell.
fn mirrored_block(
    input: &EhlInput<'_>,
    sym: &QuarterSymmetry,
    rows: &[usize],
    cols: &[usize],
) -> DMatrix<f64> {
    let mirrors: Vec<Vec<usize>> = cols.iter().map(|&c| sym.mirrors(c)).collect();
    let flat: Vec<usize> = mirrors.iter().flatten().copied().collect();
    let full = input.operator.gather(rows, &flat);
    let mut out = DMatrix::zeros(rows.len(), cols.len());
    let mut offset = 0;
    for (j, m) in mirrors.iter().enumerate() {
        for k in offset..offset + m.len() {
            for i in 0..rows.len() {
                out[(i, j)] += full[(i, k)];
            }
        }
        offset += m.len();
    }
    out
}

/// Fracture label of every channel and tip cell.
struct Fractures {
    count: usize,
    /// Aligned with the channel cells
    channel: Vec<usize>,
    /// Aligned with the tip cells
    tip: Vec<usize>,
}

impl Fractures {
    /// Channel cells touching through a side or a corner belong to the same
    /// fracture; a tip cell joins the fracture of an adjacent channel cell.
    fn label(mesh: &CartesianMesh, channel: &[usize], tip: &[usize]) -> Self {
        let rows = LocalIndex::new(mesh.num_cells(), channel);
        let mut label = vec![usize::MAX; channel.len()];
        let mut count = 0;
        for start in 0..channel.len() {
            if label[start] != usize::MAX {
                continue;
            }
            label[start] = count;
            let mut stack = vec![channel[start]];
            while let Some(c) = stack.pop() {
                for nb in mesh.neighbors8(c) {
                    if let Some(i) = rows.row(nb)
                        && label[i] == usize::MAX
                    {
                        label[i] = count;
                        stack.push(nb);
                    }
                }
            }
            count += 1;
        }
        let tip = tip
            .iter()
            .map(|&c| {
                mesh.neighbors8(c)
                    .into_iter()
                    .find_map(|nb| rows.row(nb))
                    .map_or(0, |i| label[i])
            })
            .collect();
        Self {
            count,
            channel: label,
            tip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_lobes_get_separate_labels() {
        let mesh = CartesianMesh::new(4.0, 4.0, 9, 9).unwrap();
        let channel = vec![mesh.index(1, 4), mesh.index(2, 4), mesh.index(6, 4), mesh.index(7, 4)];
        let tip = vec![mesh.index(3, 4), mesh.index(5, 4), mesh.index(4, 0)];
        let f = Fractures::label(&mesh, &channel, &tip);
        assert_eq!(f.count, 2);
        assert_eq!(f.channel, vec![0, 0, 1, 1]);
        assert_eq!(f.tip, vec![0, 1, 0]);
    }

    #[test]
    fn diagonal_contact_joins_lobes() {
        let mesh = CartesianMesh::new(4.0, 4.0, 9, 9).unwrap();
        let mut channel = vec![mesh.index(3, 3), mesh.index(4, 4)];
        channel.sort_unstable();
        let f = Fractures::label(&mesh, &channel, &[]);
        assert_eq!(f.count, 1);
    }
}
