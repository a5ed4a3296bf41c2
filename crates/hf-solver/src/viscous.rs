//! Coupled elasticity and lubrication.
//!
//! Unknowns are the channel width increments `Δw` and the tip fluid
//! pressures `p_t`. Channel pressures follow from elasticity,
//! `p_c = Ccc·(w_prev + Δw) + Cct·w_tip + σ0`, and every crack cell obeys
//!
//! ```text
//! Δw_i − Δt·Σ_j k_ij (p_j − p_i) = Δt·Q_i/A − L_i/A
//! ```
//!
//! with edge conductance `k_ij = w̄³/(μ'·h²)` between neighboring crack
//! cells. Conductances are frozen at the previous iterate, which makes each
//! Picard step a linear solve.

use hf_core::LocalIndex;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::ehl::{EhlInput, EhlSolution, lu_solve};
use crate::error::{SolverError, SolverResult};
use crate::fixed_point::{FixedPointConfig, fixed_point_solve};

/// Off-diagonal conductances of one crack cell, `(local index, k)`.
type Row = Vec<(usize, f64)>;

pub(crate) fn solve(input: &EhlInput<'_>, config: &FixedPointConfig) -> SolverResult<EhlSolution> {
    if !(input.mu_prime > 0.0) {
        return Err(SolverError::ProblemSetup {
            what: format!("viscous solve needs a positive viscosity, got {}", input.mu_prime),
        });
    }
    let (nc, nt) = (input.channel.len(), input.tip.len());
    let n = nc + nt;
    let crack: Vec<usize> = input.channel.iter().chain(input.tip).copied().collect();
    let index = LocalIndex::new(input.mesh.num_cells(), &crack);
    let area = input.mesh.cell_area();

    let (ccc, cct) = input.gather_blocks();
    let w_prev = input.channel_prev();
    let w_tip = input.tip_widths();
    let sigma = DVector::from_iterator(nc, input.channel.iter().map(|&c| input.sigma0[c]));
    let p_c0 = &ccc * &w_prev + &cct * &w_tip + sigma;
    let source: Vec<f64> = crack
        .iter()
        .map(|&c| input.dt * input.injection[c] / area - input.leak_off[c] / area)
        .collect();

    let step = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let widths: Vec<f64> = (0..n)
            .map(|k| if k < nc { w_prev[k] + x[k] } else { w_tip[k - nc] })
            .collect();
        let rows = conductances(input, &crack, &index, &widths);

        let mut a = DMatrix::zeros(n, n);
        let mut b = DVector::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            let diag: f64 = row.iter().map(|&(_, k)| k).sum();
            // (L p)_i = Σ k_ij p_j − (Σ k_ij) p_i, split by channel/tip columns
            let mut entries: Vec<(usize, f64)> = row.clone();
            entries.push((i, -diag));
            let mut elastic_rhs = 0.0;
            for (j, l) in entries {
                let coeff = input.dt * l;
                if j < nc {
                    for m in 0..nc {
                        a[(i, m)] -= coeff * ccc[(j, m)];
                    }
                    elastic_rhs += coeff * p_c0[j];
                } else {
                    a[(i, j)] -= coeff;
                }
            }
            if i < nc {
                a[(i, i)] += 1.0;
                b[i] = source[i] + elastic_rhs;
            } else {
                let t = i - nc;
                let growth = w_tip[t] - input.w_prev[input.tip[t]];
                b[i] = source[i] - growth + elastic_rhs;
            }
        }
        lu_solve(a, &b)
    };

    let result = fixed_point_solve(DVector::zeros(n), &[0..nc, nc..n], step, config)?;
    trace!(iterations = result.iterations, change = result.change, "lubrication converged");

    let dw = result.x.rows(0, nc);
    let w_channel = &w_prev + dw;
    let p_channel = &p_c0 + &ccc * dw;
    let p_tip: Vec<f64> = result.x.rows(nc, nt).iter().copied().collect();
    Ok(input.finish(&w_channel, p_channel.as_slice(), &p_tip, result.iterations))
}

/// Edge conductances `w̄³/(μ'·h²)` to the crack neighbors of each crack cell.
fn conductances(
    input: &EhlInput<'_>,
    crack: &[usize],
    index: &LocalIndex,
    widths: &[f64],
) -> Vec<Row> {
    let mesh = input.mesh;
    let (hx2, hy2) = (mesh.hx().powi(2), mesh.hy().powi(2));
    crack
        .iter()
        .enumerate()
        .map(|(i, &cell)| {
            let [left, right, bottom, top] = mesh.neighbors(cell);
            [(left, hx2), (right, hx2), (bottom, hy2), (top, hy2)]
                .into_iter()
                .filter(|&(nb, _)| nb != cell)
                .filter_map(|(nb, h2)| {
                    let j = index.row(nb)?;
                    let w = (0.5 * (widths[i] + widths[j])).max(0.0);
                    Some((j, w.powi(3) / (input.mu_prime * h2)))
                })
                .collect()
        })
        .collect()
}
