//! Mechanical loading: openings are prescribed on loaded cells and a
//! uniform net pressure is solved for.
//!
//! Unloaded channel cells keep their elastic rows `Ccc·w − p = −Cct·w_tip`;
//! loaded cells get Dirichlet rows `w_i = ŵ_i`, and their elastic rows are
//! summed into one compatibility row that closes the system.

use hf_core::LocalIndex;
use nalgebra::{DMatrix, DVector};

use crate::ehl::{EhlInput, EhlSolution, lu_solve};
use crate::error::{SolverError, SolverResult};

pub(crate) fn solve(input: &EhlInput<'_>) -> SolverResult<EhlSolution> {
    if input.loaded.is_empty() {
        return Err(SolverError::ProblemSetup {
            what: "mechanical loading without loaded cells".to_string(),
        });
    }
    let n = input.channel.len();
    let index = LocalIndex::new(input.mesh.num_cells(), input.channel);
    let mut loaded = Vec::with_capacity(input.loaded.len());
    for &(cell, w) in input.loaded {
        let row = index.row(cell).ok_or_else(|| SolverError::ProblemSetup {
            what: format!("loaded cell {cell} is not a channel cell"),
        })?;
        loaded.push((row, w));
    }

    let (ccc, cct) = input.gather_blocks();
    let tip_load = -(&cct * input.tip_widths());

    let mut a = DMatrix::zeros(n + 1, n + 1);
    let mut b = DVector::zeros(n + 1);
    for i in 0..n {
        if loaded.iter().any(|&(r, _)| r == i) {
            for j in 0..n {
                a[(n, j)] += ccc[(i, j)];
            }
            a[(n, n)] -= 1.0;
            b[n] += tip_load[i];
        } else {
            a.row_mut(i).columns_mut(0, n).copy_from(&ccc.row(i));
            a[(i, n)] = -1.0;
            b[i] = tip_load[i];
        }
    }
    for &(r, w) in &loaded {
        a[(r, r)] = 1.0;
        b[r] = w;
    }

    let x = lu_solve(a, &b)?;
    let w_channel = x.rows(0, n).into_owned();
    let p_net = x[n];
    let p_channel: Vec<f64> = input.channel.iter().map(|&c| input.sigma0[c] + p_net).collect();
    let p_tip: Vec<f64> = input.tip.iter().map(|&c| input.sigma0[c] + p_net).collect();
    Ok(input.finish(&w_channel, &p_channel, &p_tip, 1))
}
