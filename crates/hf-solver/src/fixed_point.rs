//! Relaxed fixed-point (Picard) iteration shared by all assemblies.

use std::ops::Range;

use nalgebra::DVector;
use tracing::trace;

use crate::error::{SolverError, SolverResult};

/// Fixed-point iteration configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPointConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Relative change below which a block counts as converged
    pub tolerance: f64,
    /// Weight of the new iterate, in `(0, 1]`
    pub relaxation: f64,
}

impl Default for FixedPointConfig {
    fn default() -> Self {
        Self {
            max_iterations: 140,
            tolerance: 1e-4,
            relaxation: 1.0,
        }
    }
}

/// Fixed-point iteration result.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPointResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Largest relative block change of the last iteration
    pub change: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Relative change of `new` against `old` on one block.
fn block_change(old: &DVector<f64>, new: &DVector<f64>, block: &Range<usize>) -> f64 {
    let (mut diff, mut size) = (0.0, 0.0);
    for i in block.clone() {
        diff += (new[i] - old[i]).powi(2);
        size += new[i].powi(2);
    }
    if diff == 0.0 {
        0.0
    } else if size == 0.0 {
        f64::INFINITY
    } else {
        (diff / size).sqrt()
    }
}

/// Iterate `x ← (1 − ω)·x + ω·G(x)` until every block of the unknown vector
/// changes by less than the tolerance relative to its own size.
///
/// Blocks separate unknowns of different units (openings, pressures).
pub fn fixed_point_solve<G>(
    x0: DVector<f64>,
    blocks: &[Range<usize>],
    mut step: G,
    config: &FixedPointConfig,
) -> SolverResult<FixedPointResult>
where
    G: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    if !(config.relaxation > 0.0 && config.relaxation <= 1.0) {
        return Err(SolverError::ProblemSetup {
            what: format!("relaxation {} outside (0, 1]", config.relaxation),
        });
    }
    let mut x = x0;
    let mut change = f64::INFINITY;
    for iter in 0..config.max_iterations {
        let g = step(&x)?;
        if g.len() != x.len() {
            return Err(SolverError::ProblemSetup {
                what: format!("iterate length {} != {}", g.len(), x.len()),
            });
        }
        if g.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NotValid {
                what: format!("non-finite iterate at iteration {iter}"),
            });
        }
        let x_new = &x * (1.0 - config.relaxation) + &g * config.relaxation;
        change = blocks
            .iter()
            .map(|b| block_change(&x, &x_new, b))
            .fold(0.0, f64::max);
        x = x_new;
        trace!(iter, change, "fixed-point iteration");
        if change < config.tolerance {
            return Ok(FixedPointResult {
                x,
                change,
                iterations: iter + 1,
            });
        }
    }
    Err(SolverError::NotConverged {
        iterations: config.max_iterations,
        change,
    })
}
