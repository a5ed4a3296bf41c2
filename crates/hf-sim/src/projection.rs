//! Front location from the ribbon widths.
//!
//! Each ribbon cell's opening is inverted through the tip asymptote to a
//! distance from the front; a fast-marching pass from the ribbon then gives
//! the new signed distance. When the toughness depends on position or on
//! the propagation direction, `K'` is sampled where the ribbon cell projects
//! onto the front and the inversion is repeated until the propagation
//! angles settle.

use std::f64::consts::FRAC_2_PI;

use hf_core::timing::step_timing;
use hf_core::{CellMask, norm2};
use hf_levelset::two_pass_signed_distance;
use hf_tip::{RibbonSample, TipParams, invert_distance};
use tracing::{debug, warn};

use crate::config::ProjectionPolicy;
use crate::error::{StepError, StepResult};
use crate::fracture::Fracture;
use crate::problem::Problem;

/// Weight of the previous angle estimate between projection iterations.
const ANGLE_RELAXATION: f64 = 0.25;

#[derive(Debug, Clone)]
pub(crate) struct Projection {
    pub sd: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Signed distance after inverting the ribbon widths in `width`.
///
/// `sd_trial` is the tentative level set the first angle estimate is taken
/// from.
pub(crate) fn locate_front(
    problem: &Problem,
    prev: &Fracture,
    width: &[f64],
    sd_trial: &[f64],
    dt: f64,
) -> StepResult<Projection> {
    let mesh = &problem.mesh;
    let cfg = &problem.config;
    let material = &problem.material;
    let ribbon = &prev.sets.ribbon;
    let project = material.needs_projection();

    let prev_channel = CellMask::from_cells(mesh.num_cells(), &prev.sets.channel);
    let ribbon_mask = CellMask::from_cells(mesh.num_cells(), ribbon);
    let outward: Vec<usize> = (0..mesh.num_cells())
        .filter(|&c| !prev_channel.contains(c))
        .collect();
    let inward: Vec<usize> = prev
        .sets
        .channel
        .iter()
        .copied()
        .filter(|&c| !ribbon_mask.contains(c))
        .collect();

    let mut sd = sd_trial.to_vec();
    let mut alpha = vec![0.0; ribbon.len()];
    let mut norm = f64::INFINITY;
    for itr in 0..cfg.max_proj_itrs {
        let k_prime: Vec<f64> = if project {
            let fresh = ribbon_angles(problem, &sd, ribbon)?;
            let previous = alpha.clone();
            if itr == 0 {
                alpha = fresh;
            } else {
                for (a, f) in alpha.iter_mut().zip(&fresh) {
                    *a = ANGLE_RELAXATION * *a + (1.0 - ANGLE_RELAXATION) * f;
                }
            }
            let change: Vec<f64> = alpha
                .iter()
                .zip(&previous)
                .map(|(a, p)| (a - p).abs() * FRAC_2_PI)
                .collect();
            norm = norm2(&change);
            ribbon
                .iter()
                .zip(&alpha)
                .map(|(&r, &a)| {
                    let point = projected_point(problem, &sd, r)?;
                    Ok(material.k_prime_at(point, a))
                })
                .collect::<StepResult<_>>()?
        } else {
            ribbon.iter().map(|&r| material.k_prime[r]).collect()
        };

        let known = invert_ribbon(problem, prev, width, &k_prime, dt)?;
        let (next, report) = {
            let _t = step_timing::FAST_MARCHING.scope();
            two_pass_signed_distance(mesh, &known, &outward, &inward)?
        };
        if !report.unreached.is_empty() {
            return Err(StepError::LevelSetUnreached {
                count: report.unreached.len(),
            });
        }
        sd = next;

        if !project {
            return Ok(Projection {
                sd,
                iterations: 1,
                converged: true,
            });
        }
        if itr > 0 && norm < cfg.tol_projection {
            debug!(iterations = itr + 1, norm, "toughness projection converged");
            return Ok(Projection {
                sd,
                iterations: itr + 1,
                converged: true,
            });
        }
    }

    match cfg.projection_policy {
        ProjectionPolicy::Fail => Err(StepError::ProjectionNotConverged {
            iterations: cfg.max_proj_itrs,
            norm,
        }),
        ProjectionPolicy::SoftAccept => {
            warn!(
                iterations = cfg.max_proj_itrs,
                norm, "toughness projection not converged, keeping last estimate"
            );
            Ok(Projection {
                sd,
                iterations: cfg.max_proj_itrs,
                converged: false,
            })
        }
    }
}

/// `(cell, φ)` of every ribbon cell from tip inversion, never receding.
fn invert_ribbon(
    problem: &Problem,
    prev: &Fracture,
    width: &[f64],
    k_prime: &[f64],
    dt: f64,
) -> StepResult<Vec<(usize, f64)>> {
    let _t = step_timing::TIP_INVERSION.scope();
    let material = &problem.material;
    let scale = problem.mesh.cell_diag();
    prev.sets
        .ribbon
        .iter()
        .zip(k_prime)
        .map(|(&r, &k)| {
            let params = TipParams {
                e_prime: material.e_prime,
                k_prime: k,
                mu_prime: problem.fluid.mu_prime(),
                c_prime: material.c_prime[r],
            };
            let sample = RibbonSample {
                cell: r,
                width: width[r],
                prev_distance: -prev.sd[r],
            };
            let inv = invert_distance(problem.config.tip_asymptote, &params, &sample, dt, scale)?;
            Ok((r, (-inv.distance).min(prev.sd[r])))
        })
        .collect()
}

/// Central-difference gradient of `sd` at `cell`.
fn gradient(problem: &Problem, sd: &[f64], cell: usize) -> [f64; 2] {
    let mesh = &problem.mesh;
    let [left, right, bottom, top] = mesh.neighbors(cell);
    let span = |a: usize, b: usize, h: f64| {
        let steps = [a != cell, b != cell].iter().filter(|&&s| s).count().max(1);
        steps as f64 * h
    };
    [
        (sd[right] - sd[left]) / span(left, right, mesh.hx()),
        (sd[top] - sd[bottom]) / span(bottom, top, mesh.hy()),
    ]
}

/// Propagation angle in `[0, π/2]` of every ribbon cell.
fn ribbon_angles(problem: &Problem, sd: &[f64], ribbon: &[usize]) -> StepResult<Vec<f64>> {
    ribbon
        .iter()
        .map(|&r| {
            let [gx, gy] = gradient(problem, sd, r);
            let angle = gy.abs().atan2(gx.abs());
            if (gx == 0.0 && gy == 0.0) || !angle.is_finite() {
                return Err(StepError::ProjectionNotFound { cell: r });
            }
            Ok(angle)
        })
        .collect()
}

/// Point on the front reached from the ribbon cell center along the
/// gradient of `sd`.
fn projected_point(problem: &Problem, sd: &[f64], cell: usize) -> StepResult<[f64; 2]> {
    let [gx, gy] = gradient(problem, sd, cell);
    let norm = gx.hypot(gy);
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(StepError::ProjectionNotFound { cell });
    }
    let c = problem.mesh.center(cell);
    let s = -sd[cell];
    Ok([c[0] + s * gx / norm, c[1] + s * gy / norm])
}
