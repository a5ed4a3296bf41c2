//! One explicit front step.
//!
//! 1. Advance the tip cells of the accepted state with their velocities and
//!    march a tentative signed distance.
//! 2. Reconstruct and classify the tentative front.
//! 3. Tip volumes from the asymptote (or the ribbon SIF for stagnant tips)
//!    and the leak-off over the step.
//! 4. Solve the width/pressure system on the previous channel plus the
//!    tentative tip cells.
//! 5. Invert the ribbon widths for the new signed distance.
//!
//! Nothing in the accepted state is modified; a failed attempt leaves it
//! untouched.

use hf_core::CellMask;
use hf_core::timing::step_timing;
use hf_front::{ReconstructionMethod, TipGeometry, classify, reconstruct_front};
use hf_levelset::{front_region, two_pass_signed_distance};
use hf_mesh::CartesianMesh;
use hf_solver::{EhlInput, solve_ehl};
use hf_tip::{
    TipParams, channel_leak_off, check_leak_off, moving_tip_leak_off, stagnant_tip_leak_off,
    stagnant_tip_volume, validate_tip_volumes,
};
use tracing::{debug, trace};

use crate::error::{StepError, StepResult, StepStatus};
use crate::fracture::Fracture;
use crate::problem::Problem;
use crate::projection::locate_front;

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Propagated(Fracture),
    /// Every crack cell closed; the run stops here
    Closed(Fracture),
}

impl StepOutcome {
    pub fn status(&self) -> StepStatus {
        match self {
            StepOutcome::Propagated(_) => StepStatus::Propagated,
            StepOutcome::Closed(_) => StepStatus::FullyClosed,
        }
    }

    pub fn fracture(&self) -> &Fracture {
        match self {
            StepOutcome::Propagated(f) | StepOutcome::Closed(f) => f,
        }
    }

    pub fn into_fracture(self) -> Fracture {
        match self {
            StepOutcome::Propagated(f) | StepOutcome::Closed(f) => f,
        }
    }
}

/// A front cell of the tentative footprint with its kinematics.
struct FrontCell {
    tip: TipGeometry,
    velocity: f64,
    stagnant: bool,
}

/// Attempt to advance `prev` by `dt`.
pub fn attempt_step(problem: &Problem, prev: &Fracture, dt: f64) -> StepResult<StepOutcome> {
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(StepError::InvalidTimeStep { dt });
    }
    let mesh = &problem.mesh;
    let cfg = &problem.config;
    let material = &problem.material;
    let n = mesh.num_cells();
    let (hx, hy, area, diag) = (mesh.hx(), mesh.hy(), mesh.cell_area(), mesh.cell_diag());

    let sd_trial = tentative_level_set(problem, prev, dt)?;
    let band = search_band(mesh, cfg.front_reconstruction, prev, &sd_trial, cfg.max_front_itrs);
    let rec = reconstruct_front(
        cfg.front_reconstruction,
        mesh,
        &sd_trial,
        &prev.sets.channel,
        &band,
        cfg.max_front_itrs,
    )?;
    let cls = classify(mesh, &prev.sets.channel, &rec)?;

    let prev_channel = CellMask::from_cells(n, &prev.sets.channel);
    let front: Vec<FrontCell> = rec
        .tips
        .iter()
        .filter(|t| !prev_channel.contains(t.cell))
        .map(|&tip| {
            let advance = prev.sd[tip.cell] - rec.sd[tip.cell];
            FrontCell {
                tip,
                velocity: (advance / dt).max(0.0),
                stagnant: advance / diag < cfg.tol_v_stagnant,
            }
        })
        .collect();
    let front_cells: Vec<usize> = front.iter().map(|f| f.tip.cell).collect();
    trace!(
        front = front.len(),
        stagnant = front.iter().filter(|f| f.stagnant).count(),
        "tentative front"
    );

    let params_at = |cell: usize| TipParams {
        e_prime: material.e_prime,
        k_prime: material.k_prime[cell],
        mu_prime: problem.fluid.mu_prime(),
        c_prime: material.c_prime[cell],
    };

    let (w_tip, leak_off) = {
        let _t = step_timing::TIP_INTEGRALS.scope();
        let ribbon_mask = CellMask::from_cells(n, &cls.sets.ribbon);
        let mut volumes = Vec::with_capacity(front.len());
        for f in &front {
            let params = params_at(f.tip.cell);
            let vol = if f.stagnant {
                stagnant_tip_volume(mesh, &f.tip, &ribbon_mask, &rec.sd, &prev.width, &params)?
            } else {
                cfg.tip_asymptote
                    .cell_volume(&params, &f.tip, hx, hy, f.velocity)
            };
            volumes.push(vol);
        }
        validate_tip_volumes(&front_cells, &mut volumes)?;
        let w_tip: Vec<f64> = volumes.iter().map(|v| v / area).collect();

        let mut leak_off = vec![0.0; n];
        for &c in &prev.sets.channel {
            let t_arrival = prev.arrival[c].unwrap_or(prev.time);
            let v = channel_leak_off(material.c_prime[c], area, prev.time, dt, t_arrival);
            leak_off[c] = check_leak_off(c, v)?;
        }
        for f in &front {
            let c = f.tip.cell;
            let v = if f.stagnant {
                let t_zv = prev.zero_vertex_arrival[c].unwrap_or(prev.time);
                stagnant_tip_leak_off(material.c_prime[c], f.tip.filled_area(hx, hy), prev.time, dt, t_zv)
            } else {
                moving_tip_leak_off(material.c_prime[c], &f.tip, hx, hy, f.velocity, dt)
            };
            leak_off[c] = check_leak_off(c, v)?;
        }
        // no leak-off where the fluid is not above the pore pressure
        for c in 0..n {
            if leak_off[c] != 0.0 && prev.p_fluid[c] <= material.pore_pressure {
                leak_off[c] = 0.0;
            }
        }
        (w_tip, leak_off)
    };

    let injection = problem.injection.rates(prev.time, n);
    let input = EhlInput {
        mesh,
        operator: problem.operator.as_ref(),
        channel: &prev.sets.channel,
        tip: &front_cells,
        w_tip: &w_tip,
        w_prev: &prev.width,
        sigma0: &material.sigma0,
        leak_off: &leak_off,
        injection: &injection,
        loaded: &problem.loaded,
        dt,
        mu_prime: problem.fluid.mu_prime(),
        min_width: cfg.min_width,
    };
    let solution = solve_ehl(cfg.ehl_solver, &input, &cfg.fixed_point())?;

    let projection = locate_front(problem, prev, &solution.width, &rec.sd, dt)?;
    let sd = projection.sd;
    let time = prev.time + dt;

    let sets = cls.sets;
    let velocity: Vec<f64> = sets
        .tip
        .iter()
        .map(|&c| ((prev.sd[c] - sd[c]) / dt).max(0.0))
        .collect();

    let mut arrival = prev.arrival.clone();
    let latest = prev
        .arrival
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    for f in front.iter().filter(|f| cls.graduated.contains(&f.tip.cell)) {
        let crossing = f.tip.alpha.cos() * hx + f.tip.alpha.sin() * hy;
        let t_arrival = if f.velocity > 0.0 {
            let enter = time - f.tip.l / f.velocity;
            let leave = time - (f.tip.l - crossing) / f.velocity;
            0.5 * (enter + leave)
        } else {
            prev.time
        };
        arrival[f.tip.cell] = Some(t_arrival.max(latest));
    }

    let mut zero_vertex_arrival = prev.zero_vertex_arrival.clone();
    for (tip, &v) in cls.tips.iter().zip(&velocity) {
        let slot = &mut zero_vertex_arrival[tip.cell];
        if slot.is_none() {
            *slot = Some(if v > 0.0 { time - tip.l / v } else { time });
        }
    }

    let step_leak: f64 = leak_off.iter().sum();
    let max_width = prev
        .max_width
        .iter()
        .zip(&solution.width)
        .map(|(a, b)| a.max(*b))
        .collect();

    let fracture = Fracture {
        mesh: prev.mesh,
        time,
        sd,
        width: solution.width,
        p_fluid: solution.p_fluid,
        p_net: solution.p_net,
        sets,
        tips: cls.tips,
        fill: cls.fill,
        velocity,
        fronts: rec.fronts,
        arrival,
        zero_vertex_arrival,
        leak_off,
        total_leak_off: prev.total_leak_off + step_leak,
        injected_volume: prev.injected_volume + problem.injection.total_rate(prev.time) * dt,
        max_width,
        last_time_step: Some(dt),
        closed: solution.closed,
    };
    debug!(
        time,
        dt,
        channel = fracture.sets.channel.len(),
        tip = fracture.sets.tip.len(),
        ehl_iterations = solution.iterations,
        projection_iterations = projection.iterations,
        projection_converged = projection.converged,
        "step attempt succeeded"
    );
    Ok(if fracture.closed {
        StepOutcome::Closed(fracture)
    } else {
        StepOutcome::Propagated(fracture)
    })
}

/// Level set after moving every tip cell with its last velocity.
fn tentative_level_set(problem: &Problem, prev: &Fracture, dt: f64) -> StepResult<Vec<f64>> {
    let _t = step_timing::FAST_MARCHING.scope();
    let mesh = &problem.mesh;
    let n = mesh.num_cells();
    let known: Vec<(usize, f64)> = prev
        .sets
        .tip
        .iter()
        .zip(&prev.velocity)
        .map(|(&c, &v)| (c, prev.sd[c] - dt * v))
        .collect();
    let crack = CellMask::from_cells(n, &prev.sets.crack);
    let outward: Vec<usize> = (0..n).filter(|&c| !crack.contains(c)).collect();
    let (sd, report) = two_pass_signed_distance(mesh, &known, &outward, &prev.sets.channel)?;
    if !report.unreached.is_empty() {
        return Err(StepError::LevelSetUnreached {
            count: report.unreached.len(),
        });
    }
    Ok(sd)
}

/// Cells searched for the tentative front.
///
/// Starts from the region around the last ribbon and grows it ring by ring
/// while the tentative front touches its outer edge. Falls back to the whole
/// mesh when the ribbon is empty or `max_growth` rings do not suffice.
fn search_band(
    mesh: &CartesianMesh,
    method: ReconstructionMethod,
    prev: &Fracture,
    sd: &[f64],
    max_growth: usize,
) -> Vec<usize> {
    let n = sd.len();
    let diag = mesh.cell_diag();
    if prev.sets.ribbon.is_empty() {
        return (0..n).collect();
    }
    let channel = CellMask::from_cells(n, &prev.sets.channel);
    let mut band = CellMask::from_cells(n, &front_region(mesh, &prev.sd, &prev.sets.ribbon));
    for &c in &prev.sets.tip {
        band.insert(c);
    }

    let mut settled = false;
    for _ in 0..=max_growth {
        let grow: Vec<usize> = band
            .to_cells()
            .into_iter()
            .filter(|&c| sd[c] < diag)
            .flat_map(|c| mesh.neighbors(c))
            .filter(|&nb| !band.contains(nb) && !channel.contains(nb))
            .collect();
        if grow.is_empty() {
            settled = true;
            break;
        }
        for c in grow {
            band.insert(c);
        }
    }
    if !settled {
        trace!(max_growth, "search band did not settle, searching the whole mesh");
        return (0..n).collect();
    }

    let mut cells = band.to_cells();
    if method == ReconstructionMethod::Continuous {
        cells.retain(|&c| sd[c] >= -diag);
        cells.extend_from_slice(&prev.sets.tip);
        hf_core::cellset::normalize(&mut cells);
    }
    cells
}

#[cfg(test)]
mod tests {
    use hf_core::units::{gpa, m3ps, pa_s};

    use super::*;
    use crate::config::{InitialConfig, InitialRegime, SimulationConfig};
    use crate::init::radial_fracture;
    use crate::properties::{FluidConfig, InjectionConfig, MaterialConfig};

    fn radial_case() -> (Problem, Fracture) {
        let mesh = CartesianMesh::new(6.0, 6.0, 41, 41).unwrap();
        let problem = Problem::new(
            mesh,
            &MaterialConfig::from_units(gpa(30.0), 0.25, 0.0),
            &FluidConfig::from_units(pa_s(1.1e-3)),
            &InjectionConfig::constant(m3ps(1e-3)),
            &SimulationConfig::default(),
        )
        .unwrap();
        let initial = radial_fracture(
            &problem,
            &InitialConfig {
                radius: 2.0,
                regime: InitialRegime::Viscosity,
            },
        )
        .unwrap();
        (problem, initial)
    }

    fn tip_cells(problem: &Problem, prev: &Fracture, sd: &[f64], band: &[usize]) -> Vec<usize> {
        let rec = reconstruct_front(
            ReconstructionMethod::Original,
            &problem.mesh,
            sd,
            &prev.sets.channel,
            band,
            problem.config.max_front_itrs,
        )
        .unwrap();
        let mut cells: Vec<usize> = rec.tips.iter().map(|t| t.cell).collect();
        hf_core::cellset::normalize(&mut cells);
        cells
    }

    #[test]
    fn search_band_follows_the_front() {
        let (problem, prev) = radial_case();
        let mesh = &problem.mesh;
        let all: Vec<usize> = (0..mesh.num_cells()).collect();
        let crossing = mesh.hx() / prev.max_velocity();
        // a regular step and one moving the front three cells at once
        for dt in [0.8 * crossing, 3.0 * crossing] {
            let sd = tentative_level_set(&problem, &prev, dt).unwrap();
            let band = search_band(mesh, ReconstructionMethod::Original, &prev, &sd, 25);
            assert!(band.len() < mesh.num_cells() / 2, "band of {} cells", band.len());
            assert_eq!(tip_cells(&problem, &prev, &sd, &band), tip_cells(&problem, &prev, &sd, &all));
        }
    }

    #[test]
    fn unsettled_band_covers_the_mesh() {
        let (problem, prev) = radial_case();
        let mesh = &problem.mesh;
        let crossing = mesh.hx() / prev.max_velocity();
        let sd = tentative_level_set(&problem, &prev, 3.0 * crossing).unwrap();
        let band = search_band(mesh, ReconstructionMethod::Original, &prev, &sd, 0);
        assert_eq!(band.len(), mesh.num_cells());
    }
}
