//! Radial starting footprint.
//!
//! The footprint is a circle of the configured radius around the origin. Its
//! age follows from the self-similar radial solutions,
//! `R = 0.6955·(E'Q³t⁴/μ')^(1/9)` in the viscosity-dominated regime and
//! `R = 0.8546·(E'Qt/K')^(2/5)` in the toughness-dominated one, and the
//! injected volume `Q·t` is distributed over an elliptic opening profile.

use hf_front::{CellSets, classify, reconstruct_front};
use hf_tip::TipParams;
use tracing::info;

use crate::config::{InitialConfig, InitialRegime};
use crate::error::{SimError, SimResult};
use crate::fracture::Fracture;
use crate::problem::Problem;

pub const M_VERTEX_RADIUS: f64 = 0.6955;
pub const K_VERTEX_RADIUS: f64 = 0.8546;

/// Age and front velocity of a radial fracture of radius `radius`.
pub fn vertex_time(problem: &Problem, initial: &InitialConfig) -> SimResult<(f64, f64)> {
    let q = problem.injection.total_rate(0.0);
    let e = problem.material.e_prime;
    let r = initial.radius;
    if !(q > 0.0) {
        return Err(SimError::Initialization {
            what: format!("radial initialization needs a positive injection rate, got {q}"),
        });
    }
    let (t, exponent) = match initial.regime {
        InitialRegime::Viscosity => {
            let mu = problem.fluid.mu_prime();
            if !(mu > 0.0) {
                return Err(SimError::Initialization {
                    what: "viscosity scaling needs a positive viscosity".to_string(),
                });
            }
            let t = ((r / M_VERTEX_RADIUS).powi(9) * mu / (e * q.powi(3))).powf(0.25);
            (t, 4.0 / 9.0)
        }
        InitialRegime::Toughness => {
            let k = problem.material.k_prime_at([0.0, 0.0], 0.0);
            if !(k > 0.0) {
                return Err(SimError::Initialization {
                    what: "toughness scaling needs a positive toughness".to_string(),
                });
            }
            let t = (r / K_VERTEX_RADIUS).powf(2.5) * k / (e * q);
            (t, 0.4)
        }
    };
    Ok((t, exponent * r / t))
}

/// Build the first accepted state.
pub fn radial_fracture(problem: &Problem, initial: &InitialConfig) -> SimResult<Fracture> {
    let mesh = &problem.mesh;
    let cfg = &problem.config;
    let radius = initial.radius;
    if !(radius > 2.0 * mesh.cell_diag()) {
        return Err(SimError::Initialization {
            what: format!(
                "initial radius {radius} must span more than two cell diagonals ({})",
                mesh.cell_diag()
            ),
        });
    }
    let (t0, v0) = vertex_time(problem, initial)?;
    let n = mesh.num_cells();
    let (hx, hy, area) = (mesh.hx(), mesh.hy(), mesh.cell_area());

    let r_of = |p: [f64; 2]| p[0].hypot(p[1]);
    let sd: Vec<f64> = mesh.centers().iter().map(|&p| r_of(p) - radius).collect();
    let channel: Vec<usize> = (0..n)
        .filter(|&c| {
            mesh.cell_vertices(c)
                .iter()
                .all(|&v| r_of(mesh.vertex(v)) < radius)
        })
        .collect();
    let all: Vec<usize> = (0..n).collect();
    let rec = reconstruct_front(
        cfg.front_reconstruction,
        mesh,
        &sd,
        &channel,
        &all,
        cfg.max_front_itrs,
    )?;
    let cls = classify(mesh, &channel, &rec)?;
    let sets: CellSets = cls.sets;

    let material = &problem.material;
    let mut width = vec![0.0; n];
    let mut tip_volume = 0.0;
    for tip in &cls.tips {
        let params = TipParams {
            e_prime: material.e_prime,
            k_prime: material.k_prime[tip.cell],
            mu_prime: problem.fluid.mu_prime(),
            c_prime: material.c_prime[tip.cell],
        };
        let vol = cfg.tip_asymptote.cell_volume(&params, tip, hx, hy, v0);
        width[tip.cell] = vol / area;
        tip_volume += vol;
    }

    let profile = |c: usize| {
        let rho = (r_of(mesh.center(c)) / radius).min(1.0);
        (1.0 - rho * rho).sqrt()
    };
    let shape: f64 = sets.channel.iter().map(|&c| profile(c)).sum::<f64>() * area;
    let volume = problem.injection.total_rate(0.0) * t0;
    let scale = (volume - tip_volume) / shape;
    if !(scale > 0.0) || !scale.is_finite() {
        return Err(SimError::Initialization {
            what: format!("tip cells hold {tip_volume} of the initial volume {volume}"),
        });
    }
    for &c in &sets.channel {
        width[c] = scale * profile(c);
    }

    let crack_widths: Vec<f64> = sets.crack.iter().map(|&c| width[c]).collect();
    let traction = problem
        .operator
        .matvec(&sets.crack, &sets.crack, &crack_widths)?;
    let mut p_net = vec![0.0; n];
    let mut p_fluid = vec![0.0; n];
    for (k, &c) in sets.crack.iter().enumerate() {
        p_net[c] = traction[k];
        p_fluid[c] = traction[k] + material.sigma0[c];
    }

    let exponent = v0 * t0 / radius;
    let age_at = |p: [f64; 2]| t0 * (r_of(p) / radius).min(1.0).powf(1.0 / exponent);
    let mut arrival = vec![None; n];
    for &c in &sets.channel {
        arrival[c] = Some(age_at(mesh.center(c)));
    }
    let mut zero_vertex_arrival = vec![None; n];
    for tip in &cls.tips {
        zero_vertex_arrival[tip.cell] = Some(age_at(tip.zero_vertex_position(mesh)));
    }

    info!(
        radius,
        time = t0,
        velocity = v0,
        channel = sets.channel.len(),
        tip = sets.tip.len(),
        "radial fracture initialized"
    );
    let velocity = vec![v0; cls.tips.len()];
    Ok(Fracture {
        mesh: mesh.descriptor(),
        time: t0,
        sd: rec.sd,
        max_width: width.clone(),
        width,
        p_fluid,
        p_net,
        sets,
        tips: cls.tips,
        fill: cls.fill,
        velocity,
        fronts: rec.fronts,
        arrival,
        zero_vertex_arrival,
        leak_off: vec![0.0; n],
        total_leak_off: 0.0,
        injected_volume: volume,
        last_time_step: None,
        closed: false,
    })
}
