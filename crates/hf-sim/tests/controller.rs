//! Driver behavior: mesh extension, barriers, bridging and termination.

use hf_core::units::{gpa, m3ps, pa_s};
use hf_mesh::CartesianMesh;
use hf_sim::{
    Axis, BridgeDecision, BridgingState, BridgingTarget, CaseConfig, Controller, FluidConfig,
    Fracture, InitialConfig, InitialRegime, InjectionConfig, MaterialConfig, Problem, RunEnd,
    SimError, SimulationConfig, StepStatus, ToughnessConfig, bridge, radial_fracture,
};
use hf_solver::EhlSolverKind;
use proptest::prelude::*;

fn small_case(config: SimulationConfig) -> (Problem, Fracture) {
    let mesh = CartesianMesh::new(3.0, 3.0, 11, 11).unwrap();
    let problem = Problem::new(
        mesh,
        &MaterialConfig::from_units(gpa(30.0), 0.25, 0.0),
        &FluidConfig::from_units(pa_s(1.1e-3)),
        &InjectionConfig::constant(m3ps(1e-3)),
        &config,
    )
    .unwrap();
    let initial = radial_fracture(
        &problem,
        &InitialConfig {
            radius: 1.8,
            regime: InitialRegime::Viscosity,
        },
    )
    .unwrap();
    (problem, initial)
}

fn small_controller(config: SimulationConfig) -> Controller {
    let (problem, initial) = small_case(config);
    Controller::new(problem, initial).unwrap()
}

#[test]
fn front_at_the_boundary_extends_the_mesh() {
    let controller = small_controller(SimulationConfig {
        max_steps: 8,
        ..SimulationConfig::default()
    });
    let area = controller.problem().mesh.cell_area();
    let mut controller = controller.with_termination(|f: &Fracture| f.sd.len() > 121);
    let summary = controller.run().unwrap();
    assert!(controller.extensions() >= 1, "{summary:?}");
    assert!(summary.reports.iter().any(|r| r.extended));
    let mesh = &controller.problem().mesh;
    assert!(mesh.nx() > 11 || mesh.ny() > 11);
    assert_eq!(mesh.cell_area(), area);

    let f = controller.latest();
    assert_eq!(f.num_cells(), mesh.num_cells());
    assert_eq!(f.mesh, mesh.descriptor());
    let stored = f.volume(area);
    assert!((stored - f.injected_volume).abs() < 1e-2 * f.injected_volume);
}

#[test]
fn extension_limit_stops_the_run() {
    let mut controller = small_controller(SimulationConfig {
        max_mesh_extensions: 0,
        max_steps: 8,
        ..SimulationConfig::default()
    });
    let err = controller.run().unwrap_err();
    assert!(matches!(err, SimError::ExtensionLimit { extensions: 0 }));
}

#[test]
fn cell_limit_stops_the_extension() {
    let mut controller = small_controller(SimulationConfig {
        max_cells: 121,
        max_steps: 8,
        ..SimulationConfig::default()
    });
    match controller.run() {
        Err(SimError::CellLimit { cells, limit }) => {
            assert_eq!(limit, 121);
            assert!(cells > limit);
        }
        other => panic!("expected the cell limit, got {other:?}"),
    }
    assert_eq!(controller.extensions(), 0);
    assert_eq!(controller.problem().mesh.num_cells(), 121);
}

#[test]
fn slow_front_cannot_blow_up_the_time_step() {
    let (problem, mut initial) = small_case(SimulationConfig::default());
    let h = problem.mesh.hx().min(problem.mesh.hy());
    let last = 0.5;
    initial.last_time_step = Some(last);

    // Moving, but the cell-crossing estimate is far beyond the last step.
    initial.velocity.iter_mut().for_each(|v| *v = 1e-3 * h / last);
    let controller = Controller::new(problem.clone(), initial.clone()).unwrap();
    assert_eq!(controller.next_time_step(), 2.0 * last);

    // Stagnant: the front would not move a measurable fraction of a cell.
    initial.velocity.iter_mut().for_each(|v| *v = 1e-15);
    let controller = Controller::new(problem, initial).unwrap();
    assert_eq!(controller.next_time_step(), last);
}

#[test]
fn without_remeshing_the_grid_end_fails_the_step() {
    let mut controller = small_controller(SimulationConfig {
        enable_remeshing: false,
        max_steps: 8,
        ..SimulationConfig::default()
    });
    match controller.run() {
        Err(SimError::StepFailed { status, .. }) => {
            assert_eq!(status, StepStatus::ReachedEndOfGrid);
            assert_eq!(status.code(), 12);
        }
        other => panic!("expected end of grid, got {other:?}"),
    }
}

#[test]
fn step_budget_ends_the_run() {
    let mut controller = small_controller(SimulationConfig {
        max_steps: 1,
        ..SimulationConfig::default()
    });
    let summary = controller.run().unwrap();
    assert_eq!(summary.end, RunEnd::MaxSteps);
    assert_eq!(summary.steps, 1);
    assert_eq!(
        controller.history().generation(),
        summary.steps + controller.extensions()
    );
}

#[test]
fn termination_criterion_is_checked_before_stepping() {
    let mut controller = small_controller(SimulationConfig::default())
        .with_termination(|f: &Fracture| f.time > 0.0);
    let summary = controller.run().unwrap();
    assert_eq!(summary.end, RunEnd::Terminated);
    assert_eq!(summary.steps, 0);
}

#[test]
fn toughness_barrier_confines_the_width() {
    let half_width = 2.4;
    let mesh = CartesianMesh::new(4.0, 7.0, 21, 29).unwrap();
    let hx = mesh.hx();
    let problem = Problem::new(
        mesh,
        &MaterialConfig {
            toughness: ToughnessConfig::Layered {
                k_ic: 1e6,
                ratio: 5.0,
                half_width,
                axis: Axis::X,
                smoothing: 0.0,
            },
            ..MaterialConfig::from_units(gpa(30.0), 0.25, 1e6)
        },
        &FluidConfig::from_units(pa_s(1e-5)),
        &InjectionConfig::constant(m3ps(1e-3)),
        &SimulationConfig {
            ehl_solver: EhlSolverKind::VolumeControl,
            enable_remeshing: false,
            max_steps: 80,
            ..SimulationConfig::default()
        },
    )
    .unwrap();
    let initial = radial_fracture(
        &problem,
        &InitialConfig {
            radius: 1.6,
            regime: InitialRegime::Toughness,
        },
    )
    .unwrap();
    let mut controller = Controller::new(problem, initial)
        .unwrap()
        .with_termination(|f: &Fracture| f.extent().is_some_and(|e| e[3] > 4.5));
    let summary = controller.run().unwrap();
    assert_eq!(summary.end, RunEnd::Terminated, "{summary:?}");

    let [x0, x1, y0, y1] = controller.latest().extent().unwrap();
    assert!(x1 < half_width + 1.5 * hx, "front crossed the barrier at x = {x1}");
    assert!(-x0 < half_width + 1.5 * hx, "front crossed the barrier at x = {x0}");
    assert!(y1 - y0 > x1 - x0);
}

#[derive(Debug)]
struct RadiusTarget(f64);

impl BridgingTarget for RadiusTarget {
    fn measure(&self, fracture: &Fracture) -> Option<f64> {
        fracture.mean_radius([0.0, 0.0])
    }

    fn threshold(&self) -> f64 {
        self.0
    }

    fn tolerance(&self) -> f64 {
        0.05
    }
}

#[test]
fn bridging_lands_on_the_target_radius() {
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
    let target = 3.0;
    let mut controller = Controller::new(problem, initial)
        .unwrap()
        .with_bridging(RadiusTarget(target))
        .with_termination(move |f: &Fracture| {
            f.mean_radius([0.0, 0.0]).is_some_and(|r| r >= target)
        });
    let summary = controller.run().unwrap();
    assert_eq!(summary.end, RunEnd::Terminated);
    let r = controller.latest().mean_radius([0.0, 0.0]).unwrap();
    assert!(r >= target && r <= target * 1.05, "radius {r}");
}

#[test]
fn case_file_builds_a_controller() {
    let yaml = r#"
mesh: { lx: 6.0, ly: 6.0, nx: 21, ny: 21 }
material:
  youngs_modulus: 3.0e10
  poisson_ratio: 0.25
  toughness: { type: uniform, k_ic: 0.5e6 }
  confining_stress: { type: uniform, sigma0: 1.0e6 }
fluid: { viscosity: 1.1e-3 }
injection: { rate: 1.0e-3 }
initial: { radius: 2.0, regime: viscosity }
simulation:
  final_time: 50.0
  tip_asymptote: universal
  front_reconstruction: original
"#;
    let case: CaseConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(case.simulation.max_reattempts, 8);
    let controller = Controller::from_case(&case).unwrap();
    let f = controller.latest();
    for &c in &f.sets.crack {
        assert!((f.p_fluid[c] - f.p_net[c] - 1.0e6).abs() < 1e-3);
    }
    let json = serde_json::to_string(f).unwrap();
    let back: Fracture = serde_json::from_str(&json).unwrap();
    assert_eq!(back.sets, f.sets);
    assert_eq!(back.mesh, f.mesh);
    for (a, b) in back.width.iter().zip(&f.width) {
        assert!((a - b).abs() <= 1e-12 * b.abs());
    }
}

proptest! {
    #[test]
    fn bisection_never_accepts_an_overshoot(
        rate in 0.5f64..20.0,
        threshold in 0.5f64..5.0,
        dt0 in 0.1f64..10.0,
    ) {
        let mut state = BridgingState::Idle;
        let mut dt = dt0;
        let mut accepted = None;
        for _ in 0..200 {
            let after = rate * dt;
            match bridge(state, threshold, 1e-2, 0.0, after, dt) {
                BridgeDecision::Accept(_) => {
                    accepted = Some(after);
                    break;
                }
                BridgeDecision::Retry { state: s, dt: next } => {
                    state = s;
                    dt = next;
                }
            }
        }
        let after = accepted.unwrap();
        prop_assert!(after <= threshold * 1.01 + 1e-12);
    }
}
