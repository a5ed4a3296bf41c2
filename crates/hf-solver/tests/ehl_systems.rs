use hf_elasticity::{DenseElasticity, ElasticityOperator};
use hf_mesh::CartesianMesh;
use hf_solver::{EhlInput, EhlSolverKind, FixedPointConfig, SolverError, solve_ehl};
use proptest::prelude::*;

const E_PRIME: f64 = 1e10;

struct Case {
    mesh: CartesianMesh,
    op: DenseElasticity,
    channel: Vec<usize>,
    tip: Vec<usize>,
    w_tip: Vec<f64>,
    w_prev: Vec<f64>,
    sigma0: Vec<f64>,
    leak_off: Vec<f64>,
    injection: Vec<f64>,
}

/// Square channel of half-width `r` cells with a one-cell tip ring.
fn square_case(r: usize) -> Case {
    let mesh = CartesianMesh::new(5.0, 5.0, 11, 11).unwrap();
    let op = DenseElasticity::new(&mesh, E_PRIME).unwrap();
    let mid = 5;
    let mut channel = Vec::new();
    let mut tip = Vec::new();
    for c in 0..mesh.num_cells() {
        let (i, j) = mesh.ij(c);
        let d = i.abs_diff(mid).max(j.abs_diff(mid));
        if d <= r {
            channel.push(c);
        } else if d == r + 1 {
            tip.push(c);
        }
    }
    let n = mesh.num_cells();
    let w_tip = vec![2e-5; tip.len()];
    Case {
        op,
        channel,
        tip,
        w_tip,
        w_prev: vec![0.0; n],
        sigma0: vec![1e6; n],
        leak_off: vec![0.0; n],
        injection: vec![0.0; n],
        mesh,
    }
}

impl Case {
    fn input<'a>(&'a self, loaded: &'a [(usize, f64)]) -> EhlInput<'a> {
        EhlInput {
            mesh: &self.mesh,
            operator: &self.op,
            channel: &self.channel,
            tip: &self.tip,
            w_tip: &self.w_tip,
            w_prev: &self.w_prev,
            sigma0: &self.sigma0,
            leak_off: &self.leak_off,
            injection: &self.injection,
            loaded,
            dt: 1.0,
            mu_prime: 1.2e-2,
            min_width: 1e-12,
        }
    }

    fn crack_volume(&self, width: &[f64]) -> f64 {
        self.channel
            .iter()
            .chain(&self.tip)
            .map(|&c| width[c])
            .sum::<f64>()
            * self.mesh.cell_area()
    }
}

#[test]
fn volume_control_balances_injection() {
    let mut case = square_case(2);
    let center = case.mesh.index(5, 5);
    case.injection[center] = 1e-3;
    case.leak_off[center] = 1e-5;
    let sol = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    let stored = case.crack_volume(&sol.width);
    assert!((stored - (1e-3 - 1e-5)).abs() < 1e-6 * 1e-3);

    let crack: Vec<usize> = case.channel.iter().chain(&case.tip).copied().collect();
    let w: Vec<f64> = crack.iter().map(|&c| sol.width[c]).collect();
    let traction = case.op.matvec(&case.channel, &crack, &w).unwrap();
    let p = sol.p_fluid[center];
    for (k, &c) in case.channel.iter().enumerate() {
        assert!((traction[k] + case.sigma0[c] - p).abs() < 1e-6 * p);
        assert_eq!(sol.p_fluid[c], p);
    }
    assert!(!sol.closed);
}

#[test]
fn mechanical_loading_hits_prescribed_width() {
    let mut case = square_case(2);
    case.tip.clear();
    case.w_tip.clear();
    let center = case.mesh.index(5, 5);
    let loaded = [(center, 1e-3)];
    let sol = solve_ehl(
        EhlSolverKind::MechanicalLoading,
        &case.input(&loaded),
        &FixedPointConfig::default(),
    )
    .unwrap();
    assert!((sol.width[center] - 1e-3).abs() < 1e-9);

    let w: Vec<f64> = case.channel.iter().map(|&c| sol.width[c]).collect();
    let traction = case.op.matvec(&case.channel, &case.channel, &w).unwrap();
    let p_net = sol.p_net[center];
    assert!(p_net > 0.0);
    for (k, &c) in case.channel.iter().enumerate() {
        assert!((traction[k] - p_net).abs() < 1e-6 * p_net, "cell {c}");
        assert!(sol.width[c] > 0.0);
    }
}

#[test]
fn mechanical_loading_rejects_unknown_cells() {
    let case = square_case(1);
    let loaded = [(0usize, 1e-3)];
    let err = solve_ehl(
        EhlSolverKind::MechanicalLoading,
        &case.input(&loaded),
        &FixedPointConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SolverError::ProblemSetup { .. }));
}

#[test]
fn viscous_flow_conserves_volume_and_drives_pressure_outward() {
    let mut case = square_case(2);
    let center = case.mesh.index(5, 5);
    for &c in &case.channel {
        let [x, y] = case.mesh.center(c);
        case.w_prev[c] = 1e-4 * (1.0 - (x * x + y * y) / 18.0).max(0.1);
    }
    for &c in &case.tip {
        case.w_prev[c] = 1e-5;
    }
    case.injection[center] = 1e-4;
    let sol = solve_ehl(
        EhlSolverKind::Viscous,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();

    let stored = case.crack_volume(&sol.width) - case.crack_volume(&case.w_prev);
    assert!((stored - 1e-4).abs() < 1e-6 * 1e-4);

    let tip_mean: f64 =
        case.tip.iter().map(|&c| sol.p_fluid[c]).sum::<f64>() / case.tip.len() as f64;
    assert!(sol.p_fluid[center] > tip_mean);
    assert!(sol.iterations >= 1);
}

#[test]
fn zero_load_closes_the_fracture() {
    let mut case = square_case(1);
    case.tip.clear();
    case.w_tip.clear();
    case.sigma0 = vec![0.0; case.mesh.num_cells()];
    let sol = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    assert!(sol.closed);
}

#[test]
fn non_finite_stress_is_not_valid() {
    let mut case = square_case(1);
    case.sigma0[case.channel[0]] = f64::NAN;
    let err = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SolverError::NotValid { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn stored_volume_tracks_injection_minus_leak_off(
        q in 1e-5f64..1e-2,
        leak_fraction in 0.0f64..0.5,
        r in 1usize..3,
    ) {
        let mut case = square_case(r);
        let center = case.mesh.index(5, 5);
        case.injection[center] = q;
        for &c in &case.channel {
            case.leak_off[c] = leak_fraction * q / case.channel.len() as f64;
        }
        let sol = solve_ehl(
            EhlSolverKind::VolumeControl,
            &case.input(&[]),
            &FixedPointConfig::default(),
        )
        .unwrap();
        let expected = q * (1.0 - leak_fraction);
        prop_assert!((case.crack_volume(&sol.width) - expected).abs() < 1e-6 * expected);
    }
}

#[test]
fn linear_assemblies_are_solved_directly() {
    let mut case = square_case(2);
    let center = case.mesh.index(5, 5);
    case.injection[center] = 1e-3;
    let vc = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    assert_eq!(vc.iterations, 1);

    case.tip.clear();
    case.w_tip.clear();
    let loaded = [(center, 1e-3)];
    let ml = solve_ehl(
        EhlSolverKind::MechanicalLoading,
        &case.input(&loaded),
        &FixedPointConfig::default(),
    )
    .unwrap();
    assert_eq!(ml.iterations, 1);
}

#[test]
fn quarter_solve_matches_the_full_volume_control() {
    let mut case = square_case(2);
    let center = case.mesh.index(5, 5);
    case.injection[center] = 1e-3;
    case.leak_off[center] = 1e-5;
    for &c in &case.channel {
        let [x, y] = case.mesh.center(c);
        case.w_prev[c] = 1e-5 * (1.0 + 0.1 * (x * x + 2.0 * y * y));
    }
    let full = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    let quarter = solve_ehl(
        EhlSolverKind::SymmetricVolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    assert_eq!(quarter.iterations, 1);
    for c in case.channel.iter().chain(&case.tip) {
        let (a, b) = (full.width[*c], quarter.width[*c]);
        assert!((a - b).abs() < 1e-9 * a.abs().max(1e-12), "cell {c}: {a} vs {b}");
        let (pa, pb) = (full.p_fluid[*c], quarter.p_fluid[*c]);
        assert!((pa - pb).abs() < 1e-9 * pa.abs(), "cell {c}: {pa} vs {pb}");
    }
    let stored = case.crack_volume(&quarter.width) - case.crack_volume(&case.w_prev);
    assert!((stored - (1e-3 - 1e-5)).abs() < 1e-6 * 1e-3);
}

#[test]
fn quarter_solve_rejects_a_lopsided_footprint() {
    let mut case = square_case(1);
    let extra = case.mesh.index(7, 5);
    case.tip.retain(|&c| c != extra);
    case.channel.push(extra);
    case.channel.sort_unstable();
    case.w_tip = vec![2e-5; case.tip.len()];
    let err = solve_ehl(
        EhlSolverKind::SymmetricVolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SolverError::ProblemSetup { .. }));
}

#[test]
fn separate_lobes_keep_their_own_volume() {
    let mut case = square_case(1);
    let lobe = |i0: usize| {
        (i0..i0 + 3).flat_map(|i| (4..7).map(move |j| (i, j)))
    };
    let mut channel: Vec<usize> = lobe(1)
        .chain(lobe(7))
        .map(|(i, j)| case.mesh.index(i, j))
        .collect();
    channel.sort_unstable();
    case.channel = channel;
    case.tip.clear();
    case.w_tip.clear();
    let source = case.mesh.index(2, 5);
    case.injection[source] = 1e-3;

    let sol = solve_ehl(
        EhlSolverKind::VolumeControl,
        &case.input(&[]),
        &FixedPointConfig::default(),
    )
    .unwrap();
    let area = case.mesh.cell_area();
    let volume_of = |i0: usize| -> f64 {
        lobe(i0).map(|(i, j)| sol.width[case.mesh.index(i, j)]).sum::<f64>() * area
    };
    assert!((volume_of(1) - 1e-3).abs() < 1e-6 * 1e-3);
    assert!(volume_of(7).abs() < 1e-9 * 1e-3);

    let fed = sol.p_fluid[source];
    let sealed = sol.p_fluid[case.mesh.index(8, 5)];
    assert!(fed > sealed, "{fed} vs {sealed}");
    for (i, j) in lobe(1) {
        assert_eq!(sol.p_fluid[case.mesh.index(i, j)], fed);
    }
}
