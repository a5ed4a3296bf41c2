use hf_front::{
    ReconstructionMethod, TipGeometry, classify, filled_area, power_integral, reconstruct_front,
};
use hf_mesh::CartesianMesh;
use proptest::prelude::*;

const METHODS: [ReconstructionMethod; 3] = [
    ReconstructionMethod::Original,
    ReconstructionMethod::Gradient,
    ReconstructionMethod::Continuous,
];

fn circle(mesh: &CartesianMesh, r: f64) -> Vec<f64> {
    mesh.centers()
        .iter()
        .map(|p| p[0].hypot(p[1]) - r)
        .collect()
}

fn deep_inside(sd: &[f64], depth: f64) -> Vec<usize> {
    (0..sd.len()).filter(|&c| sd[c] < -depth).collect()
}

#[test]
fn footprint_area_matches_circle() {
    let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
    let r = 4.3;
    let sd = circle(&mesh, r);
    let channel = deep_inside(&sd, 0.75);
    let all: Vec<usize> = (0..mesh.num_cells()).collect();
    let exact = std::f64::consts::PI * r * r;
    for method in METHODS {
        let rec = reconstruct_front(method, &mesh, &sd, &channel, &all, 10).unwrap();
        let cls = classify(&mesh, &channel, &rec).unwrap();
        let area = cls.sets.channel.len() as f64 * mesh.cell_area()
            + cls.fill.iter().sum::<f64>() * mesh.cell_area();
        assert!(
            (area - exact).abs() < 0.04 * exact,
            "{method:?}: area {area} vs {exact}"
        );
        assert!(!cls.sets.ribbon.is_empty());
        for &c in &cls.sets.tip {
            assert!(sd[c] > -mesh.cell_diag() && sd[c] < mesh.cell_diag());
        }
    }
}

#[test]
fn reconstruction_is_a_fixed_point() {
    let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
    let sd = circle(&mesh, 3.7);
    let channel = deep_inside(&sd, 0.75);
    let all: Vec<usize> = (0..mesh.num_cells()).collect();
    for method in METHODS {
        let first = reconstruct_front(method, &mesh, &sd, &channel, &all, 10).unwrap();
        let second = reconstruct_front(method, &mesh, &first.sd, &channel, &all, 10).unwrap();
        assert_eq!(first.tips, second.tips, "{method:?}");
        assert_eq!(first.fronts, second.fronts, "{method:?}");
        assert!(second.plugged.is_empty());
    }
}

#[test]
fn continuous_front_is_closed_and_ordered() {
    let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
    let sd = circle(&mesh, 5.1);
    let channel = deep_inside(&sd, 0.75);
    let all: Vec<usize> = (0..mesh.num_cells()).collect();
    let rec = reconstruct_front(
        ReconstructionMethod::Continuous,
        &mesh,
        &sd,
        &channel,
        &all,
        10,
    )
    .unwrap();
    assert_eq!(rec.fronts.len(), 1);
    let front = &rec.fronts[0];
    assert!(front.closed);
    for pair in front.segments.windows(2) {
        let (end, start) = (pair[0][1], pair[1][0]);
        assert!((end[0] - start[0]).abs() < 1e-12 && (end[1] - start[1]).abs() < 1e-12);
    }
}

#[test]
fn tips_near_the_boundary_end_the_grid() {
    let mesh = CartesianMesh::new(5.0, 5.0, 11, 11).unwrap();
    let sd = circle(&mesh, 3.6);
    let channel = deep_inside(&sd, 0.75);
    let all: Vec<usize> = (0..mesh.num_cells()).collect();
    let err = reconstruct_front(
        ReconstructionMethod::Original,
        &mesh,
        &sd,
        &channel,
        &all,
        10,
    )
    .unwrap_err();
    assert!(matches!(err, hf_front::FrontError::ReachedEndOfGrid { .. }));
}

proptest! {
    #[test]
    fn filling_fraction_stays_in_unit_interval(
        l in 0.0f64..3.0,
        alpha in 0.0f64..std::f64::consts::FRAC_PI_2,
        hx in 0.1f64..2.0,
        hy in 0.1f64..2.0,
    ) {
        let a = filled_area(l, alpha, hx, hy);
        prop_assert!(a >= 0.0);
        prop_assert!(a <= hx * hy * (1.0 + 1e-12));
    }

    #[test]
    fn filled_area_grows_with_distance(
        l in 0.0f64..2.0,
        dl in 0.0f64..1.0,
        alpha in 0.0f64..std::f64::consts::FRAC_PI_2,
    ) {
        let a = power_integral(l, alpha, 1.0, 1.0, 0.0);
        let b = power_integral(l + dl, alpha, 1.0, 1.0, 0.0);
        prop_assert!(b >= a - 1e-9);
    }

    #[test]
    fn segment_points_lie_on_the_front(
        l in 0.05f64..1.2,
        alpha in 0.01f64..1.56,
    ) {
        let mesh = CartesianMesh::new(2.0, 2.0, 5, 5).unwrap();
        let tip = TipGeometry {
            cell: mesh.index(2, 2),
            zero_vertex: hf_front::Corner::TopRight,
            l,
            alpha,
        };
        if let Some(seg) = tip.segment(&mesh) {
            for p in seg {
                prop_assert!(tip.distance_behind(&mesh, p).abs() < 1e-9);
            }
        }
    }
}
