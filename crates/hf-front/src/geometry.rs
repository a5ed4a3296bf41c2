//! Geometry of a straight front segment inside one cell.
//!
//! A tip cell is described by its zero vertex (the cell corner the front
//! moves away from), the distance `l` from that vertex to the front line and
//! the angle `alpha` of the outward normal to the local x axis. In the local
//! frame the vertex sits at the origin and the cell occupies
//! `[0, hx] × [0, hy]`; the fluid-filled part is where
//! `x·cos(alpha) + y·sin(alpha) ≤ l`, and the distance behind the front at a
//! point is `s = l − x·cos(alpha) − y·sin(alpha)`.

use hf_mesh::CartesianMesh;
use serde::{Deserialize, Serialize};

/// Below this `sin`/`cos` the front is treated as parallel to a cell edge.
const DEGENERATE: f64 = 1e-6;

/// Eight-point Gauss-Legendre rule on `[-1, 1]`.
const GAUSS_NODES: [f64; 4] = [
    0.183_434_642_495_649_8,
    0.525_532_409_916_329_0,
    0.796_666_477_413_626_7,
    0.960_289_856_497_536_3,
];
const GAUSS_WEIGHTS: [f64; 4] = [
    0.362_683_783_378_362_0,
    0.313_706_645_877_887_3,
    0.222_381_034_453_374_5,
    0.101_228_536_290_376_3,
];

/// Cell corner used as the zero vertex of a tip cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopRight,
        Corner::TopLeft,
    ];

    /// Corner whose local axes point along `+x` (`x_positive`) and `+y`
    /// (`y_positive`).
    pub fn from_axes(x_positive: bool, y_positive: bool) -> Corner {
        match (x_positive, y_positive) {
            (true, true) => Corner::BottomLeft,
            (false, true) => Corner::BottomRight,
            (false, false) => Corner::TopRight,
            (true, false) => Corner::TopLeft,
        }
    }

    /// Signs of the local axes in the global frame.
    pub fn axes(self) -> (f64, f64) {
        match self {
            Corner::BottomLeft => (1.0, 1.0),
            Corner::BottomRight => (-1.0, 1.0),
            Corner::TopRight => (-1.0, -1.0),
            Corner::TopLeft => (1.0, -1.0),
        }
    }

    /// Position in [`CartesianMesh::cell_vertices`] order.
    pub fn index(self) -> usize {
        match self {
            Corner::BottomLeft => 0,
            Corner::BottomRight => 1,
            Corner::TopRight => 2,
            Corner::TopLeft => 3,
        }
    }

    /// Offset from the cell center.
    pub fn offset(self, hx: f64, hy: f64) -> [f64; 2] {
        let (sx, sy) = self.axes();
        [-sx * hx / 2.0, -sy * hy / 2.0]
    }
}

/// Straight-front description of one tip cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TipGeometry {
    pub cell: usize,
    pub zero_vertex: Corner,
    /// Distance from the zero vertex to the front line
    pub l: f64,
    /// Angle of the outward normal to the local x axis, in `[0, π/2]`
    pub alpha: f64,
}

impl TipGeometry {
    /// Geometry of the line through `point` with outward unit `normal`.
    pub fn from_line(mesh: &CartesianMesh, cell: usize, point: [f64; 2], normal: [f64; 2]) -> Self {
        let zero_vertex = Corner::from_axes(normal[0] >= 0.0, normal[1] >= 0.0);
        let c = mesh.center(cell);
        let off = zero_vertex.offset(mesh.hx(), mesh.hy());
        let v = [c[0] + off[0], c[1] + off[1]];
        let l = (point[0] - v[0]) * normal[0] + (point[1] - v[1]) * normal[1];
        Self {
            cell,
            zero_vertex,
            l,
            alpha: normal[1].abs().atan2(normal[0].abs()),
        }
    }

    pub fn zero_vertex_position(&self, mesh: &CartesianMesh) -> [f64; 2] {
        let c = mesh.center(self.cell);
        let off = self.zero_vertex.offset(mesh.hx(), mesh.hy());
        [c[0] + off[0], c[1] + off[1]]
    }

    /// Outward unit normal in the global frame.
    pub fn normal(&self) -> [f64; 2] {
        let (sx, sy) = self.zero_vertex.axes();
        let (s, c) = self.alpha.sin_cos();
        [sx * c, sy * s]
    }

    /// Distance behind the front at a global point (negative ahead of it).
    pub fn distance_behind(&self, mesh: &CartesianMesh, p: [f64; 2]) -> f64 {
        let v = self.zero_vertex_position(mesh);
        let n = self.normal();
        self.l - ((p[0] - v[0]) * n[0] + (p[1] - v[1]) * n[1])
    }

    pub fn filled_area(&self, hx: f64, hy: f64) -> f64 {
        filled_area(self.l, self.alpha, hx, hy)
    }

    pub fn filling_fraction(&self, hx: f64, hy: f64) -> f64 {
        self.filled_area(hx, hy) / (hx * hy)
    }

    /// End points of the front segment inside the cell, `None` when the
    /// line misses the cell.
    pub fn segment(&self, mesh: &CartesianMesh) -> Option<[[f64; 2]; 2]> {
        let (hx, hy) = (mesh.hx(), mesh.hy());
        let (s, c) = self.alpha.sin_cos();
        let l = self.l;
        let tol = 1e-12 * (hx + hy);
        let inside = |p: [f64; 2]| {
            p[0] >= -tol && p[0] <= hx + tol && p[1] >= -tol && p[1] <= hy + tol
        };

        let mut local: Vec<[f64; 2]> = Vec::with_capacity(4);
        if s > DEGENERATE {
            local.push([0.0, l / s]);
            local.push([hx, (l - hx * c) / s]);
        }
        if c > DEGENERATE {
            local.push([l / c, 0.0]);
            local.push([(l - hy * s) / c, hy]);
        }
        let mut hits: Vec<[f64; 2]> = Vec::with_capacity(2);
        for p in local.into_iter().filter(|&p| inside(p)) {
            if hits
                .iter()
                .all(|q| (q[0] - p[0]).abs() + (q[1] - p[1]).abs() > tol)
            {
                hits.push(p);
            }
        }
        if hits.len() < 2 {
            return None;
        }
        let v = self.zero_vertex_position(mesh);
        let (sx, sy) = self.zero_vertex.axes();
        let global = |p: [f64; 2]| [v[0] + sx * p[0], v[1] + sy * p[1]];
        Some([global(hits[0]), global(hits[1])])
    }
}

/// `∫∫ s^beta dA` over the filled part of the cell.
pub fn power_integral(l: f64, alpha: f64, hx: f64, hy: f64, beta: f64) -> f64 {
    if !(l > 0.0) {
        return 0.0;
    }
    let (s, c) = alpha.sin_cos();
    let first = |t: f64| {
        if t > 0.0 {
            t.powf(beta + 1.0) / (beta + 1.0)
        } else {
            0.0
        }
    };
    if s < DEGENERATE {
        return hy * (first(l) - first(l - hx * c)) / c;
    }
    if c < DEGENERATE {
        return hx * (first(l) - first(l - hy * s)) / s;
    }
    let second = |t: f64| {
        if t > 0.0 {
            t.powf(beta + 2.0) / ((beta + 1.0) * (beta + 2.0))
        } else {
            0.0
        }
    };
    (second(l) - second(l - hx * c) - second(l - hy * s) + second(l - hx * c - hy * s)) / (c * s)
}

/// Area of the filled part of the cell.
pub fn filled_area(l: f64, alpha: f64, hx: f64, hy: f64) -> f64 {
    power_integral(l, alpha, hx, hy, 0.0).clamp(0.0, hx * hy)
}

/// Length of the chord at distance `u` from the zero vertex along the normal.
fn chord_length(u: f64, hx: f64, hy: f64, c: f64, s: f64) -> f64 {
    if s < DEGENERATE {
        return if u >= 0.0 && u <= hx * c { hy } else { 0.0 };
    }
    if c < DEGENERATE {
        return if u >= 0.0 && u <= hy * s { hx } else { 0.0 };
    }
    let ramp = |t: f64| t.max(0.0);
    (ramp(u) - ramp(u - hx * c) - ramp(u - hy * s) + ramp(u - hx * c - hy * s)) / (c * s)
}

/// `∫∫ f(s) dA` over the filled part of the cell by Gauss-Legendre
/// quadrature.
///
/// The integral is taken along the normal, piecewise between the corners of
/// the chord-length profile, in the variable `τ = √s` so that square-root
/// behavior at the front is integrated accurately.
pub fn integrate_filled(l: f64, alpha: f64, hx: f64, hy: f64, f: impl Fn(f64) -> f64) -> f64 {
    if !(l > 0.0) {
        return 0.0;
    }
    let (s, c) = alpha.sin_cos();
    let span = if s < DEGENERATE {
        hx * c
    } else if c < DEGENERATE {
        hy * s
    } else {
        hx * c + hy * s
    };
    let top = l.min(span);
    let mut knots = vec![0.0, top];
    for k in [hx * c, hy * s] {
        if k > 0.0 && k < top {
            knots.push(k);
        }
    }
    knots.sort_by(|a, b| a.total_cmp(b));
    knots.dedup_by(|a, b| (*a - *b).abs() < 1e-14 * span);

    let mut total = 0.0;
    for w in knots.windows(2) {
        let (u0, u1) = (w[0], w[1]);
        let (ta, tb) = ((l - u1).max(0.0).sqrt(), (l - u0).max(0.0).sqrt());
        let (mid, half) = ((ta + tb) / 2.0, (tb - ta) / 2.0);
        for (&x, &wt) in GAUSS_NODES.iter().zip(&GAUSS_WEIGHTS) {
            for tau in [mid - half * x, mid + half * x] {
                let sigma = tau * tau;
                total += wt * half * f(sigma) * chord_length(l - sigma, hx, hy, c, s) * 2.0 * tau;
            }
        }
    }
    total
}
