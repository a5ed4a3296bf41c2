//! Fast marching on the cell-centered grid.
//!
//! Solves `|∇φ| = 1` from a set of known cells, accepting cells in order of
//! increasing value. Values therefore grow away from the known cells; the
//! inward pass of a signed distance works on the negated field.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hf_mesh::CartesianMesh;
use tracing::debug;

use crate::error::{LevelSetError, LevelSetResult};

/// Value of cells that no pass has reached.
pub const UNSOLVED: f64 = 1e50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Far,
    Trial,
    Accepted,
}

#[derive(Debug, Clone, Copy)]
struct Trial {
    value: f64,
    cell: usize,
}

impl PartialEq for Trial {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Trial {}

impl PartialOrd for Trial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Trial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(self.cell.cmp(&other.cell))
    }
}

/// Outcome of one marching pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarchReport {
    /// Region cells accepted by the pass
    pub accepted: usize,
    /// Region cells the front never reached; they keep [`UNSOLVED`]
    pub unreached: Vec<usize>,
}

/// Fast-marching solver holding the level-set values between passes.
#[derive(Debug, Clone)]
pub struct FastMarching<'m> {
    mesh: &'m CartesianMesh,
    values: Vec<f64>,
    state: Vec<CellState>,
    in_region: Vec<bool>,
}

impl<'m> FastMarching<'m> {
    pub fn new(mesh: &'m CartesianMesh) -> Self {
        let n = mesh.num_cells();
        Self {
            mesh,
            values: vec![UNSOLVED; n],
            state: vec![CellState::Far; n],
            in_region: vec![false; n],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// March from `known` over `region`. Cells outside both keep whatever a
    /// previous pass left in them.
    pub fn solve(
        &mut self,
        known: &[(usize, f64)],
        region: &[usize],
    ) -> LevelSetResult<MarchReport> {
        if known.is_empty() {
            return Err(LevelSetError::NoKnownCells);
        }
        let len = self.mesh.num_cells();
        self.state.fill(CellState::Far);
        self.in_region.fill(false);

        for &cell in region {
            if cell >= len {
                return Err(LevelSetError::CellOutOfRange { cell, len });
            }
            self.in_region[cell] = true;
            self.values[cell] = UNSOLVED;
        }
        for &(cell, value) in known {
            if cell >= len {
                return Err(LevelSetError::CellOutOfRange { cell, len });
            }
            if !value.is_finite() {
                return Err(LevelSetError::NonFiniteKnown { cell, value });
            }
            self.values[cell] = value;
            self.state[cell] = CellState::Accepted;
            self.in_region[cell] = false;
        }

        let mut heap = BinaryHeap::new();
        for &(cell, _) in known {
            self.update_neighbors(cell, &mut heap);
        }

        let mut accepted = 0;
        while let Some(Reverse(trial)) = heap.pop() {
            let cell = trial.cell;
            if self.state[cell] == CellState::Accepted || trial.value > self.values[cell] {
                continue;
            }
            self.state[cell] = CellState::Accepted;
            accepted += 1;
            self.update_neighbors(cell, &mut heap);
        }

        let unreached: Vec<usize> = region
            .iter()
            .copied()
            .filter(|&c| self.in_region[c] && self.state[c] != CellState::Accepted)
            .collect();
        if !unreached.is_empty() {
            debug!(count = unreached.len(), "fast marching left cells unreached");
        }
        Ok(MarchReport {
            accepted,
            unreached,
        })
    }

    fn update_neighbors(&mut self, cell: usize, heap: &mut BinaryHeap<Reverse<Trial>>) {
        for n in self.mesh.neighbors(cell) {
            if n == cell || !self.in_region[n] || self.state[n] == CellState::Accepted {
                continue;
            }
            let value = self.eikonal_update(n);
            if value < self.values[n] {
                self.values[n] = value;
                self.state[n] = CellState::Trial;
                heap.push(Reverse(Trial { value, cell: n }));
            }
        }
    }

    fn accepted_min(&self, cell: usize, a: usize, b: usize) -> f64 {
        [a, b]
            .into_iter()
            .filter(|&n| n != cell && self.state[n] == CellState::Accepted)
            .map(|n| self.values[n])
            .fold(f64::INFINITY, f64::min)
    }

    fn eikonal_update(&self, cell: usize) -> f64 {
        let [left, right, bottom, top] = self.mesh.neighbors(cell);
        let ax = self.accepted_min(cell, left, right);
        let ay = self.accepted_min(cell, bottom, top);
        eikonal_two_sided(ax, ay, self.mesh.hx(), self.mesh.hy())
    }
}

/// First-order upwind solution of `((T-ax)/hx)² + ((T-ay)/hy)² = 1`,
/// falling back to the one-sided update when the quadratic has no upwind root.
fn eikonal_two_sided(ax: f64, ay: f64, hx: f64, hy: f64) -> f64 {
    if !ax.is_finite() {
        return ay + hy;
    }
    if !ay.is_finite() {
        return ax + hx;
    }
    let (ix2, iy2) = (1.0 / (hx * hx), 1.0 / (hy * hy));
    let qa = ix2 + iy2;
    let qb = -2.0 * (ax * ix2 + ay * iy2);
    let qc = ax * ax * ix2 + ay * ay * iy2 - 1.0;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc >= 0.0 {
        let t = (-qb + disc.sqrt()) / (2.0 * qa);
        if t >= ax.max(ay) {
            return t;
        }
    }
    (ax + hx).min(ay + hy)
}

/// Signed distance from `known` front values: an outward pass over
/// `outward` and a negated pass over `inward`.
///
/// Known cells keep their values. Cells in neither region are [`UNSOLVED`].
pub fn two_pass_signed_distance(
    mesh: &CartesianMesh,
    known: &[(usize, f64)],
    outward: &[usize],
    inward: &[usize],
) -> LevelSetResult<(Vec<f64>, MarchReport)> {
    let mut fmm = FastMarching::new(mesh);
    let out_report = fmm.solve(known, outward)?;
    let mut phi = fmm.values().to_vec();

    let negated: Vec<(usize, f64)> = known.iter().map(|&(c, v)| (c, -v)).collect();
    let in_report = fmm.solve(&negated, inward)?;
    let psi = fmm.values();
    for &c in inward {
        phi[c] = -psi[c];
    }
    for &(c, v) in known {
        phi[c] = v;
    }

    let mut unreached = out_report.unreached;
    unreached.extend(in_report.unreached);
    Ok((
        phi,
        MarchReport {
            accepted: out_report.accepted + in_report.accepted,
            unreached,
        },
    ))
}
