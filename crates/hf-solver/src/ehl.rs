//! Width/pressure solve over the crack cells.
//!
//! The channel widths are unknowns; tip widths come from the asymptote and
//! enter as data. Each assembly produces a dense linear system on the
//! current channel/tip index sets. The linear assemblies are solved once;
//! the lubrication assembly depends on the widths and is iterated by
//! [`fixed_point_solve`](crate::fixed_point::fixed_point_solve).

use hf_core::timing::step_timing;
use hf_elasticity::ElasticityOperator;
use hf_mesh::CartesianMesh;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::fixed_point::FixedPointConfig;
use crate::{mechanical, viscous, volume_control};

/// Equation assembly, fixed for the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EhlSolverKind {
    /// Uniform fluid pressure per fracture closing its volume balance
    VolumeControl,
    /// Volume control solved on the positive quadrant of a fracture
    /// symmetric about both mesh axes
    SymmetricVolumeControl,
    /// Prescribed openings on loaded cells, uniform net pressure
    MechanicalLoading,
    /// Lubrication flow with cubic-law conductivity
    #[default]
    Viscous,
}

/// Everything one width/pressure solve needs.
///
/// Per-cell slices (`w_prev`, `sigma0`, `leak_off`, `injection`) span the
/// whole mesh; `w_tip` is aligned with `tip`.
#[derive(Debug, Clone, Copy)]
pub struct EhlInput<'a> {
    pub mesh: &'a CartesianMesh,
    pub operator: &'a dyn ElasticityOperator,
    pub channel: &'a [usize],
    pub tip: &'a [usize],
    pub w_tip: &'a [f64],
    /// Widths of the last accepted state
    pub w_prev: &'a [f64],
    /// Confining stress
    pub sigma0: &'a [f64],
    /// Volume lost to the rock over the step
    pub leak_off: &'a [f64],
    /// Injection rate per cell (m³/s)
    pub injection: &'a [f64],
    /// Prescribed openings for mechanical loading
    pub loaded: &'a [(usize, f64)],
    pub dt: f64,
    pub mu_prime: f64,
    /// Width floor below which a cell counts as closed
    pub min_width: f64,
}

/// Solved widths and pressures over the whole mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct EhlSolution {
    pub width: Vec<f64>,
    pub p_fluid: Vec<f64>,
    pub p_net: Vec<f64>,
    pub iterations: usize,
    /// Every crack width is at or below the width floor
    pub closed: bool,
}

impl EhlInput<'_> {
    pub(crate) fn validate(&self) -> SolverResult<()> {
        let n = self.mesh.num_cells();
        if self.operator.num_cells() != n {
            return Err(SolverError::ProblemSetup {
                what: format!("operator has {} cells, mesh {}", self.operator.num_cells(), n),
            });
        }
        for (name, len) in [
            ("w_prev", self.w_prev.len()),
            ("sigma0", self.sigma0.len()),
            ("leak_off", self.leak_off.len()),
            ("injection", self.injection.len()),
        ] {
            if len != n {
                return Err(SolverError::ProblemSetup {
                    what: format!("{name} has {len} entries, expected {n}"),
                });
            }
        }
        if self.w_tip.len() != self.tip.len() {
            return Err(SolverError::ProblemSetup {
                what: "tip widths do not match tip cells".to_string(),
            });
        }
        if self.channel.is_empty() {
            return Err(SolverError::ProblemSetup {
                what: "no channel cells".to_string(),
            });
        }
        if !(self.dt > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("time step {} must be positive", self.dt),
            });
        }
        if let Some(&c) = self.channel.iter().chain(self.tip).find(|&&c| c >= n) {
            return Err(SolverError::ProblemSetup {
                what: format!("cell {c} out of range"),
            });
        }
        Ok(())
    }

    /// `C[channel, channel]` and `C[channel, tip]`.
    pub(crate) fn gather_blocks(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let _t = step_timing::ELASTICITY_GATHER.scope();
        (
            self.operator.gather(self.channel, self.channel),
            self.operator.gather(self.channel, self.tip),
        )
    }

    pub(crate) fn channel_prev(&self) -> DVector<f64> {
        DVector::from_iterator(self.channel.len(), self.channel.iter().map(|&c| self.w_prev[c]))
    }

    pub(crate) fn tip_widths(&self) -> DVector<f64> {
        DVector::from_column_slice(self.w_tip)
    }

    /// Assemble the full-mesh solution from channel widths and crack
    /// fluid pressures (`p_channel` aligned with `channel`, `p_tip` with `tip`).
    pub(crate) fn finish(
        &self,
        w_channel: &DVector<f64>,
        p_channel: &[f64],
        p_tip: &[f64],
        iterations: usize,
    ) -> EhlSolution {
        let n = self.mesh.num_cells();
        let mut width = self.w_prev.to_vec();
        let mut p_fluid = vec![0.0; n];
        let mut p_net = vec![0.0; n];
        for (k, &c) in self.channel.iter().enumerate() {
            width[c] = w_channel[k];
            p_fluid[c] = p_channel[k];
            p_net[c] = p_channel[k] - self.sigma0[c];
        }
        for (k, &c) in self.tip.iter().enumerate() {
            width[c] = self.w_tip[k];
            p_fluid[c] = p_tip[k];
            p_net[c] = p_tip[k] - self.sigma0[c];
        }
        let closed = self
            .channel
            .iter()
            .chain(self.tip)
            .all(|&c| width[c] <= self.min_width);
        EhlSolution {
            width,
            p_fluid,
            p_net,
            iterations,
            closed,
        }
    }
}

/// Dense LU solve reporting singular systems as invalid solutions.
pub(crate) fn lu_solve(a: DMatrix<f64>, b: &DVector<f64>) -> SolverResult<DVector<f64>> {
    let _t = step_timing::EHL_SOLVE.scope();
    a.lu().solve(b).ok_or_else(|| SolverError::NotValid {
        what: "singular width/pressure system".to_string(),
    })
}

/// Solve for the channel widths and crack pressures with the selected
/// assembly.
pub fn solve_ehl(
    kind: EhlSolverKind,
    input: &EhlInput<'_>,
    config: &FixedPointConfig,
) -> SolverResult<EhlSolution> {
    input.validate()?;
    let solution = match kind {
        EhlSolverKind::VolumeControl => volume_control::solve(input)?,
        EhlSolverKind::SymmetricVolumeControl => volume_control::solve_symmetric(input)?,
        EhlSolverKind::MechanicalLoading => mechanical::solve(input)?,
        EhlSolverKind::Viscous => viscous::solve(input, config)?,
    };
    if let Some(c) = input
        .channel
        .iter()
        .find(|&&c| !solution.width[c].is_finite() || !solution.p_fluid[c].is_finite())
    {
        return Err(SolverError::NotValid {
            what: format!("non-finite width or pressure at cell {c}"),
        });
    }
    debug!(
        ?kind,
        channel = input.channel.len(),
        tip = input.tip.len(),
        iterations = solution.iterations,
        closed = solution.closed,
        "width/pressure solved"
    );
    Ok(solution)
}
