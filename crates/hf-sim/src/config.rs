//! Simulation configuration.
//!
//! All structs are immutable once a [`Controller`](crate::Controller) is
//! built; method selectors are closed enums resolved at setup.

use hf_elasticity::ElasticityKind;
use hf_front::ReconstructionMethod;
use hf_solver::{EhlSolverKind, FixedPointConfig};
use hf_tip::TipAsymptote;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// What to do when the toughness projection runs out of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionPolicy {
    /// Keep the last estimate and log a warning
    #[default]
    SoftAccept,
    /// Fail the step with status 10
    Fail,
}

/// Numerical parameters of the time stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Relative tolerance on the front position
    pub tol_front: f64,
    /// Relative tolerance of the width/pressure fixed point
    pub tol_ehl: f64,
    /// Tolerance on the change of the ribbon front angles
    pub tol_projection: f64,
    /// Front advance (in cell diagonals per step) below which a tip cell is stagnant
    pub tol_v_stagnant: f64,
    /// Search-band growth iterations of the continuous front
    pub max_front_itrs: usize,
    pub max_solver_itrs: usize,
    pub max_proj_itrs: usize,
    /// Relaxation of the width/pressure fixed point
    pub ehl_relaxation: f64,
    /// Time step as a fraction of the time the front needs to cross a cell
    pub time_step_prefactor: f64,
    /// Fixed time step; overrides the velocity-based estimate
    pub fixed_time_step: Option<f64>,
    /// Upper bound on any time step
    pub time_step_limit: Option<f64>,
    /// Largest ratio between consecutive velocity-based time steps
    pub max_time_step_growth: f64,
    pub final_time: f64,
    pub max_steps: usize,
    pub max_reattempts: usize,
    pub reattempt_factor: f64,
    /// Extend the mesh when the front reaches the end of the grid
    pub enable_remeshing: bool,
    pub mesh_extension_factor: f64,
    pub max_mesh_extensions: usize,
    /// Mesh size beyond which the domain is not extended any further
    pub max_cells: usize,
    /// Width floor below which the fracture counts as closed
    pub min_width: f64,
    /// Accepted generations kept in the history ring
    pub history_capacity: usize,
    pub tip_asymptote: TipAsymptote,
    pub front_reconstruction: ReconstructionMethod,
    pub ehl_solver: EhlSolverKind,
    pub elasticity: ElasticityKind,
    pub projection_policy: ProjectionPolicy,
    /// Openings imposed for mechanical loading
    pub loading: Vec<PrescribedOpening>,
}

/// Opening imposed on the cell containing `point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrescribedOpening {
    pub point: [f64; 2],
    pub width: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tol_front: 1e-3,
            tol_ehl: 1e-4,
            tol_projection: 2.5e-3,
            tol_v_stagnant: 1e-6,
            max_front_itrs: 25,
            max_solver_itrs: 140,
            max_proj_itrs: 10,
            ehl_relaxation: 1.0,
            time_step_prefactor: 0.8,
            fixed_time_step: None,
            time_step_limit: None,
            max_time_step_growth: 2.0,
            final_time: 1000.0,
            max_steps: 2000,
            max_reattempts: 8,
            reattempt_factor: 0.8,
            enable_remeshing: true,
            mesh_extension_factor: 2.0,
            max_mesh_extensions: 4,
            max_cells: 10_000,
            min_width: 1e-12,
            history_capacity: 4,
            tip_asymptote: TipAsymptote::default(),
            front_reconstruction: ReconstructionMethod::default(),
            ehl_solver: EhlSolverKind::default(),
            elasticity: ElasticityKind::default(),
            projection_policy: ProjectionPolicy::default(),
            loading: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            ("tol_front", self.tol_front),
            ("tol_ehl", self.tol_ehl),
            ("tol_projection", self.tol_projection),
            ("time_step_prefactor", self.time_step_prefactor),
            ("final_time", self.final_time),
            ("min_width", self.min_width),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SimError::InvalidConfig {
                    what: format!("{name} must be positive and finite, got {value}"),
                });
            }
        }
        if !(self.reattempt_factor > 0.0 && self.reattempt_factor < 1.0) {
            return Err(SimError::InvalidConfig {
                what: format!("reattempt_factor must lie in (0, 1), got {}", self.reattempt_factor),
            });
        }
        if !(self.ehl_relaxation > 0.0 && self.ehl_relaxation <= 1.0) {
            return Err(SimError::InvalidConfig {
                what: format!("ehl_relaxation must lie in (0, 1], got {}", self.ehl_relaxation),
            });
        }
        if !(self.max_time_step_growth > 1.0) {
            return Err(SimError::InvalidConfig {
                what: format!(
                    "max_time_step_growth must exceed 1, got {}",
                    self.max_time_step_growth
                ),
            });
        }
        if self.mesh_extension_factor <= 1.0 {
            return Err(SimError::InvalidConfig {
                what: format!(
                    "mesh_extension_factor must exceed 1, got {}",
                    self.mesh_extension_factor
                ),
            });
        }
        for (name, value) in [
            ("fixed_time_step", self.fixed_time_step),
            ("time_step_limit", self.time_step_limit),
        ] {
            if let Some(v) = value
                && !(v > 0.0)
            {
                return Err(SimError::InvalidConfig {
                    what: format!("{name} must be positive, got {v}"),
                });
            }
        }
        if self.max_steps == 0
            || self.max_solver_itrs == 0
            || self.max_proj_itrs == 0
            || self.max_cells == 0
        {
            return Err(SimError::InvalidConfig {
                what: "iteration and step budgets must be positive".to_string(),
            });
        }
        if let Some(o) = self.loading.iter().find(|o| !(o.width >= 0.0)) {
            return Err(SimError::InvalidConfig {
                what: format!("prescribed opening {} must be non-negative", o.width),
            });
        }
        if self.history_capacity == 0 {
            return Err(SimError::InvalidConfig {
                what: "history_capacity must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn fixed_point(&self) -> FixedPointConfig {
        FixedPointConfig {
            max_iterations: self.max_solver_itrs,
            tolerance: self.tol_ehl,
            relaxation: self.ehl_relaxation,
        }
    }
}

/// Mesh of the case: half-lengths and cell counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub lx: f64,
    pub ly: f64,
    pub nx: usize,
    pub ny: usize,
}

/// Initial radial footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConfig {
    pub radius: f64,
    #[serde(default)]
    pub regime: InitialRegime,
}

/// Self-similar scaling used to date the initial footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialRegime {
    /// Toughness-dominated vertex
    Toughness,
    /// Viscosity-dominated vertex
    #[default]
    Viscosity,
}

/// A complete case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseConfig {
    pub mesh: MeshConfig,
    pub material: crate::properties::MaterialConfig,
    pub fluid: crate::properties::FluidConfig,
    pub injection: crate::properties::InjectionConfig,
    pub initial: InitialConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimulationConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.max_front_itrs, 25);
        assert_eq!(cfg.max_solver_itrs, 140);
        assert_eq!(cfg.projection_policy, ProjectionPolicy::SoftAccept);
        assert_eq!(cfg.front_reconstruction, ReconstructionMethod::Original);
        assert_eq!(cfg.fixed_point().tolerance, 1e-4);
    }

    #[test]
    fn rejects_growing_reattempt_factor() {
        let cfg = SimulationConfig {
            reattempt_factor: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_shrinking_step_growth() {
        let cfg = SimulationConfig {
            max_time_step_growth: 0.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_non_positive_fixed_step() {
        let cfg = SimulationConfig {
            fixed_time_step: Some(0.0),
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
