//! Step statuses and simulation errors.

use hf_core::HfError;
use hf_elasticity::ElasticityError;
use hf_front::FrontError;
use hf_levelset::LevelSetError;
use hf_mesh::MeshError;
use hf_solver::SolverError;
use hf_tip::TipError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome code of one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotPropagated,
    Propagated,
    LevelSetNotValid,
    FrontNotTracked,
    TipVolumeNotValid,
    EhlNotValid,
    EhlNotConverged,
    TipInversionFailed,
    RibbonNotFound,
    FillingFractionOutOfRange,
    ProjectionNotConverged,
    ProjectionNotFound,
    ReachedEndOfGrid,
    LeakOffNotValid,
    FullyClosed,
    ContinuousFrontNotConverged,
}

impl StepStatus {
    pub fn code(self) -> u8 {
        match self {
            StepStatus::NotPropagated => 0,
            StepStatus::Propagated => 1,
            StepStatus::LevelSetNotValid => 2,
            StepStatus::FrontNotTracked => 3,
            StepStatus::TipVolumeNotValid => 4,
            StepStatus::EhlNotValid => 5,
            StepStatus::EhlNotConverged => 6,
            StepStatus::TipInversionFailed => 7,
            StepStatus::RibbonNotFound => 8,
            StepStatus::FillingFractionOutOfRange => 9,
            StepStatus::ProjectionNotConverged => 10,
            StepStatus::ProjectionNotFound => 11,
            StepStatus::ReachedEndOfGrid => 12,
            StepStatus::LeakOffNotValid => 13,
            StepStatus::FullyClosed => 14,
            StepStatus::ContinuousFrontNotConverged => 15,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StepStatus::NotPropagated => "not propagated",
            StepStatus::Propagated => "propagated",
            StepStatus::LevelSetNotValid => "evaluated level set is not valid",
            StepStatus::FrontNotTracked => "front is not tracked correctly",
            StepStatus::TipVolumeNotValid => "evaluated tip volume is not valid",
            StepStatus::EhlNotValid => "solution of elastohydrodynamic solver is not valid",
            StepStatus::EhlNotConverged => "elastohydrodynamic solver did not converge",
            StepStatus::TipInversionFailed => "tip inversion not successful",
            StepStatus::RibbonNotFound => "ribbon cell not found in the enclosure of a tip cell",
            StepStatus::FillingFractionOutOfRange => "filling fraction not correct",
            StepStatus::ProjectionNotConverged => "toughness projection did not converge",
            StepStatus::ProjectionNotFound => "projection could not be found",
            StepStatus::ReachedEndOfGrid => "reached end of grid",
            StepStatus::LeakOffNotValid => "leak-off can't be evaluated",
            StepStatus::FullyClosed => "fracture fully closed",
            StepStatus::ContinuousFrontNotConverged => "continuous front did not converge",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Failure of a single step attempt. The accepted state is never touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Time step {dt} is not usable")]
    InvalidTimeStep { dt: f64 },

    #[error("Level set left {count} cells unreached")]
    LevelSetUnreached { count: usize },

    #[error(transparent)]
    LevelSet(#[from] LevelSetError),

    #[error(transparent)]
    Front(#[from] FrontError),

    #[error(transparent)]
    Tip(#[from] TipError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Toughness projection did not converge after {iterations} iterations (norm {norm})")]
    ProjectionNotConverged { iterations: usize, norm: f64 },

    #[error("Front direction could not be projected on ribbon cell {cell}")]
    ProjectionNotFound { cell: usize },
}

impl StepError {
    pub fn status(&self) -> StepStatus {
        match self {
            StepError::InvalidTimeStep { .. } => StepStatus::NotPropagated,
            StepError::LevelSetUnreached { .. } | StepError::LevelSet(_) => {
                StepStatus::LevelSetNotValid
            }
            StepError::Front(e) => match e {
                FrontError::NotTracked { .. } | FrontError::NoTipCells => {
                    StepStatus::FrontNotTracked
                }
                FrontError::ReachedEndOfGrid { .. } => StepStatus::ReachedEndOfGrid,
                FrontError::FillingFraction { .. } => StepStatus::FillingFractionOutOfRange,
                FrontError::NotConverged { .. } => StepStatus::ContinuousFrontNotConverged,
            },
            StepError::Tip(e) => match e {
                TipError::InversionFailed { .. } => StepStatus::TipInversionFailed,
                TipError::RibbonNotFound { .. } => StepStatus::RibbonNotFound,
                TipError::VolumeInvalid { .. } | TipError::InvalidParameter { .. } => {
                    StepStatus::TipVolumeNotValid
                }
                TipError::LeakOffInvalid { .. } => StepStatus::LeakOffNotValid,
            },
            StepError::Solver(e) => match e {
                SolverError::NotConverged { .. } => StepStatus::EhlNotConverged,
                _ => StepStatus::EhlNotValid,
            },
            StepError::ProjectionNotConverged { .. } => StepStatus::ProjectionNotConverged,
            StepError::ProjectionNotFound { .. } => StepStatus::ProjectionNotFound,
        }
    }

    /// Cells that reached the end of the grid, if that is the failure.
    pub fn end_of_grid_cells(&self) -> Option<&[usize]> {
        match self {
            StepError::Front(FrontError::ReachedEndOfGrid { cells }) => Some(cells),
            _ => None,
        }
    }
}

pub type StepResult<T> = Result<T, StepError>;

/// Errors of the simulation driver.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Step failed with status {status} after {attempts} attempts: {source}")]
    StepFailed {
        status: StepStatus,
        attempts: usize,
        #[source]
        source: StepError,
    },

    #[error("Mesh extended {extensions} times; limit reached")]
    ExtensionLimit { extensions: usize },

    #[error("Extended mesh would hold {cells} cells, more than {limit}")]
    CellLimit { cells: usize, limit: usize },

    #[error("Initialization failed: {what}")]
    Initialization { what: String },

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Elasticity(#[from] ElasticityError),

    #[error(transparent)]
    Step(#[from] StepError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<FrontError> for SimError {
    fn from(e: FrontError) -> Self {
        SimError::Step(StepError::Front(e))
    }
}

impl From<SimError> for HfError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::InvalidConfig { .. } => HfError::InvalidArg {
                what: "simulation configuration",
            },
            SimError::StepFailed { .. } | SimError::Step(_) => HfError::Invariant {
                what: "time step failed",
            },
            SimError::ExtensionLimit { .. } | SimError::CellLimit { .. } => HfError::Invariant {
                what: "mesh extension limit",
            },
            SimError::Initialization { .. } => HfError::Invariant {
                what: "fracture initialization",
            },
            SimError::Mesh(e) => e.into(),
            SimError::Elasticity(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_table() {
        let cases = [
            (
                StepError::Front(FrontError::ReachedEndOfGrid { cells: vec![3] }),
                12,
            ),
            (
                StepError::Front(FrontError::FillingFraction { cell: 0, value: 2.0 }),
                9,
            ),
            (StepError::Front(FrontError::NotConverged { iterations: 3 }), 15),
            (
                StepError::Tip(TipError::VolumeInvalid { cell: 1, value: f64::NAN }),
                4,
            ),
            (StepError::Tip(TipError::InversionFailed { cell: 1 }), 7),
            (
                StepError::Solver(SolverError::NotConverged {
                    iterations: 140,
                    change: 1.0,
                }),
                6,
            ),
            (
                StepError::ProjectionNotConverged {
                    iterations: 10,
                    norm: 0.1,
                },
                10,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.status().code(), code, "{err}");
        }
    }

    #[test]
    fn end_of_grid_carries_cells() {
        let err = StepError::Front(FrontError::ReachedEndOfGrid { cells: vec![4, 9] });
        assert_eq!(err.end_of_grid_cells(), Some(&[4, 9][..]));
        assert_eq!(StepError::InvalidTimeStep { dt: 0.0 }.end_of_grid_cells(), None);
    }
}
