//! Error types for the width/pressure solve.

use hf_core::error::HfError;
use hf_elasticity::ElasticityError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Solution of the elastohydrodynamic system is not valid: {what}")]
    NotValid { what: String },

    #[error("Elastohydrodynamic iteration did not converge after {iterations} iterations (change {change:.3e})")]
    NotConverged { iterations: usize, change: f64 },

    #[error("Elasticity error: {0}")]
    Elasticity(#[from] ElasticityError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for HfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what: _ } => HfError::InvalidArg {
                what: "problem setup",
            },
            SolverError::NotValid { what: _ } => HfError::Invariant {
                what: "elastohydrodynamic solution",
            },
            SolverError::NotConverged { change, .. } => HfError::NonFinite {
                what: "elastohydrodynamic convergence",
                value: change,
            },
            SolverError::Elasticity(e) => e.into(),
        }
    }
}
