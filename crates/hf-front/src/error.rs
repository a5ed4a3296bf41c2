//! Front reconstruction and classification errors.

use hf_core::HfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontError {
    #[error("Front is not tracked correctly at cell {cell}: {what}")]
    NotTracked { cell: usize, what: &'static str },

    #[error("Front reached the end of the grid ({} cells in the boundary band)", cells.len())]
    ReachedEndOfGrid { cells: Vec<usize> },

    #[error("Filling fraction {value} of cell {cell} is out of range")]
    FillingFraction { cell: usize, value: f64 },

    #[error("Reconstruction produced no tip cells")]
    NoTipCells,

    #[error("Continuous front not contained in the search band after {iterations} iterations")]
    NotConverged { iterations: usize },
}

pub type FrontResult<T> = Result<T, FrontError>;

impl From<FrontError> for HfError {
    fn from(e: FrontError) -> Self {
        match e {
            FrontError::NotTracked { .. } => HfError::Invariant {
                what: "front not tracked",
            },
            FrontError::ReachedEndOfGrid { .. } => HfError::Invariant {
                what: "front reached end of grid",
            },
            FrontError::FillingFraction { value, .. } => HfError::NonFinite {
                what: "filling fraction",
                value,
            },
            FrontError::NoTipCells => HfError::EmptySet { what: "tip cells" },
            FrontError::NotConverged { .. } => HfError::Invariant {
                what: "continuous front did not converge",
            },
        }
    }
}
