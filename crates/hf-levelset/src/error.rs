//! Level-set error types.

use hf_core::HfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelSetError {
    #[error("Known value for cell {cell} is not finite: {value}")]
    NonFiniteKnown { cell: usize, value: f64 },

    #[error("Cell {cell} out of range for mesh of {len} cells")]
    CellOutOfRange { cell: usize, len: usize },

    #[error("No known cells to march from")]
    NoKnownCells,

    #[error("{unreached} cells of the evaluation region were not reached by the front")]
    Unreached { unreached: usize },
}

pub type LevelSetResult<T> = Result<T, LevelSetError>;

impl From<LevelSetError> for HfError {
    fn from(e: LevelSetError) -> Self {
        match e {
            LevelSetError::NonFiniteKnown { value, .. } => HfError::NonFinite {
                what: "level set known value",
                value,
            },
            LevelSetError::CellOutOfRange { cell, len } => HfError::IndexOob {
                what: "level set cell",
                index: cell,
                len,
            },
            LevelSetError::NoKnownCells => HfError::EmptySet {
                what: "level set known cells",
            },
            LevelSetError::Unreached { .. } => HfError::Invariant {
                what: "level set region not reached",
            },
        }
    }
}
