//! Error types for elasticity operators.

use hf_core::HfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElasticityError {
    #[error("Plain strain modulus must be positive and finite, got {value}")]
    InvalidModulus { value: f64 },

    #[error("Cell {cell} out of range for operator of size {len}")]
    CellOutOfRange { cell: usize, len: usize },

    #[error("Vector length {got} does not match {expected} columns")]
    SizeMismatch { expected: usize, got: usize },
}

pub type ElasticityResult<T> = Result<T, ElasticityError>;

impl From<ElasticityError> for HfError {
    fn from(e: ElasticityError) -> Self {
        match e {
            ElasticityError::InvalidModulus { value } => HfError::NonFinite {
                what: "plain strain modulus",
                value,
            },
            ElasticityError::CellOutOfRange { cell, len } => HfError::IndexOob {
                what: "elasticity cell",
                index: cell,
                len,
            },
            ElasticityError::SizeMismatch { .. } => HfError::InvalidArg {
                what: "elasticity vector length",
            },
        }
    }
}
