//! Tip asymptotics errors.

use hf_core::HfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TipError {
    #[error("Tip inversion failed at ribbon cell {cell}")]
    InversionFailed { cell: usize },

    #[error("No ribbon cell found for stagnant tip cell {cell}")]
    RibbonNotFound { cell: usize },

    #[error("Evaluated tip volume {value} of cell {cell} is not valid")]
    VolumeInvalid { cell: usize, value: f64 },

    #[error("Leak-off {value} of cell {cell} is not valid")]
    LeakOffInvalid { cell: usize, value: f64 },

    #[error("Invalid tip parameter: {what}")]
    InvalidParameter { what: &'static str },
}

pub type TipResult<T> = Result<T, TipError>;

impl From<TipError> for HfError {
    fn from(e: TipError) -> Self {
        match e {
            TipError::InversionFailed { .. } => HfError::Invariant {
                what: "tip inversion failed",
            },
            TipError::RibbonNotFound { .. } => HfError::EmptySet {
                what: "ribbon cell for stagnant tip",
            },
            TipError::VolumeInvalid { value, .. } => HfError::NonFinite {
                what: "tip volume",
                value,
            },
            TipError::LeakOffInvalid { value, .. } => HfError::NonFinite {
                what: "leak-off",
                value,
            },
            TipError::InvalidParameter { what } => HfError::InvalidArg { what },
        }
    }
}
