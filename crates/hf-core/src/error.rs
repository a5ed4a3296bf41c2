//! Error type shared by every crate of the workspace.
//!
//! Each crate reports its own error enum and converts it into [`HfError`]
//! at the API boundary, so a driver only matches on one type.

use thiserror::Error;

pub type HfResult<T> = Result<T, HfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HfError {
    /// A NaN or an infinity reached a computation that needs a real number.
    #[error("{what} is not finite ({value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Bad argument: {what}")]
    InvalidArg { what: &'static str },

    /// A cell number outside the mesh.
    #[error("{what}: cell {index} is outside a mesh of {len} cells")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An operation that needs at least one cell got none.
    #[error("No cells in {what}")]
    EmptySet { what: &'static str },

    /// The state broke a rule the algorithm relies on.
    #[error("Broken invariant: {what}")]
    Invariant { what: &'static str },
}
