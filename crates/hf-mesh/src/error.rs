//! Mesh-specific error types.

use hf_core::HfError;

pub type MeshResult<T> = Result<T, MeshError>;

/// Mesh construction and query errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Fewer than three cells along an axis.
    TooFewCells { axis: char, count: usize },

    /// Domain limits are not finite or not increasing.
    InvalidLimits { axis: char, min: f64, max: f64 },

    /// Cell index beyond the number of cells.
    CellOutOfRange { cell: usize, len: usize },

    /// Point outside the meshed domain.
    PointOutside { x: f64, y: f64 },

    /// Extension requested with a factor that does not grow the domain.
    InvalidExtension { factor: f64 },

    /// Domain not centered on the origin.
    NotSymmetric { x_limits: [f64; 2], y_limits: [f64; 2] },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::TooFewCells { axis, count } => {
                write!(f, "Mesh needs at least 3 cells along {}, got {}", axis, count)
            }
            MeshError::InvalidLimits { axis, min, max } => {
                write!(f, "Invalid {} limits [{}, {}]", axis, min, max)
            }
            MeshError::CellOutOfRange { cell, len } => {
                write!(f, "Cell {} out of range (mesh has {} cells)", cell, len)
            }
            MeshError::PointOutside { x, y } => {
                write!(f, "Point ({}, {}) lies outside the mesh", x, y)
            }
            MeshError::InvalidExtension { factor } => {
                write!(f, "Mesh extension factor must exceed 1, got {}", factor)
            }
            MeshError::NotSymmetric { x_limits, y_limits } => write!(
                f,
                "Mesh limits {:?} x {:?} are not centered on the origin",
                x_limits, y_limits
            ),
        }
    }
}

impl std::error::Error for MeshError {}

impl From<MeshError> for HfError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::CellOutOfRange { cell, len } => HfError::IndexOob {
                what: "mesh cell",
                index: cell,
                len,
            },
            _ => HfError::InvalidArg { what: "mesh" },
        }
    }
}
