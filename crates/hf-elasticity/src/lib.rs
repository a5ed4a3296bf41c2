//! Elasticity operator for a planar crack on a Cartesian mesh.
//!
//! Provides:
//! - The rectangular displacement-discontinuity influence kernel
//! - [`ElasticityOperator`]: sub-matrix gather and matrix-vector product on
//!   arbitrary cell index sets
//! - A dense backend (full matrix, parallel assembly) and a block-Toeplitz
//!   backend that stores one coefficient per cell offset

pub mod dense;
pub mod error;
pub mod kernel;
pub mod operator;
pub mod toeplitz;

pub use dense::DenseElasticity;
pub use error::{ElasticityError, ElasticityResult};
pub use kernel::rectangular_dd_influence;
pub use operator::{ElasticityKind, ElasticityOperator, build_operator};
pub use toeplitz::ToeplitzElasticity;
