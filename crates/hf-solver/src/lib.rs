//! Elastohydrodynamic width/pressure solver for the crack cells.
//!
//! Provides:
//! - A relaxed fixed-point driver with per-block relative convergence
//! - Volume-control, mechanical-loading and viscous lubrication assemblies
//!   over gathered elasticity blocks ([`EhlSolverKind`])
//!
//! All systems are small and dense; they are rebuilt every step because the
//! channel and tip sets change.

pub mod ehl;
pub mod error;
pub mod fixed_point;
mod mechanical;
mod viscous;
mod volume_control;

pub use ehl::{EhlInput, EhlSolution, EhlSolverKind, solve_ehl};
pub use error::{SolverError, SolverResult};
pub use fixed_point::{FixedPointConfig, FixedPointResult, fixed_point_solve};
