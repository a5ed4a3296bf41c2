//! hf-front: fracture front reconstruction and cell classification.
//!
//! Provides:
//! - Straight-front cell geometry (zero vertex, distance, angle) with closed
//!   form and quadrature integrals over the filled part of a cell
//! - Three reconstruction methods selected once per simulation
//!   ([`ReconstructionMethod`])
//! - Multi-front tracing for coalescing fractures
//! - The channel / tip / ribbon / crack classifier

mod continuous;
pub mod classify;
pub mod error;
pub mod geometry;
pub mod reconstruct;

pub use classify::{CellSets, Classification, FILL_ROUNDING, checked_fill, classify};
pub use error::{FrontError, FrontResult};
pub use geometry::{Corner, TipGeometry, filled_area, integrate_filled, power_integral};
pub use reconstruct::{
    FrontLine, Reconstruction, ReconstructionMethod, reconstruct_front, vertex_field,
};
