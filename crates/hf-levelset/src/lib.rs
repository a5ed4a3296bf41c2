//! Level-set utilities for the fracture footprint.
//!
//! Provides:
//! - A fast-marching Eikonal solver with known-value seeding and region
//!   restriction
//! - Two-pass signed distance construction (outward, and negated inward)
//! - Narrow band ("front region") selection and hole plugging
//!
//! Sign convention: negative inside the fracture, positive outside.

pub mod error;
pub mod fast_marching;
pub mod region;

pub use error::{LevelSetError, LevelSetResult};
pub use fast_marching::{FastMarching, MarchReport, UNSOLVED, two_pass_signed_distance};
pub use region::{front_region, plug_holes};
