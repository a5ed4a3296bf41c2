//! hf-core: shared foundation for the hydraulic fracture crates.
//!
//! Contains:
//! - units (dimensioned material and injection inputs)
//! - numeric (Real + tolerances + float helpers)
//! - cellset (sorted cell index sets and masks)
//! - timing (opt-in stage timers for the step algorithm)
//! - error (shared error types)

pub mod cellset;
pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

pub use cellset::*;
pub use error::{HfError, HfResult};
pub use numeric::*;
pub use units::*;
