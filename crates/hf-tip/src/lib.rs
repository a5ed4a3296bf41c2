//! hf-tip: near-tip asymptotics for the explicit front step.
//!
//! Provides:
//! - Opening asymptotes for the toughness, viscosity, leak-off/viscosity and
//!   universal regimes ([`TipAsymptote`])
//! - Tip-cell volume integrals over the partially filled cell
//! - Tip inversion on ribbon cells with the no-recession bound
//! - Stagnant tip cells driven by the ribbon stress intensity factor
//! - Carter leak-off volumes for channel, moving and stagnant tip cells

pub mod asymptote;
pub mod error;
pub mod inversion;
pub mod leakoff;
pub mod stagnant;
pub mod volume;

pub use asymptote::{BETA_M, BETA_MT, TipAsymptote, TipParams};
pub use error::{TipError, TipResult};
pub use inversion::{Inversion, RibbonSample, invert_distance};
pub use leakoff::{channel_leak_off, check_leak_off, moving_tip_leak_off, stagnant_tip_leak_off};
pub use stagnant::{ribbon_for_tip, stagnant_kprime, stagnant_tip_volume};
pub use volume::validate_tip_volumes;
