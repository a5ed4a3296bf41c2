//! Time-step bisection onto a geometric target.
//!
//! When a step carries a measured quantity across its threshold by more
//! than the tolerance, the step is retried with a bisected time step until
//! the quantity lands within `[threshold, threshold·(1 + tolerance)]`.

use serde::{Deserialize, Serialize};

use crate::fracture::Fracture;

/// Quantity a run should hit exactly rather than step over.
pub trait BridgingTarget: Send + Sync + std::fmt::Debug {
    fn measure(&self, fracture: &Fracture) -> Option<f64>;
    fn threshold(&self) -> f64;
    /// Relative overshoot accepted above the threshold.
    fn tolerance(&self) -> f64 {
        1e-2
    }
}

/// Aspect ratio (x extent over y extent) of the front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatioTarget {
    pub threshold: f64,
    pub tolerance: f64,
}

impl BridgingTarget for AspectRatioTarget {
    fn measure(&self, fracture: &Fracture) -> Option<f64> {
        fracture.aspect_ratio()
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

/// Bisection bracket on the time step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BridgingState {
    #[default]
    Idle,
    /// `lower` fell short of the threshold, `upper` overshot it
    Bracketing { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeDecision {
    Accept(BridgingState),
    Retry { state: BridgingState, dt: f64 },
}

/// Bracket narrower than this fraction of its upper end is accepted as is.
const MIN_BRACKET: f64 = 1e-3;

/// Decide whether an attempt of length `dt` that moved the measured value
/// from `before` to `after` is accepted.
pub fn bridge(
    state: BridgingState,
    threshold: f64,
    tolerance: f64,
    before: f64,
    after: f64,
    dt: f64,
) -> BridgeDecision {
    let ceiling = threshold * (1.0 + tolerance);
    let overshoot = before < threshold && after > ceiling;
    let landed = after >= threshold && after <= ceiling;
    match state {
        BridgingState::Idle if overshoot => BridgeDecision::Retry {
            state: BridgingState::Bracketing {
                lower: 0.0,
                upper: dt,
            },
            dt: 0.5 * dt,
        },
        BridgingState::Idle => BridgeDecision::Accept(BridgingState::Idle),
        BridgingState::Bracketing { lower, .. } if overshoot => BridgeDecision::Retry {
            state: BridgingState::Bracketing { lower, upper: dt },
            dt: 0.5 * (lower + dt),
        },
        BridgingState::Bracketing { .. } if landed => BridgeDecision::Accept(BridgingState::Idle),
        BridgingState::Bracketing { upper, .. } => {
            if upper - dt <= MIN_BRACKET * upper {
                BridgeDecision::Accept(BridgingState::Idle)
            } else {
                BridgeDecision::Retry {
                    state: BridgingState::Bracketing { lower: dt, upper },
                    dt: 0.5 * (dt + upper),
                }
            }
        }
    }
}
