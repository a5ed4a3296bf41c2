//! Tip inversion: distance from a ribbon cell center to the front.
//!
//! Given the opening of a ribbon cell, find the distance `s` for which the
//! asymptote reproduces that opening when the front has moved from its
//! previous distance `s0` to `s` within the time step. The front may not
//! recede, so `s ≥ s0`.

use tracing::trace;

use crate::asymptote::{TipAsymptote, TipParams};
use crate::error::{TipError, TipResult};

const MAX_EXPANSIONS: usize = 80;
const MAX_BISECTIONS: usize = 200;

/// Ribbon cell opening and its distance to the previous front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonSample {
    pub cell: usize,
    pub width: f64,
    /// Distance to the front at the start of the step (`-φ` of the cell)
    pub prev_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inversion {
    pub distance: f64,
    pub velocity: f64,
}

/// Invert the asymptote for one ribbon cell by bracketing bisection.
///
/// `scale` sets the first bracket width (typically the cell diagonal).
pub fn invert_distance(
    asymptote: TipAsymptote,
    params: &TipParams,
    sample: &RibbonSample,
    dt: f64,
    scale: f64,
) -> TipResult<Inversion> {
    let fail = TipError::InversionFailed { cell: sample.cell };
    if !(dt > 0.0) || !(scale > 0.0) || !sample.width.is_finite() || !sample.prev_distance.is_finite() {
        return Err(fail);
    }
    let s0 = sample.prev_distance.max(0.0);
    let stagnant = Inversion {
        distance: s0,
        velocity: 0.0,
    };
    if sample.width <= 0.0 {
        return Ok(stagnant);
    }

    let residual = |s: f64| asymptote.width(params, s, (s - s0) / dt) - sample.width;
    let r0 = residual(s0);
    if r0.is_nan() {
        return Err(fail);
    }
    if r0 >= 0.0 {
        return Ok(stagnant);
    }

    let mut lo = s0;
    let mut hi = s0 + scale;
    let mut bracketed = false;
    for _ in 0..MAX_EXPANSIONS {
        let r = residual(hi);
        if r.is_nan() {
            return Err(fail);
        }
        if r >= 0.0 {
            bracketed = true;
            break;
        }
        lo = hi;
        hi = s0 + 2.0 * (hi - s0);
    }
    if !bracketed {
        return Err(fail);
    }

    for _ in 0..MAX_BISECTIONS {
        if hi - lo <= 1e-12 * hi {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let r = residual(mid);
        if r.is_nan() {
            return Err(fail);
        }
        if r >= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let distance = 0.5 * (lo + hi);
    trace!(cell = sample.cell, distance, "tip inverted");
    Ok(Inversion {
        distance,
        velocity: (distance - s0) / dt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TipParams {
        TipParams {
            e_prime: 1e10,
            k_prime: 1e6,
            mu_prime: 1e-3,
            c_prime: 0.0,
        }
    }

    #[test]
    fn toughness_inversion_is_exact() {
        let p = params();
        let s = 2.5;
        let sample = RibbonSample {
            cell: 3,
            width: TipAsymptote::Toughness.width(&p, s, 0.0),
            prev_distance: 1.0,
        };
        let inv = invert_distance(TipAsymptote::Toughness, &p, &sample, 10.0, 0.5).unwrap();
        assert!((inv.distance - s).abs() < 1e-9);
        assert!((inv.velocity - 0.15).abs() < 1e-9);
    }

    #[test]
    fn universal_inversion_reproduces_width() {
        let p = params();
        let sample = RibbonSample {
            cell: 0,
            width: 3e-4,
            prev_distance: 0.8,
        };
        let dt = 2.0;
        let inv = invert_distance(TipAsymptote::Universal, &p, &sample, dt, 0.5).unwrap();
        assert!(inv.distance > 0.8);
        let w = TipAsymptote::Universal.width(&p, inv.distance, inv.velocity);
        assert!((w - sample.width).abs() < 1e-9 * sample.width);
    }

    #[test]
    fn front_does_not_recede() {
        let p = params();
        let sample = RibbonSample {
            cell: 0,
            width: TipAsymptote::Toughness.width(&p, 0.5, 0.0),
            prev_distance: 1.0,
        };
        let inv = invert_distance(TipAsymptote::Universal, &p, &sample, 1.0, 0.5).unwrap();
        assert_eq!(inv.distance, 1.0);
        assert_eq!(inv.velocity, 0.0);
    }

    #[test]
    fn nan_toughness_fails() {
        let p = TipParams {
            k_prime: f64::NAN,
            ..params()
        };
        let sample = RibbonSample {
            cell: 9,
            width: 1e-4,
            prev_distance: 0.3,
        };
        assert_eq!(
            invert_distance(TipAsymptote::Toughness, &p, &sample, 1.0, 0.5),
            Err(TipError::InversionFailed { cell: 9 })
        );
    }
}
