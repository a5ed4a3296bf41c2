//! Near-tip opening asymptotes.
//!
//! Widths are functions of the distance `s` behind the front and the front
//! velocity `v`. Moduli follow the usual scaled notation: `E'` plane-strain
//! modulus, `K'` scaled toughness, `μ'` scaled viscosity, `C'` scaled
//! Carter leak-off coefficient.

use hf_front::{TipGeometry, integrate_filled, power_integral};
use serde::{Deserialize, Serialize};

/// Viscosity-dominated prefactor `2^(1/3)·3^(5/6)`.
pub const BETA_M: f64 = 3.147_345_190_264_944_3;

/// Leak-off/viscosity prefactor `4 / (15^(1/4)·(√2 − 1)^(1/4))`.
pub const BETA_MT: f64 = 2.533_559_440_826_57;

/// Below this `K'` the universal asymptote falls back to the viscosity one.
const KPRIME_FLOOR: f64 = 1e-30;

/// Propagation regime of the tip asymptote, fixed for the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipAsymptote {
    /// `w = K'/E'·s^(1/2)`
    Toughness,
    /// `w = β_m·(μ'v/E')^(1/3)·s^(2/3)`
    Viscosity,
    /// `w = β_m̃·(2C'μ'v^(1/2)/E')^(1/4)·s^(5/8)`
    LeakOffViscosity,
    /// `w = K'/E'·s^(1/2)·(1 + β_m³E'²μ'v·s^(1/2)/K'³)^(1/3)`
    #[default]
    Universal,
}

/// Material and fluid parameters seen by one tip cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipParams {
    pub e_prime: f64,
    pub k_prime: f64,
    pub mu_prime: f64,
    pub c_prime: f64,
}

impl TipAsymptote {
    /// Opening at distance `s` behind a front moving at `v`.
    pub fn width(self, p: &TipParams, s: f64, v: f64) -> f64 {
        if !(s > 0.0) {
            return 0.0;
        }
        let v = v.max(0.0);
        match self {
            TipAsymptote::Toughness => p.k_prime / p.e_prime * s.sqrt(),
            TipAsymptote::Viscosity => viscosity_factor(p, v) * s.powf(2.0 / 3.0),
            TipAsymptote::LeakOffViscosity => leak_off_factor(p, v) * s.powf(5.0 / 8.0),
            TipAsymptote::Universal => {
                if p.k_prime.abs() < KPRIME_FLOOR {
                    return viscosity_factor(p, v) * s.powf(2.0 / 3.0);
                }
                let kk = p.k_prime / p.e_prime;
                let ratio =
                    BETA_M.powi(3) * p.e_prime.powi(2) * p.mu_prime * v * s.sqrt() / p.k_prime.powi(3);
                kk * s.sqrt() * (1.0 + ratio).cbrt()
            }
        }
    }

    /// Volume of fluid in the filled part of a tip cell, `∫∫ w dA`.
    pub fn cell_volume(self, p: &TipParams, tip: &TipGeometry, hx: f64, hy: f64, v: f64) -> f64 {
        let v = v.max(0.0);
        let (l, alpha) = (tip.l, tip.alpha);
        match self {
            TipAsymptote::Toughness => {
                p.k_prime / p.e_prime * power_integral(l, alpha, hx, hy, 0.5)
            }
            TipAsymptote::Viscosity => {
                viscosity_factor(p, v) * power_integral(l, alpha, hx, hy, 2.0 / 3.0)
            }
            TipAsymptote::LeakOffViscosity => {
                leak_off_factor(p, v) * power_integral(l, alpha, hx, hy, 5.0 / 8.0)
            }
            TipAsymptote::Universal => {
                if v == 0.0 {
                    return p.k_prime / p.e_prime * power_integral(l, alpha, hx, hy, 0.5);
                }
                integrate_filled(l, alpha, hx, hy, |s| self.width(p, s, v))
            }
        }
    }
}

fn viscosity_factor(p: &TipParams, v: f64) -> f64 {
    BETA_M * (p.mu_prime * v / p.e_prime).cbrt()
}

fn leak_off_factor(p: &TipParams, v: f64) -> f64 {
    BETA_MT * (2.0 * p.c_prime * p.mu_prime * v.sqrt() / p.e_prime).powf(0.25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_front::Corner;

    fn params() -> TipParams {
        TipParams {
            e_prime: 1e10,
            k_prime: 1e6,
            mu_prime: 1e-2,
            c_prime: 1e-6,
        }
    }

    #[test]
    fn universal_reduces_to_limits() {
        let p = params();
        let s = 0.3;
        let k = TipAsymptote::Toughness.width(&p, s, 0.0);
        assert!((TipAsymptote::Universal.width(&p, s, 0.0) - k).abs() < 1e-15);

        let zero_k = TipParams { k_prime: 0.0, ..p };
        let m = TipAsymptote::Viscosity.width(&zero_k, s, 1e-3);
        let u = TipAsymptote::Universal.width(&zero_k, s, 1e-3);
        assert!((m - u).abs() <= 1e-12 * m);
    }

    #[test]
    fn universal_approaches_viscosity_at_high_speed() {
        let p = TipParams {
            k_prime: 1e3,
            ..params()
        };
        let (s, v) = (1.0, 1e3);
        let m = TipAsymptote::Viscosity.width(&p, s, v);
        let u = TipAsymptote::Universal.width(&p, s, v);
        assert!(u >= m);
        assert!((u - m) / m < 1e-3);
    }

    #[test]
    fn full_cell_volume_of_toughness_tip() {
        let p = params();
        let tip = TipGeometry {
            cell: 0,
            zero_vertex: Corner::BottomLeft,
            l: 0.5,
            alpha: 0.0,
        };
        let vol = TipAsymptote::Toughness.cell_volume(&p, &tip, 1.0, 2.0, 0.0);
        let exact = p.k_prime / p.e_prime * 2.0 * (2.0 / 3.0) * 0.5f64.powf(1.5);
        assert!((vol - exact).abs() < 1e-12 * exact);
    }

    #[test]
    fn universal_volume_is_between_limits() {
        let p = params();
        let tip = TipGeometry {
            cell: 0,
            zero_vertex: Corner::BottomLeft,
            l: 0.7,
            alpha: 0.4,
        };
        let v = 1e-2;
        let k = TipAsymptote::Toughness.cell_volume(&p, &tip, 1.0, 1.0, v);
        let m = TipAsymptote::Viscosity.cell_volume(&p, &tip, 1.0, 1.0, v);
        let u = TipAsymptote::Universal.cell_volume(&p, &tip, 1.0, 1.0, v);
        assert!(u >= k.max(m) * (1.0 - 1e-9));
        assert!(u <= k + m);
    }
}
