//! Carter leak-off volumes over one time step.
//!
//! With `C' = 2·C_L`, a face area `A` that has been wetted since `t_a` loses
//! `2C'·A·(√(t + Δt − t_a) − √(t − t_a))` over `[t, t + Δt]`.

use hf_front::{TipGeometry, power_integral};

use crate::error::{TipError, TipResult};

/// Leak-off of a cell wetted since `t_arrival`.
pub fn channel_leak_off(c_prime: f64, area: f64, t: f64, dt: f64, t_arrival: f64) -> f64 {
    let before = (t - t_arrival).max(0.0);
    let after = (t + dt - t_arrival).max(0.0);
    2.0 * c_prime * area * (after.sqrt() - before.sqrt())
}

/// Leak-off of a tip cell whose front moves at `v`, with local arrival time
/// `t + Δt − s/v` at distance `s` behind the front.
pub fn moving_tip_leak_off(c_prime: f64, tip: &TipGeometry, hx: f64, hy: f64, v: f64, dt: f64) -> f64 {
    if !(v > 0.0) {
        return 0.0;
    }
    let wetted = power_integral(tip.l, tip.alpha, hx, hy, 0.5);
    let earlier = power_integral(tip.l - v * dt, tip.alpha, hx, hy, 0.5);
    2.0 * c_prime * (wetted - earlier) / v.sqrt()
}

/// Leak-off of a stagnant tip cell using the arrival time of its zero
/// vertex over the filled area.
pub fn stagnant_tip_leak_off(
    c_prime: f64,
    filled_area: f64,
    t: f64,
    dt: f64,
    t_zero_vertex: f64,
) -> f64 {
    channel_leak_off(c_prime, filled_area, t, dt, t_zero_vertex)
}

pub fn check_leak_off(cell: usize, value: f64) -> TipResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TipError::LeakOffInvalid { cell, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_front::Corner;

    #[test]
    fn channel_leak_off_sums_over_steps() {
        let (c, a) = (1e-5, 2.0);
        let total: f64 = (0..10)
            .map(|k| channel_leak_off(c, a, k as f64, 1.0, 0.0))
            .sum();
        assert!((total - 2.0 * c * a * 10f64.sqrt()).abs() < 1e-15);
        assert_eq!(channel_leak_off(c, a, 0.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn moving_tip_matches_direct_integration() {
        let tip = TipGeometry {
            cell: 0,
            zero_vertex: Corner::BottomLeft,
            l: 0.6,
            alpha: 0.0,
        };
        let (c, v, dt) = (1e-4, 0.1, 2.0);
        let lk = moving_tip_leak_off(c, &tip, 1.0, 1.0, v, dt);
        // one-dimensional strip: ∫ 2C'(√(s/v) − √(s/v − Δt)₊) ds over [0, l]
        let n = 200_000;
        let ds = tip.l / n as f64;
        let direct: f64 = (0..n)
            .map(|k| {
                let s = (k as f64 + 0.5) * ds;
                2.0 * c * ((s / v).sqrt() - (s / v - dt).max(0.0).sqrt()) * ds
            })
            .sum();
        assert!((lk - direct).abs() < 1e-6 * direct);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(check_leak_off(1, f64::NAN).is_err());
        assert!(check_leak_off(1, -1.0).is_err());
        assert_eq!(check_leak_off(1, 0.5), Ok(0.5));
    }
}
