//! Rectangular displacement-discontinuity kernel.

use std::f64::consts::PI;

/// Normal traction at a cell center induced by a unit opening of a
/// rectangular element of half-sizes `a, b`, offset by `(x, y)`.
///
/// ```text
/// C = E'/(8π) Σ_{±,±} √((a∓x)² + (b∓y)²) / ((a∓x)(b∓y))
/// ```
///
/// Offsets are differences of cell centers, so `a ± x` and `b ± y` never
/// vanish on a regular mesh.
pub fn rectangular_dd_influence(x: f64, y: f64, a: f64, b: f64, e_prime: f64) -> f64 {
    let term = |u: f64, v: f64| u.hypot(v) / (u * v);
    e_prime / (8.0 * PI)
        * (term(a - x, b - y) + term(a + x, b - y) + term(a - x, b + y) + term(a + x, b + y))
}
