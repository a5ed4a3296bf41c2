use crate::HfError;

/// Floating point type used throughout the fracture crates
pub type Real = f64;

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HfError::NonFinite { what, value: v })
    }
}

/// Fails on the first non-finite entry of `values`.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), HfError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(HfError::NonFinite { what, value }),
        None => Ok(()),
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, HfError> {
    if v > 0.0 && v.is_finite() {
        Ok(v)
    } else {
        Err(HfError::InvalidArg { what })
    }
}

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[Real]) -> Real {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<Real>() / values.len() as Real
    }
}

/// Euclidean norm of a slice.
pub fn norm2(values: &[Real]) -> Real {
    values.iter().map(|v| v * v).sum::<Real>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("not finite"));
    }

    #[test]
    fn ensure_all_finite_reports_offender() {
        assert!(ensure_all_finite(&[1.0, 2.0], "w").is_ok());
        let err = ensure_all_finite(&[1.0, Real::INFINITY, Real::NAN], "w").unwrap_err();
        assert_eq!(
            err,
            HfError::NonFinite {
                what: "w",
                value: Real::INFINITY
            }
        );
    }

    #[test]
    fn mean_and_norm() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 3.0]), 2.0);
        assert_eq!(norm2(&[3.0, 4.0]), 5.0);
        assert!(ensure_positive(0.0, "h").is_err());
    }
}
