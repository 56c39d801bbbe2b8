//! Float helpers shared by the viewport, the store and the label formatter.

use crate::CoreError;

/// Coordinates, positions and bounds.
pub type Real = f64;

/// Absolute/relative tolerance pair for float comparisons.
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
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Reject NaN and infinities coming out of the engine.
pub fn ensure_finite(value: Real, what: &'static str) -> Result<Real, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFinite { what, value })
    }
}

/// Clamp `x` into `[lo, hi]`; an inverted interval collapses to `lo`.
/// Negative zero comes back as `+0.0`.
pub fn clamp_to(x: Real, lo: Real, hi: Real) -> Real {
    if hi < lo {
        return lo + 0.0;
    }
    x.max(lo).min(hi) + 0.0
}

/// Format `value` with a fixed number of decimals and a `.` separator.
pub fn format_fixed(value: Real, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Width needed so that every value in `[min, max]` formats without shifting.
pub fn label_padding(min: Real, max: Real, decimals: usize) -> usize {
    format_fixed(min, decimals)
        .len()
        .max(format_fixed(max, decimals).len())
}

/// Left-pad a formatted value to `width` columns.
pub fn pad_label(value: Real, decimals: usize, width: usize) -> String {
    format!("{:>width$}", format_fixed(value, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerances_mix_absolute_and_relative() {
        let tol = Tolerances::default();
        assert!(nearly_equal(1e6, 1e6 + 1e-4, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(0.5, 0.5 + 1e-6, tol));
    }

    #[test]
    fn non_finite_values_are_named() {
        let err = ensure_finite(Real::INFINITY, "max_y").unwrap_err();
        assert_eq!(
            err,
            CoreError::NonFinite {
                what: "max_y",
                value: Real::INFINITY
            }
        );
        assert_eq!(ensure_finite(2.0, "x"), Ok(2.0));
    }

    #[test]
    fn clamp_handles_inverted_bounds() {
        assert_eq!(clamp_to(5.0, 0.0, 3.0), 3.0);
        assert_eq!(clamp_to(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(clamp_to(2.0, 4.0, 1.0), 4.0);
    }

    #[test]
    fn clamp_drops_negative_zero() {
        assert!(clamp_to(-0.0, 0.0, 3.0).is_sign_positive());
        assert!(clamp_to(-0.0, -0.0, -0.0).is_sign_positive());
        assert_eq!(format_fixed(clamp_to(-0.0, -1.0, 1.0), 2), "0.00");
    }

    #[test]
    fn padding_covers_negative_bounds() {
        assert_eq!(label_padding(0.0, 9.0, 2), 4);
        assert_eq!(label_padding(-2.5, 9.0, 2), 5);
        assert_eq!(label_padding(0.0, 12.0, 2), 5);
        assert_eq!(pad_label(3.14159, 2, 6), "  3.14");
    }
}
