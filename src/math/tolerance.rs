//! Fixed-epsilon scalar comparisons.
//!
//! Every tolerance check in the solver goes through these; geometric
//! equality is never exact over `f64`.

/// Comparison epsilon.
pub const TOLERANCE: f64 = 1e-6;

/// `x` is zero within tolerance.
pub fn tol_zero(x: f64) -> bool {
    x.abs() < TOLERANCE
}

/// `a` and `b` are equal within tolerance.
pub fn tol_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

/// `a` is greater than `b` by more than the tolerance.
pub fn tol_gt(a: f64, b: f64) -> bool {
    a > b + TOLERANCE
}

/// `a` is less than `b` by more than the tolerance.
pub fn tol_lt(a: f64, b: f64) -> bool {
    a < b - TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_zero() {
        assert!(tol_zero(0.0));
        assert!(tol_zero(TOLERANCE / 2.0));
        assert!(tol_zero(-TOLERANCE / 2.0));
        assert!(!tol_zero(TOLERANCE * 2.0));
    }

    #[test]
    fn strict_comparisons() {
        assert!(tol_gt(1.0, 0.5));
        assert!(!tol_gt(1.0, 1.0));
        assert!(!tol_gt(1.0 + TOLERANCE / 2.0, 1.0));
        assert!(tol_lt(0.5, 1.0));
        assert!(!tol_lt(1.0, 1.0));
        assert!(tol_eq(1.0, 1.0 + TOLERANCE / 2.0));
    }
}
