//! Guarded geometry and statistics helpers
//!
//! Every relative-delta computation in the pipeline divides by a baseline
//! value that may legitimately be zero (no face during calibration, partial
//! occlusion). The helpers here centralize the epsilon guards so a degenerate
//! denominator degrades to "no signal" instead of NaN/Infinity.

use crate::types::Point;

/// Denominator guard shared by all relative-delta computations.
pub const EPSILON: f64 = 1e-3;

/// Euclidean distance between two points in the image plane.
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Absolute vertical separation between two points.
#[inline]
pub fn vertical_gap(a: Point, b: Point) -> f64 {
    (a.y - b.y).abs()
}

/// Relative delta of `current` against `baseline`, guarded against near-zero
/// denominators: returns 0 when `|baseline| < epsilon`.
#[inline]
pub fn safe_relative_delta(current: f64, baseline: f64, epsilon: f64) -> f64 {
    if baseline.abs() < epsilon {
        return 0.0;
    }
    (current - baseline) / baseline
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-12);
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_safe_relative_delta_guards_near_zero() {
        // Zero and sub-epsilon baselines degrade to 0, not NaN/Inf
        assert_eq!(safe_relative_delta(0.5, 0.0, EPSILON), 0.0);
        assert_eq!(safe_relative_delta(0.5, 0.0005, EPSILON), 0.0);
        assert_eq!(safe_relative_delta(0.5, -0.0005, EPSILON), 0.0);

        let delta = safe_relative_delta(0.6, 0.5, EPSILON);
        assert!((delta - 0.2).abs() < 1e-12);
        assert!(delta.is_finite());
    }

    #[test]
    fn test_safe_relative_delta_signed_baseline() {
        // Negative baselines keep their sign semantics
        let delta = safe_relative_delta(-0.02, -0.01, EPSILON);
        assert!((delta - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);

        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
        // Constant sequence has zero spread
        assert_eq!(std_dev(&[2.0, 2.0, 2.0]), 0.0);
        // [2, 4] has population std 1
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < 1e-12);
    }
}
