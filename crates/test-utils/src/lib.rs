//! Shared test utilities for the flash-flood plotting workspace.
//!
//! This crate provides:
//! - A synthetic GRIB2 writer ([`Grib2Builder`]) for masks and report grids
//! - A throwaway repository tree ([`ReportTree`]) laid out like the real data
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of two `f32` slices, treating NaN as equal to NaN.
#[macro_export]
macro_rules! assert_values_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f32] = &$left;
        let right: &[f32] = &$right;
        assert_eq!(left.len(), right.len(), "length mismatch");
        for (idx, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if l.is_nan() || r.is_nan() {
                assert!(
                    l.is_nan() && r.is_nan(),
                    "value {} differs in missingness: {} vs {}",
                    idx,
                    l,
                    r
                );
            } else if (l - r).abs() as f64 > $epsilon as f64 {
                panic!("assertion failed at index {}: {} vs {}", idx, l, r);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_values_approx_eq_matches_nan() {
        assert_values_approx_eq!(vec![1.0, f32::NAN], vec![1.0001, f32::NAN], 0.001);
    }

    #[test]
    #[should_panic(expected = "missingness")]
    fn test_assert_values_approx_eq_rejects_nan_mismatch() {
        assert_values_approx_eq!(vec![f32::NAN], vec![0.0], 0.001);
    }
}
