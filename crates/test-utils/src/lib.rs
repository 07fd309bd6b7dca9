//! Shared test utilities for the drought index portal workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate equality macros for float results
//! - Synthetic drought index stack generators
//! - Common grid and region fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, create_drying_stack, fixtures};
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

/// Macro for approximate equality of coordinate pairs.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_coords_approx_eq;
///
/// assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

/// Approximate equality that treats two NaNs as equal.
///
/// Engine results use NaN for "no valid data", so comparing series needs a
/// NaN-aware check.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_nan_eq;
///
/// assert_nan_eq!(f64::NAN, f64::NAN, 1e-9); // passes
/// assert_nan_eq!(f64::NAN, 0.0, 1e-9);      // fails
/// ```
#[macro_export]
macro_rules! assert_nan_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        match (left.is_nan(), right.is_nan()) {
            (true, true) => {}
            (false, false) => $crate::assert_approx_eq!(left, right, $epsilon),
            _ => panic!(
                "assertion failed: NaN mismatch\n  left: `{:?}`,\n right: `{:?}`",
                left, right
            ),
        }
    }};
}
