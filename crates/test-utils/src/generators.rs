//! Test data generators for synthetic drought index stacks.
//!
//! Every generator returns the raw `(data, times)` pair used to build an
//! `ArrayStack`: a `[time, row, col]` array and one date per layer.

use chrono::{Datelike, NaiveDate};
use ndarray::Array3;

/// First-of-month dates for `n` consecutive months.
///
/// # Example
///
/// ```
/// use test_utils::monthly_dates;
///
/// let dates = monthly_dates(2011, 11, 3);
/// assert_eq!(dates[2].to_string(), "2012-01-01");
/// ```
pub fn monthly_dates(start_year: i32, start_month: u32, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut year = start_year;
    let mut month = start_month;

    for _ in 0..n {
        dates.push(NaiveDate::from_ymd_opt(year, month, 1).expect("valid month"));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    dates
}

/// Creates a stack with predictable values.
///
/// Each value is calculated as: `t * 10000 + row * 100 + col`
///
/// This makes it easy to verify slicing and masking by checking that
/// `data[[t, row, col]] == t * 10000 + row * 100 + col`.
pub fn create_test_stack(
    steps: usize,
    rows: usize,
    cols: usize,
) -> (Array3<f64>, Vec<NaiveDate>) {
    let data = Array3::from_shape_fn((steps, rows, cols), |(t, row, col)| {
        (t * 10_000 + row * 100 + col) as f64
    });
    (data, monthly_dates(2000, 1, steps))
}

/// Creates a stack holding a single value everywhere.
pub fn create_uniform_stack(
    steps: usize,
    rows: usize,
    cols: usize,
    value: f64,
) -> (Array3<f64>, Vec<NaiveDate>) {
    (
        Array3::from_elem((steps, rows, cols), value),
        monthly_dates(2000, 1, steps),
    )
}

/// Creates a stack that dries out over time.
///
/// Every cell starts at `1.0` and drops by `0.5` per month, with a small
/// west-to-east offset so cells are not identical. In the westernmost
/// column standardized indices reach D0 at month 3 and D4 at month 7.
pub fn create_drying_stack(
    steps: usize,
    rows: usize,
    cols: usize,
) -> (Array3<f64>, Vec<NaiveDate>) {
    let data = Array3::from_shape_fn((steps, rows, cols), |(t, _, col)| {
        1.0 - 0.5 * t as f64 - 0.01 * col as f64
    });
    (data, monthly_dates(2000, 1, steps))
}

/// Creates one layer in which the first `dry_cells` cells (row-major) hold
/// `dry_value` and the rest hold `wet_value`.
pub fn create_split_stack(
    rows: usize,
    cols: usize,
    dry_cells: usize,
    dry_value: f64,
    wet_value: f64,
) -> (Array3<f64>, Vec<NaiveDate>) {
    let data = Array3::from_shape_fn((1, rows, cols), |(_, row, col)| {
        if row * cols + col < dry_cells {
            dry_value
        } else {
            wet_value
        }
    });
    (data, monthly_dates(2012, 7, 1))
}

/// Marks cells as no-data (NaN) at every time step.
pub fn mask_cells(data: &mut Array3<f64>, cells: &[(usize, usize)]) {
    for &(row, col) in cells {
        for t in 0..data.dim().0 {
            if let Some(v) = data.get_mut((t, row, col)) {
                *v = f64::NAN;
            }
        }
    }
}

/// Month number of every date, handy for checking month filters.
pub fn months_of(dates: &[NaiveDate]) -> Vec<u32> {
    dates.iter().map(|d| d.month()).collect()
}
