//! Drought Severity Coverage Index.
//!
//! `DSCI(t) = Σ fraction_i(t) * (i + 1)` over D0..D4, with no normalization.
//! Exclusive fractions give values in 0–500; inclusive fractions are
//! cumulative and can exceed that range.

use crate::types::{CategoryFractionSeries, DsciSeries};

/// Weighted sum of one row of category fractions. NaN propagates.
#[inline]
pub fn dsci_value(fractions: &[f64]) -> f64 {
    fractions
        .iter()
        .enumerate()
        .map(|(i, f)| f * (i + 1) as f64)
        .sum()
}

/// DSCI for every time step of a fraction series.
pub fn aggregate(fractions: &CategoryFractionSeries) -> DsciSeries {
    DsciSeries {
        values: fractions.rows.iter().map(|row| dsci_value(row)).collect(),
        inclusive: fractions.inclusive,
    }
}
