//! Drought category area fractions.
//!
//! For each time step, every valid cell of a (masked) stack is tested
//! against the five category bins of its index family and the counts are
//! turned into percentages of the valid area:
//!
//! ```text
//! fraction_i(t) = 100 * count_i(t) / valid(t)
//! ```
//!
//! A time step with no valid cells yields NaN for every category.

use drip_common::DripResult;
use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

use crate::thresholds::{CategoryThresholdTable, CategoryThresholds, IndexFamily};
use crate::types::{ArrayStack, CategoryFractionSeries, NUM_CATEGORIES};

/// Classifies stacks into D0..D4 area fractions.
#[derive(Debug, Clone, Default)]
pub struct DroughtClassifier {
    table: CategoryThresholdTable,
    parallel: bool,
}

impl DroughtClassifier {
    /// Classifier with the canonical threshold table.
    pub fn new(parallel: bool) -> Self {
        Self {
            table: CategoryThresholdTable::default(),
            parallel,
        }
    }

    /// Classifier with a custom threshold table.
    pub fn with_table(table: CategoryThresholdTable, parallel: bool) -> Self {
        Self { table, parallel }
    }

    pub fn table(&self) -> &CategoryThresholdTable {
        &self.table
    }

    /// Classify raw index values.
    ///
    /// `index` selects the threshold family by substring ("spi3" → "sp").
    /// An unknown family is an error; no fallback table is used.
    pub fn classify(
        &self,
        stack: &ArrayStack,
        index: &str,
        inclusive: bool,
    ) -> DripResult<(IndexFamily, CategoryFractionSeries)> {
        let (family, thresholds) = self.table.lookup(index)?;
        let sign = if family.is_reversed() { -1.0 } else { 1.0 };

        tracing::debug!(
            index = %index,
            family = %family,
            inclusive,
            steps = stack.len(),
            "Classifying index values"
        );

        let fractions = self.count(stack, thresholds, inclusive, |v| sign * v);
        Ok((family, fractions))
    }

    /// Classify a stack already converted to percentiles (0–100) using the
    /// percentile table. The index still has to name a known family, which
    /// decides whether percentiles are reflected (EDDI: high = dry).
    pub fn classify_percentiles(
        &self,
        stack: &ArrayStack,
        index: &str,
        inclusive: bool,
    ) -> DripResult<(IndexFamily, CategoryFractionSeries)> {
        let family = IndexFamily::from_index(index)?;
        let reversed = family.is_reversed();

        tracing::debug!(
            index = %index,
            family = %family,
            inclusive,
            steps = stack.len(),
            "Classifying percentiles"
        );

        let fractions = self.count(stack, self.table.percentile(), inclusive, |p| {
            if reversed {
                100.0 - p
            } else {
                p
            }
        });
        Ok((family, fractions))
    }

    fn count(
        &self,
        stack: &ArrayStack,
        thresholds: &CategoryThresholds,
        inclusive: bool,
        transform: impl Fn(f64) -> f64 + Sync,
    ) -> CategoryFractionSeries {
        if !stack.is_empty() && stack.valid_count() == 0 {
            tracing::warn!(steps = stack.len(), "Classifying a stack with no valid cells");
        }

        let step =
            |layer: ArrayView2<'_, f64>| layer_fractions(layer, thresholds, inclusive, &transform);

        let rows = if self.parallel {
            stack
                .data()
                .axis_iter(Axis(0))
                .into_par_iter()
                .map(step)
                .collect()
        } else {
            stack.data().axis_iter(Axis(0)).map(step).collect()
        };

        CategoryFractionSeries { rows, inclusive }
    }
}

/// Category percentages for one layer.
fn layer_fractions(
    layer: ArrayView2<'_, f64>,
    thresholds: &CategoryThresholds,
    inclusive: bool,
    transform: &impl Fn(f64) -> f64,
) -> [f64; NUM_CATEGORIES] {
    let mut counts = [0usize; NUM_CATEGORIES];
    let mut valid = 0usize;

    for &raw in layer.iter() {
        if raw.is_nan() {
            continue;
        }
        valid += 1;
        let value = transform(raw);
        for (count, member) in counts.iter_mut().zip(thresholds.classify(value, inclusive)) {
            if member {
                *count += 1;
            }
        }
    }

    if valid == 0 {
        return [f64::NAN; NUM_CATEGORIES];
    }
    counts.map(|count| 100.0 * count as f64 / valid as f64)
}
