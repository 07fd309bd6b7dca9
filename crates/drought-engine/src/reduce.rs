//! Area time series reduction.
//!
//! Collapses each masked layer of a stack to a single value, ignoring NaN.
//! A time step with no valid cells reduces to NaN.

use drip_common::DripResult;
use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

use crate::types::{ArrayStack, Mask, Statistic, StatisticSeries};

/// Reduce `stack` restricted to `mask` with `statistic`, one value per step.
pub fn reduce(stack: &ArrayStack, mask: &Mask, statistic: Statistic) -> DripResult<Vec<f64>> {
    let masked = stack.apply_mask(mask)?;
    Ok(reduce_all(&masked, statistic, false))
}

/// Reduce every valid cell of an already masked stack.
pub fn reduce_all(stack: &ArrayStack, statistic: Statistic, parallel: bool) -> Vec<f64> {
    let step = |layer: ArrayView2<'_, f64>| reduce_layer(layer, statistic);
    let values: Vec<f64> = if parallel {
        stack
            .data()
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(step)
            .collect()
    } else {
        stack.data().axis_iter(Axis(0)).map(step).collect()
    };

    tracing::debug!(
        statistic = %statistic,
        steps = values.len(),
        "Reduced area series"
    );

    values
}

/// Reduced series wrapped with the statistic that produced it.
pub fn reduce_series(stack: &ArrayStack, statistic: Statistic, parallel: bool) -> StatisticSeries {
    StatisticSeries {
        statistic,
        values: reduce_all(stack, statistic, parallel),
    }
}

#[inline]
fn reduce_layer(layer: ArrayView2<'_, f64>, statistic: Statistic) -> f64 {
    match statistic {
        Statistic::Mean => mean_of_valid(layer),
        Statistic::Min => fold_valid(layer, f64::min),
        Statistic::Max => fold_valid(layer, f64::max),
    }
}

/// Mean of non-NaN values; NaN if there are none.
fn mean_of_valid(layer: ArrayView2<'_, f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for &v in layer.iter() {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Fold non-NaN values with `pick`; NaN if there are none.
fn fold_valid(layer: ArrayView2<'_, f64>, pick: fn(f64, f64) -> f64) -> f64 {
    layer
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(pick)
        .unwrap_or(f64::NAN)
}
