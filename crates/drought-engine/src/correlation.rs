//! Per-cell Pearson correlation against a reference series.

use drip_common::{DripError, DripResult};
use ndarray::{Array2, ArrayView1, Axis, Zip};

use crate::types::ArrayStack;

/// Minimum number of pairwise-valid time steps for a defined correlation.
pub const DEFAULT_MIN_PAIRS: usize = 2;

/// Correlation of every cell's series with a reference series.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationField {
    parallel: bool,
    min_pairs: usize,
}

impl Default for CorrelationField {
    fn default() -> Self {
        Self {
            parallel: true,
            min_pairs: DEFAULT_MIN_PAIRS,
        }
    }
}

impl CorrelationField {
    pub fn new(parallel: bool, min_pairs: usize) -> Self {
        Self {
            parallel,
            min_pairs: min_pairs.max(DEFAULT_MIN_PAIRS),
        }
    }

    pub fn min_pairs(&self) -> usize {
        self.min_pairs
    }

    /// Compute an `H × W` field of correlation coefficients.
    ///
    /// Each cell uses only the time steps where both it and the reference
    /// are valid. Too few pairs or zero variance gives NaN.
    pub fn compute(&self, reference: &[f64], stack: &ArrayStack) -> DripResult<Array2<f64>> {
        if reference.len() != stack.len() {
            return Err(DripError::shape_mismatch(
                format!("reference of {} steps", stack.len()),
                format!("{} steps", reference.len()),
            ));
        }

        let (rows, cols) = stack.grid_shape();
        let mut field = Array2::from_elem((rows, cols), f64::NAN);
        let reference = ArrayView1::from(reference);
        let min_pairs = self.min_pairs;

        let zip = Zip::from(&mut field).and(stack.data().lanes(Axis(0)));
        if self.parallel {
            zip.par_for_each(|out, series| *out = pearson(reference, series, min_pairs));
        } else {
            zip.for_each(|out, series| *out = pearson(reference, series, min_pairs));
        }

        tracing::debug!(
            steps = stack.len(),
            rows,
            cols,
            defined = field.iter().filter(|v| !v.is_nan()).count(),
            "Computed correlation field"
        );

        Ok(field)
    }
}

/// Pearson correlation over pairwise-valid entries, clamped into [-1, 1].
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>, min_pairs: usize) -> f64 {
    let pairs = || {
        x.iter()
            .zip(y.iter())
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
    };

    let n = pairs().count();
    if n < min_pairs.max(DEFAULT_MIN_PAIRS) {
        return f64::NAN;
    }

    let (sum_x, sum_y) = pairs().fold((0.0, 0.0), |(sx, sy), (a, b)| (sx + a, sy + b));
    let mean_x = sum_x / n as f64;
    let mean_y = sum_y / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in pairs() {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}
