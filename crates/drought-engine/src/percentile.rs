//! Per-cell rank percentiles.
//!
//! Each cell's value at time *t* becomes `100 * rank / n`, where `rank` is
//! the average rank of the value among the cell's own `n` valid values.
//! Cells are independent; NaN stays NaN and is not counted in `n`.

use ndarray::{Array3, ArrayView1, ArrayViewMut1, Axis, Zip};

use crate::types::ArrayStack;

/// Rank-based percentile transform over the time axis.
#[derive(Debug, Clone, Copy)]
pub struct PercentileTransform {
    parallel: bool,
}

impl Default for PercentileTransform {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl PercentileTransform {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Convert every cell's series to percentiles (0–100).
    pub fn apply(&self, stack: &ArrayStack) -> ArrayStack {
        let input = stack.data();
        let mut output = Array3::from_elem(input.raw_dim(), f64::NAN);

        let zip = Zip::from(output.lanes_mut(Axis(0))).and(input.lanes(Axis(0)));
        if self.parallel {
            zip.par_for_each(|out, series| rank_series(series, out));
        } else {
            zip.for_each(|out, series| rank_series(series, out));
        }

        tracing::debug!(
            steps = stack.len(),
            rows = stack.grid_shape().0,
            cols = stack.grid_shape().1,
            "Computed percentile stack"
        );

        stack.replace_values(output)
    }
}

/// Convert a stack to percentiles using the default (parallel) transform.
pub fn to_percentiles(stack: &ArrayStack) -> ArrayStack {
    PercentileTransform::default().apply(stack)
}

/// Average-rank percentiles of one series. `out` must start as NaN.
fn rank_series(series: ArrayView1<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
    let mut order: Vec<usize> = (0..series.len()).filter(|&t| !series[t].is_nan()).collect();
    let n = order.len();
    if n == 0 {
        return;
    }

    order.sort_unstable_by(|&a, &b| series[a].total_cmp(&series[b]));

    let mut start = 0;
    while start < n {
        let value = series[order[start]];
        let mut end = start + 1;
        while end < n && series[order[end]] == value {
            end += 1;
        }

        // Ranks start+1 ..= end share their mean.
        let rank = (start + 1 + end) as f64 / 2.0;
        let pct = 100.0 * rank / n as f64;
        for &t in &order[start..end] {
            out[t] = pct;
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::{array, Array1};

    fn ranks(values: &[f64]) -> Vec<f64> {
        let series = Array1::from_vec(values.to_vec());
        let mut out = Array1::from_elem(values.len(), f64::NAN);
        rank_series(series.view(), out.view_mut());
        out.to_vec()
    }

    #[test]
    fn test_distinct_values() {
        let pct = ranks(&[1.0, 5.0, -1.0]);
        assert!((pct[0] - 66.666_666).abs() < 1e-4);
        assert!((pct[1] - 100.0).abs() < 1e-9);
        assert!((pct[2] - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_ties_use_average_rank() {
        // Ranks: 1, 2.5, 2.5, 4
        let pct = ranks(&[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(pct, vec![25.0, 62.5, 62.5, 100.0]);
    }

    #[test]
    fn test_nan_is_excluded_and_preserved() {
        let pct = ranks(&[f64::NAN, 3.0, 1.0]);
        assert!(pct[0].is_nan());
        assert_eq!(pct[1], 100.0);
        assert_eq!(pct[2], 50.0);

        assert!(ranks(&[f64::NAN, f64::NAN]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_stack_transform_is_per_cell() {
        let times = (1..=3)
            .map(|m| NaiveDate::from_ymd_opt(2001, m, 1).unwrap())
            .collect();
        let stack = ArrayStack::from_layers(
            &[
                array![[1.0, 2.0], [3.0, 4.0]],
                array![[5.0, 6.0], [7.0, 8.0]],
                array![[-1.0, -2.0], [-3.0, -4.0]],
            ],
            times,
        )
        .unwrap();

        for parallel in [true, false] {
            let pct = PercentileTransform::new(parallel).apply(&stack);
            assert_eq!(pct.times(), stack.times());
            for row in 0..2 {
                for col in 0..2 {
                    let series = pct.cell_series(row, col).unwrap();
                    assert!((series[0] - 200.0 / 3.0).abs() < 1e-9);
                    assert!((series[1] - 100.0).abs() < 1e-9);
                    assert!((series[2] - 100.0 / 3.0).abs() < 1e-9);
                }
            }
        }
    }
}
