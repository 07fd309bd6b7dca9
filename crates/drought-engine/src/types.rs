//! Core types for drought analysis.

use chrono::NaiveDate;
use drip_common::{DripError, DripResult, MonthFilter, TimeRange};
use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Number of drought severity categories (D0..D4).
pub const NUM_CATEGORIES: usize = 5;

/// A time-ordered stack of `H × W` drought index layers.
///
/// Axis 0 is time, axis 1 rows (north to south), axis 2 columns (west to
/// east). NaN marks no data. Timestamps are strictly increasing and there is
/// exactly one per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStack {
    data: Array3<f64>,
    times: Vec<NaiveDate>,
}

impl ArrayStack {
    /// Create a stack, validating the time axis against the data.
    pub fn new(data: Array3<f64>, times: Vec<NaiveDate>) -> DripResult<Self> {
        if data.len_of(Axis(0)) != times.len() {
            return Err(DripError::InvalidStack(format!(
                "{} layers but {} timestamps",
                data.len_of(Axis(0)),
                times.len()
            )));
        }

        if let Some(pair) = times.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DripError::InvalidStack(format!(
                "timestamps not strictly increasing: {} then {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self { data, times })
    }

    /// Build a stack from individual 2-D layers of identical shape.
    pub fn from_layers(layers: &[Array2<f64>], times: Vec<NaiveDate>) -> DripResult<Self> {
        let first = layers
            .first()
            .ok_or_else(|| DripError::InvalidStack("no layers given".to_string()))?;

        if let Some(bad) = layers.iter().find(|l| l.dim() != first.dim()) {
            return Err(DripError::shape_mismatch(
                format!("{:?}", first.dim()),
                format!("{:?}", bad.dim()),
            ));
        }

        let views: Vec<ArrayView2<f64>> = layers.iter().map(|l| l.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| DripError::InvalidStack(e.to_string()))?;
        Self::new(data, times)
    }

    /// A stack with no time steps over an `rows × cols` grid.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            data: Array3::zeros((0, rows, cols)),
            times: Vec::new(),
        }
    }

    /// Replace the values, keeping the time axis. Shapes must match.
    pub fn with_values(&self, data: Array3<f64>) -> DripResult<Self> {
        if data.dim() != self.data.dim() {
            return Err(DripError::shape_mismatch(
                format!("{:?}", self.data.dim()),
                format!("{:?}", data.dim()),
            ));
        }
        Ok(Self {
            data,
            times: self.times.clone(),
        })
    }

    /// Same-shape replacement for transforms that allocate from `self`.
    pub(crate) fn replace_values(&self, data: Array3<f64>) -> Self {
        debug_assert_eq!(data.dim(), self.data.dim());
        Self {
            data,
            times: self.times.clone(),
        }
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Grid shape as `(rows, cols)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    /// The layer at time step `t`.
    pub fn layer(&self, t: usize) -> Option<ArrayView2<'_, f64>> {
        (t < self.len()).then(|| self.data.index_axis(Axis(0), t))
    }

    /// The full time series of one cell.
    pub fn cell_series(&self, row: usize, col: usize) -> DripResult<ArrayView1<'_, f64>> {
        let (rows, cols) = self.grid_shape();
        if row >= rows || col >= cols {
            return Err(DripError::invalid_parameter(
                "cell",
                format!("({}, {}) is outside a {}x{} stack", row, col, rows, cols),
            ));
        }
        Ok(self.data.slice(s![.., row, col]))
    }

    /// Keep only the time steps inside `range`.
    pub fn slice_time(&self, range: &TimeRange) -> Self {
        self.select_times(|date| range.contains(date))
    }

    /// Keep only the time steps whose month passes `filter`.
    pub fn filter_months(&self, filter: &MonthFilter) -> Self {
        self.select_times(|date| filter.accepts(date))
    }

    fn select_times(&self, keep: impl Fn(&NaiveDate) -> bool) -> Self {
        let indices: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, date)| keep(date))
            .map(|(i, _)| i)
            .collect();

        if indices.len() == self.times.len() {
            return self.clone();
        }
        if indices.is_empty() {
            let (rows, cols) = self.grid_shape();
            return Self::empty(rows, cols);
        }

        Self {
            data: self.data.select(Axis(0), &indices),
            times: indices.iter().map(|&i| self.times[i]).collect(),
        }
    }

    /// Multiply every layer by `mask`, turning unselected cells into NaN.
    pub fn apply_mask(&self, mask: &Mask) -> DripResult<Self> {
        if mask.shape() != self.grid_shape() {
            return Err(DripError::shape_mismatch(
                format!("{:?}", self.grid_shape()),
                format!("{:?}", mask.shape()),
            ));
        }

        let mut data = self.data.clone();
        for mut layer in data.outer_iter_mut() {
            layer *= mask.values();
        }

        Ok(Self {
            data,
            times: self.times.clone(),
        })
    }

    /// Count of non-NaN values across the whole stack.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// An `H × W` selection mask holding 1.0 for selected cells and NaN elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    values: Array2<f64>,
}

impl Mask {
    /// Every cell selected.
    pub fn all(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::ones((rows, cols)),
        }
    }

    /// No cell selected.
    pub fn none(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::from_elem((rows, cols), f64::NAN),
        }
    }

    /// Promote a boolean footprint to a mask.
    pub fn from_footprint(footprint: &Array2<bool>) -> Self {
        Self {
            values: footprint.mapv(|selected| if selected { 1.0 } else { f64::NAN }),
        }
    }

    pub(crate) fn select(&mut self, row: usize, col: usize) {
        if let Some(v) = self.values.get_mut((row, col)) {
            *v = 1.0;
        }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.values.get((row, col)).is_some_and(|v| !v.is_nan())
    }

    /// Number of selected cells.
    pub fn selected_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// True when no cell is selected.
    pub fn is_empty(&self) -> bool {
        self.selected_count() == 0
    }
}

/// Spatial statistic for area time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Min,
    Max,
}

impl Statistic {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Some(Self::Mean),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Percent of the selected area in each category D0..D4, per time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFractionSeries {
    /// One `[d0, d1, d2, d3, d4]` row per time step, each 0–100 or NaN.
    pub rows: Vec<[f64; NUM_CATEGORIES]>,
    /// Whether the fractions were counted cumulatively ("at least this severe").
    pub inclusive: bool,
}

impl CategoryFractionSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The series for one category across all time steps.
    pub fn category(&self, category: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.get(category).copied().unwrap_or(f64::NAN))
            .collect()
    }
}

/// Drought Severity Coverage Index per time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DsciSeries {
    pub values: Vec<f64>,
    /// Counting mode of the fractions this was derived from. Inclusive DSCI
    /// values are not on the 0–500 scale.
    pub inclusive: bool,
}

/// Category fractions together with the DSCI derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Index identifier as requested (e.g. "spi3").
    pub index: String,
    /// Threshold family key that matched (e.g. "sp").
    pub family: String,
    /// Whether percentile thresholds were used.
    pub percentile: bool,
    pub fractions: CategoryFractionSeries,
    pub dsci: DsciSeries,
}

/// A reduced area time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticSeries {
    pub statistic: Statistic,
    pub values: Vec<f64>,
}

/// What an area analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaAnalysis {
    Drought(ClassificationResult),
    Statistic(StatisticSeries),
}

/// Result of one analysis query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub index: String,
    /// Time steps analysed, after windowing and month filtering.
    pub times: Vec<NaiveDate>,
    /// Number of grid cells the selector picked.
    pub selected_cells: usize,
    pub analysis: AreaAnalysis,
}

impl AnalysisResult {
    pub fn classification(&self) -> Option<&ClassificationResult> {
        match &self.analysis {
            AreaAnalysis::Drought(result) => Some(result),
            AreaAnalysis::Statistic(_) => None,
        }
    }

    pub fn statistic(&self) -> Option<&StatisticSeries> {
        match &self.analysis {
            AreaAnalysis::Statistic(series) => Some(series),
            AreaAnalysis::Drought(_) => None,
        }
    }
}

/// Correlation of every cell with one reference cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMap {
    pub index: String,
    /// `(row, col)` of the reference cell.
    pub reference_cell: (usize, usize),
    pub times: Vec<NaiveDate>,
    pub field: Array2<f64>,
}

/// Result cache statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
