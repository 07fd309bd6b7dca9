//! Analysis query types.
//!
//! A fluent builder describing one area analysis: which index, which time
//! window and months, which cells, and what to compute over them.
//!
//! # Examples
//!
//! ```rust
//! use drought_engine::{AnalysisQuery, LocationSelector, Statistic};
//! use drip_common::{MonthFilter, TimeRange};
//!
//! // Exclusive D0..D4 fractions of SPI-3 over a box, summers only
//! let query = AnalysisQuery::drought_area("spi3", false)
//!     .between(TimeRange::parse("2000-01-01/2012-12-31").unwrap())
//!     .in_months(MonthFilter::new(&[6, 7, 8]).unwrap())
//!     .over(LocationSelector::BoundingBox {
//!         lat_min: 35.0,
//!         lat_max: 40.0,
//!         lon_min: -105.0,
//!         lon_max: -100.0,
//!     });
//!
//! // Area-mean PDSI in percentile space
//! let query = AnalysisQuery::statistic("pdsi", Statistic::Mean).as_percentiles();
//! ```

use drip_common::{MonthFilter, TimeRange};
use serde::{Deserialize, Serialize};

use crate::cache::hash_key;
use crate::mask::LocationSelector;
use crate::types::Statistic;

/// What an analysis computes over the selected area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AreaMode {
    /// D0..D4 area fractions plus DSCI.
    Drought {
        /// Count each cell toward every category it is at least as severe as.
        inclusive: bool,
    },
    /// A single spatial statistic per time step.
    Statistic { statistic: Statistic },
}

/// Parameters of one area analysis.
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnalysisQuery {
    /// Index identifier (e.g. "spi3", "pdsi", "eddi1").
    pub index: String,

    /// Time window. None means the full record.
    pub window: Option<TimeRange>,

    /// Month subset applied after the window. None keeps every month.
    pub months: Option<MonthFilter>,

    /// Cells covered by the analysis.
    pub selector: LocationSelector,

    pub mode: AreaMode,

    /// Convert to per-cell percentiles before analysis.
    pub percentile: bool,
}

impl AnalysisQuery {
    /// Drought category fractions for `index` over the whole grid.
    ///
    /// `inclusive` has no default: exclusive and inclusive counting answer
    /// different questions and callers must pick one.
    pub fn drought_area(index: impl Into<String>, inclusive: bool) -> Self {
        Self::with_mode(index, AreaMode::Drought { inclusive })
    }

    /// Area statistic time series for `index` over the whole grid.
    pub fn statistic(index: impl Into<String>, statistic: Statistic) -> Self {
        Self::with_mode(index, AreaMode::Statistic { statistic })
    }

    fn with_mode(index: impl Into<String>, mode: AreaMode) -> Self {
        Self {
            index: index.into(),
            window: None,
            months: None,
            selector: LocationSelector::All,
            mode,
            percentile: false,
        }
    }

    /// Restrict to a time window.
    pub fn between(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }

    /// Restrict to a subset of months. An empty filter is ignored.
    pub fn in_months(mut self, months: MonthFilter) -> Self {
        self.months = (!months.is_empty()).then_some(months);
        self
    }

    /// Restrict to the cells picked by `selector`.
    pub fn over(mut self, selector: LocationSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Analyse per-cell percentiles instead of raw index values.
    pub fn as_percentiles(mut self) -> Self {
        self.percentile = true;
        self
    }

    /// Time window to analyse; the full record when none was given.
    pub fn time_range(&self) -> TimeRange {
        self.window.unwrap_or_else(TimeRange::unbounded)
    }

    /// Check if this query produces drought category fractions.
    pub fn is_drought(&self) -> bool {
        matches!(self.mode, AreaMode::Drought { .. })
    }

    /// Content hash identifying this query in the result cache.
    pub fn cache_key(&self) -> u64 {
        hash_key(self)
    }
}
