//! High-level drought analysis service.
//!
//! The `DroughtAnalysisService` ties the engine together: it resolves a
//! query's selector against the grid, loads the index stack from a
//! [`StackSource`], optionally converts it to percentiles, restricts it to
//! the selected area and computes category fractions, DSCI or an area
//! statistic. Finished results are kept in an LRU cache keyed by the
//! query itself.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = DroughtAnalysisService::new(grid, source, EngineConfig::from_env())?;
//!
//! let query = AnalysisQuery::drought_area("spi3", false)
//!     .between(TimeRange::parse("2011-01/2012-12")?)
//!     .over(LocationSelector::bbox(&texas));
//!
//! let result = service.analyze(&query)?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use drip_common::{DripError, DripResult, TimeRange};
use ndarray::Array2;

use crate::cache::ResultCache;
use crate::classify::DroughtClassifier;
use crate::config::EngineConfig;
use crate::correlation::CorrelationField;
use crate::dsci;
use crate::grid_index::GridIndex;
use crate::percentile::PercentileTransform;
use crate::query::{AnalysisQuery, AreaMode};
use crate::reduce::reduce_series;
use crate::source::StackSource;
use crate::types::{
    AnalysisResult, AreaAnalysis, ArrayStack, CacheStats, ClassificationResult, CorrelationMap,
};

/// Drought analysis over one grid and one stack source.
pub struct DroughtAnalysisService<S: StackSource> {
    grid: GridIndex,
    source: S,
    config: EngineConfig,
    classifier: DroughtClassifier,
    percentiles: PercentileTransform,
    correlation: CorrelationField,
    cache: Mutex<ResultCache<AnalysisQuery, AnalysisResult>>,
}

impl<S: StackSource> DroughtAnalysisService<S> {
    /// Create a service with the canonical threshold table.
    pub fn new(grid: GridIndex, source: S, config: EngineConfig) -> DripResult<Self> {
        let classifier = DroughtClassifier::new(config.parallel);
        Self::with_classifier(grid, source, config, classifier)
    }

    /// Create a service with a custom classifier (e.g. overridden thresholds).
    pub fn with_classifier(
        grid: GridIndex,
        source: S,
        config: EngineConfig,
        classifier: DroughtClassifier,
    ) -> DripResult<Self> {
        config.validate().map_err(DripError::ConfigError)?;

        tracing::info!(
            rows = grid.shape().0,
            cols = grid.shape().1,
            valid_cells = grid.valid_count(),
            cache_entries = config.result_cache_entries,
            cache_enabled = config.cache_enabled,
            parallel = config.parallel,
            "Created drought analysis service"
        );

        Ok(Self {
            percentiles: PercentileTransform::new(config.parallel),
            correlation: CorrelationField::new(config.parallel, config.min_correlation_pairs),
            cache: Mutex::new(ResultCache::new(config.result_cache_entries)),
            grid,
            source,
            config,
            classifier,
        })
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run an area analysis, serving repeated queries from the cache.
    pub fn analyze(&self, query: &AnalysisQuery) -> DripResult<Arc<AnalysisResult>> {
        let key = query.cache_key();

        if self.config.cache_enabled {
            if let Some(hit) = self.lock_cache()?.get_hashed(key, query) {
                return Ok(hit);
            }
        }

        let result = Arc::new(self.compute(query)?);

        if self.config.cache_enabled {
            self.lock_cache()?
                .insert_hashed(key, query.clone(), Arc::clone(&result));
        }

        Ok(result)
    }

    fn compute(&self, query: &AnalysisQuery) -> DripResult<AnalysisResult> {
        let mask = query.selector.resolve(&self.grid)?;
        let stack = self.load_stack(query)?;
        let masked = stack.apply_mask(&mask)?;

        tracing::debug!(
            index = %query.index,
            selector = query.selector.kind(),
            selected = mask.selected_count(),
            steps = masked.len(),
            percentile = query.percentile,
            "Running area analysis"
        );

        let analysis = match query.mode {
            AreaMode::Drought { inclusive } => {
                let (family, fractions) = if query.percentile {
                    self.classifier
                        .classify_percentiles(&masked, &query.index, inclusive)?
                } else {
                    self.classifier.classify(&masked, &query.index, inclusive)?
                };
                let dsci = dsci::aggregate(&fractions);

                AreaAnalysis::Drought(ClassificationResult {
                    index: query.index.clone(),
                    family: family.key().to_string(),
                    percentile: query.percentile,
                    fractions,
                    dsci,
                })
            }
            AreaMode::Statistic { statistic } => {
                AreaAnalysis::Statistic(reduce_series(&masked, statistic, self.config.parallel))
            }
        };

        Ok(AnalysisResult {
            index: query.index.clone(),
            times: masked.times().to_vec(),
            selected_cells: mask.selected_count(),
            analysis,
        })
    }

    /// Load the query's stack, windowed and month-filtered.
    ///
    /// Percentiles are ranked against the full record before windowing so
    /// that a short window does not change a cell's percentile.
    fn load_stack(&self, query: &AnalysisQuery) -> DripResult<ArrayStack> {
        let stack = if query.percentile {
            let full = self.source.load(&query.index, &TimeRange::unbounded())?;
            self.percentiles.apply(&full).slice_time(&query.time_range())
        } else {
            self.source.load(&query.index, &query.time_range())?
        };

        let stack = match &query.months {
            Some(months) => stack.filter_months(months),
            None => stack,
        };

        if stack.grid_shape() != self.grid.shape() {
            return Err(DripError::shape_mismatch(
                format!("{:?}", self.grid.shape()),
                format!("{:?}", stack.grid_shape()),
            ));
        }

        if stack.is_empty() {
            tracing::warn!(index = %query.index, "No time steps in the requested window");
        }

        Ok(stack)
    }

    /// Correlate every cell of `index` with an arbitrary reference series.
    pub fn correlation_field(
        &self,
        reference: &[f64],
        index: &str,
        window: &TimeRange,
    ) -> DripResult<Array2<f64>> {
        let stack = self.source.load(index, window)?;
        self.correlation.compute(reference, &stack)
    }

    /// Correlate every cell of `index` with the cell containing `(lon, lat)`.
    pub fn correlation_at(
        &self,
        index: &str,
        window: &TimeRange,
        lon: f64,
        lat: f64,
    ) -> DripResult<CorrelationMap> {
        let (row, col) = self.grid.resolve(lon, lat)?;
        self.grid.grid_id(row, col)?;

        let stack = self.source.load(index, window)?;
        let reference = stack.cell_series(row, col)?.to_vec();
        let field = self.correlation.compute(&reference, &stack)?;

        tracing::debug!(index = %index, row, col, steps = stack.len(), "Correlated against cell");

        Ok(CorrelationMap {
            index: index.to_string(),
            reference_cell: (row, col),
            times: stack.times().to_vec(),
            field,
        })
    }

    /// Get cache statistics for monitoring.
    pub fn cache_stats(&self) -> DripResult<CacheStats> {
        Ok(self.lock_cache()?.stats())
    }

    /// Clear the result cache.
    pub fn clear_cache(&self) -> DripResult<()> {
        self.lock_cache()?.clear();
        Ok(())
    }

    fn lock_cache(
        &self,
    ) -> DripResult<MutexGuard<'_, ResultCache<AnalysisQuery, AnalysisResult>>> {
        self.cache
            .lock()
            .map_err(|_| DripError::CacheError("result cache lock poisoned".to_string()))
    }
}
