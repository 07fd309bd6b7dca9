//! Drought classification and areal aggregation engine.
//!
//! Turns gridded, monthly drought index stacks (PDSI, SPI, SPEI, EDDI,
//! LERI) into the area statistics a drought portal shows:
//!
//! - **Category fractions**: percent of an area in each of D0..D4
//! - **DSCI**: the Drought Severity Coverage Index derived from them
//! - **Area statistics**: mean/min/max time series over a selection
//! - **Correlation fields**: per-cell Pearson correlation with a reference
//!
//! # Architecture
//!
//! ```text
//! AnalysisQuery
//!      │
//!      ▼
//! DroughtAnalysisService::analyze(query)
//!      │
//!      ├─► Check ResultCache (hash of the query)
//!      │         │
//!      │         └─► Cache hit: return shared result
//!      │
//!      ├─► LocationSelector ──resolve(GridIndex)──► Mask
//!      │
//!      ├─► StackSource::load(index, window) ──► ArrayStack
//!      │         │
//!      │         └─► (percentile) PercentileTransform over the full record
//!      │
//!      ├─► month filter, stack × mask
//!      │
//!      └─► DroughtClassifier ──► fractions ──► DSCI
//!          or reduce(Statistic)
//!               │
//!               ▼
//!          AnalysisResult ──► export (CSV)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use drought_engine::{AnalysisQuery, DroughtAnalysisService, EngineConfig, GridIndex};
//!
//! let service = DroughtAnalysisService::new(GridIndex::new(spec)?, source, EngineConfig::default())?;
//! let result = service.analyze(&AnalysisQuery::drought_area("pdsi", false))?;
//!
//! if let Some(drought) = result.classification() {
//!     println!("latest DSCI: {:?}", drought.dsci.values.last());
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod correlation;
pub mod dsci;
pub mod export;
pub mod grid_index;
pub mod mask;
pub mod percentile;
pub mod query;
pub mod reduce;
pub mod service;
pub mod source;
pub mod thresholds;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{hash_key, ResultCache};
pub use classify::DroughtClassifier;
pub use config::EngineConfig;
pub use correlation::{pearson, CorrelationField};
pub use export::{
    write_field_csv, write_fraction_csv, write_result_csv, write_series_csv, FRACTION_HEADER,
};
pub use grid_index::GridIndex;
pub use mask::{resolve, LocationSelector};
pub use percentile::{to_percentiles, PercentileTransform};
pub use query::{AnalysisQuery, AreaMode};
pub use reduce::{reduce, reduce_all, reduce_series};
pub use service::DroughtAnalysisService;
pub use source::{MemoryStackSource, StackSource};
pub use thresholds::{CategoryBin, CategoryThresholdTable, CategoryThresholds, IndexFamily};
pub use types::{
    AnalysisResult, AreaAnalysis, ArrayStack, CacheStats, CategoryFractionSeries,
    ClassificationResult, CorrelationMap, DsciSeries, Mask, Statistic, StatisticSeries,
    NUM_CATEGORIES,
};

pub use drip_common::{DripError, DripResult};
