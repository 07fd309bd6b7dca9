//! Configuration for the drought analysis engine.

use serde::{Deserialize, Serialize};

use crate::correlation::DEFAULT_MIN_PAIRS;

/// Configuration for the drought analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of analysis results held in the result cache.
    pub result_cache_entries: usize,

    /// Use rayon for per-cell and per-step work.
    pub parallel: bool,

    /// Minimum pairwise-valid time steps for a defined correlation.
    pub min_correlation_pairs: usize,

    /// Cache analysis results between identical queries.
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            result_cache_entries: 128,
            parallel: true,
            min_correlation_pairs: DEFAULT_MIN_PAIRS,
            cache_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DRIP_RESULT_CACHE_ENTRIES") {
            if let Ok(entries) = val.parse() {
                config.result_cache_entries = entries;
            }
        }

        if let Ok(val) = std::env::var("DRIP_PARALLEL") {
            config.parallel = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("DRIP_MIN_CORRELATION_PAIRS") {
            if let Ok(pairs) = val.parse() {
                config.min_correlation_pairs = pairs;
            }
        }

        if let Ok(val) = std::env::var("DRIP_CACHE_ENABLED") {
            config.cache_enabled = parse_flag(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.result_cache_entries == 0 {
            return Err("result_cache_entries must be > 0".to_string());
        }

        if self.min_correlation_pairs < DEFAULT_MIN_PAIRS {
            return Err(format!(
                "min_correlation_pairs must be >= {}",
                DEFAULT_MIN_PAIRS
            ));
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}
