//! Drought category thresholds per index family.
//!
//! Thresholds are index values, not percentiles, except for the dedicated
//! percentile table. Categories grow more severe with their index: D0 is
//! abnormally dry, D4 exceptional drought.
//!
//! | Family | D0 | D1 | D2 | D3 | D4 |
//! |---|---|---|---|---|---|
//! | sp (SPI/SPEI), eddi, leri | -0.5 | -0.8 | -1.3 | -1.6 | -2.0 |
//! | pdsi | -1 | -2 | -3 | -4 | -5 |
//! | percentile | 30 | 20 | 10 | 5 | 2 |
//!
//! EDDI is positive when dry, so its values are negated (and its
//! percentiles reflected) before these thresholds apply.

use drip_common::{DripError, DripResult};
use serde::{Deserialize, Serialize};

use crate::types::NUM_CATEGORIES;

/// Lower bound sentinel for the most severe category.
pub const OPEN_LOWER_BOUND: f64 = -999.0;

/// A drought index family, matched by substring against index identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFamily {
    /// Evaporative Demand Drought Index.
    Eddi,
    /// Landscape Evaporative Response Index.
    Leri,
    /// Palmer Drought Severity Index and its variants.
    Pdsi,
    /// Standardized Precipitation (Evapotranspiration) Index.
    Spi,
}

impl IndexFamily {
    /// Families in matching order.
    pub const ALL: [IndexFamily; 4] = [Self::Eddi, Self::Leri, Self::Pdsi, Self::Spi];

    /// Substring key used to recognise the family in an index identifier.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Eddi => "eddi",
            Self::Leri => "leri",
            Self::Pdsi => "pdsi",
            Self::Spi => "sp",
        }
    }

    /// Find the family of an identifier such as "spi3", "spei12" or "pdsi".
    pub fn from_index(index: &str) -> DripResult<Self> {
        let index_lower = index.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| index_lower.contains(family.key()))
            .ok_or_else(|| DripError::UnknownIndexFamily(index.to_string()))
    }

    /// Whether larger values mean drier conditions.
    pub fn is_reversed(&self) -> bool {
        matches!(self, Self::Eddi)
    }
}

impl std::fmt::Display for IndexFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One category's `[upper, lower]` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBin {
    pub upper: f64,
    pub lower: f64,
}

impl CategoryBin {
    pub const fn new(upper: f64, lower: f64) -> Self {
        Self { upper, lower }
    }

    /// Whether `value` counts toward this category.
    ///
    /// Exclusive counting uses `lower <= value < upper`; inclusive counting
    /// uses `value < upper`, so a cell counts toward every category it is at
    /// least as severe as.
    #[inline]
    pub fn contains(&self, value: f64, inclusive: bool) -> bool {
        if inclusive {
            value < self.upper
        } else {
            value >= self.lower && value < self.upper
        }
    }
}

/// The five category bins D0..D4 of one family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    bins: [CategoryBin; NUM_CATEGORIES],
}

impl CategoryThresholds {
    /// Build from `[upper, lower]` pairs, checking that each bin is
    /// non-empty and that severity increases with the category index.
    pub fn new(pairs: [[f64; 2]; NUM_CATEGORIES]) -> DripResult<Self> {
        let bins = pairs.map(|[upper, lower]| CategoryBin::new(upper, lower));

        for (i, bin) in bins.iter().enumerate() {
            if bin.upper.is_nan() || bin.lower.is_nan() || bin.lower >= bin.upper {
                return Err(DripError::invalid_parameter(
                    "thresholds",
                    format!("D{} bounds [{}, {}] are empty", i, bin.upper, bin.lower),
                ));
            }
        }

        for (i, pair) in bins.windows(2).enumerate() {
            if pair[1].upper > pair[0].upper || pair[1].lower > pair[0].lower {
                return Err(DripError::invalid_parameter(
                    "thresholds",
                    format!("D{} is less severe than D{}", i + 1, i),
                ));
            }
        }

        Ok(Self { bins })
    }

    const fn from_cutoffs(cutoffs: [f64; NUM_CATEGORIES]) -> Self {
        Self {
            bins: [
                CategoryBin::new(cutoffs[0], cutoffs[1]),
                CategoryBin::new(cutoffs[1], cutoffs[2]),
                CategoryBin::new(cutoffs[2], cutoffs[3]),
                CategoryBin::new(cutoffs[3], cutoffs[4]),
                CategoryBin::new(cutoffs[4], OPEN_LOWER_BOUND),
            ],
        }
    }

    /// Standardized indices (SPI, SPEI, EDDI, LERI).
    pub const fn standardized() -> Self {
        Self::from_cutoffs([-0.5, -0.8, -1.3, -1.6, -2.0])
    }

    /// Palmer Drought Severity Index.
    pub const fn pdsi() -> Self {
        Self::from_cutoffs([-1.0, -2.0, -3.0, -4.0, -5.0])
    }

    /// USDM percentile cut-offs.
    pub const fn percentile() -> Self {
        Self::from_cutoffs([30.0, 20.0, 10.0, 5.0, 2.0])
    }

    pub fn bins(&self) -> &[CategoryBin; NUM_CATEGORIES] {
        &self.bins
    }

    /// Per-category membership of a single value.
    #[inline]
    pub fn classify(&self, value: f64, inclusive: bool) -> [bool; NUM_CATEGORIES] {
        self.bins.map(|bin| bin.contains(value, inclusive))
    }
}

/// Threshold table keyed by index family, plus the percentile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholdTable {
    eddi: CategoryThresholds,
    leri: CategoryThresholds,
    pdsi: CategoryThresholds,
    spi: CategoryThresholds,
    percentile: CategoryThresholds,
}

impl Default for CategoryThresholdTable {
    fn default() -> Self {
        Self {
            eddi: CategoryThresholds::standardized(),
            leri: CategoryThresholds::standardized(),
            pdsi: CategoryThresholds::pdsi(),
            spi: CategoryThresholds::standardized(),
            percentile: CategoryThresholds::percentile(),
        }
    }
}

impl CategoryThresholdTable {
    pub fn thresholds(&self, family: IndexFamily) -> &CategoryThresholds {
        match family {
            IndexFamily::Eddi => &self.eddi,
            IndexFamily::Leri => &self.leri,
            IndexFamily::Pdsi => &self.pdsi,
            IndexFamily::Spi => &self.spi,
        }
    }

    /// Replace one family's thresholds.
    pub fn set(&mut self, family: IndexFamily, thresholds: CategoryThresholds) {
        match family {
            IndexFamily::Eddi => self.eddi = thresholds,
            IndexFamily::Leri => self.leri = thresholds,
            IndexFamily::Pdsi => self.pdsi = thresholds,
            IndexFamily::Spi => self.spi = thresholds,
        }
    }

    pub fn percentile(&self) -> &CategoryThresholds {
        &self.percentile
    }

    pub fn set_percentile(&mut self, thresholds: CategoryThresholds) {
        self.percentile = thresholds;
    }

    /// Resolve an index identifier to its family and thresholds.
    pub fn lookup(&self, index: &str) -> DripResult<(IndexFamily, &CategoryThresholds)> {
        let family = IndexFamily::from_index(index)?;
        Ok((family, self.thresholds(family)))
    }
}
