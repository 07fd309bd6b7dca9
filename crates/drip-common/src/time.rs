//! Time handling utilities for monthly drought index series.

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{DripError, DripResult};

/// Parse a date from ISO 8601 forms used by the portal.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` (first day of the month) and full
/// RFC 3339 timestamps (date part only).
pub fn parse_date(s: &str) -> DripResult<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(DripError::InvalidTime(s.to_string()))
}

/// An inclusive date range for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    /// Create a range; fails when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DripResult<Self> {
        if start > end {
            return Err(DripError::InvalidTime(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering every representable date.
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    /// Parse "start/end", where either side may be any form accepted by
    /// [`parse_date`].
    pub fn parse(s: &str) -> DripResult<Self> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| DripError::InvalidTime(format!("expected 'start/end', got '{}'", s)))?;
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Build a range from optional bounds; missing sides are unbounded.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DripResult<Self> {
        Self::new(start.unwrap_or(NaiveDate::MIN), end.unwrap_or(NaiveDate::MAX))
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date >= &self.start && date <= &self.end
    }
}

/// A subset of calendar months (1 = January).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthFilter {
    months: Vec<u32>,
}

impl MonthFilter {
    /// Create a filter; months must be 1–12. Duplicates are dropped.
    pub fn new(months: &[u32]) -> DripResult<Self> {
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(DripError::InvalidTime(format!(
                "month {} is not in 1..=12",
                bad
            )));
        }
        let mut months = months.to_vec();
        months.sort_unstable();
        months.dedup();
        Ok(Self { months })
    }

    /// Parse a comma-separated month list, e.g. "6,7,8".
    pub fn parse(s: &str) -> DripResult<Self> {
        let months = s
            .split(',')
            .map(|m| {
                m.trim()
                    .parse::<u32>()
                    .map_err(|_| DripError::InvalidTime(format!("invalid month '{}'", m)))
            })
            .collect::<DripResult<Vec<_>>>()?;
        Self::new(&months)
    }

    /// Whether `date` falls in one of the selected months. An empty filter
    /// accepts every month.
    pub fn accepts(&self, date: &NaiveDate) -> bool {
        self.months.is_empty() || self.months.contains(&date.month())
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}
