//! Common types and utilities shared across the drought index portal crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use error::{DripError, DripResult};
pub use grid::{grids, GridSpec};
pub use time::{parse_date, MonthFilter, TimeRange};
