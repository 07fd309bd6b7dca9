//! Tests for grid lookups and time handling.

use chrono::NaiveDate;
use drip_common::{grids, parse_date, DripError, GridSpec, MonthFilter, TimeRange};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// GridSpec lookups
// ============================================================================

#[test]
fn test_north_up_orientation() {
    let grid = GridSpec::new(4, 4, 1.0, 0.0, 4.0);
    // North-west corner cell
    assert_eq!(grid.coord_to_cell(0.5, 3.5).unwrap(), (0, 0));
    // South-east corner cell
    assert_eq!(grid.coord_to_cell(3.5, 0.5).unwrap(), (3, 3));
}

#[test]
fn test_interior_edges_bin_forward() {
    let grid = GridSpec::new(4, 4, 1.0, 0.0, 4.0);
    // lon 1.0 is the west edge of column 1; lat 3.0 the north edge of row 1
    assert_eq!(grid.coord_to_cell(1.0, 3.0).unwrap(), (1, 1));
}

#[test]
fn test_every_cell_centre_round_trips() {
    let grid = GridSpec::new(7, 5, 0.5, -100.0, 40.0);
    for row in 0..5 {
        for col in 0..7 {
            let (lon, lat) = grid.cell_to_coord(row, col).unwrap();
            assert_eq!(grid.coord_to_cell(lon, lat).unwrap(), (row, col));
        }
    }
}

#[test]
fn test_cell_to_coord_outside_is_error() {
    let grid = GridSpec::new(2, 2, 1.0, 0.0, 2.0);
    assert!(grid.cell_to_coord(2, 0).is_err());
    assert!(grid.cell_to_coord(0, 2).is_err());
}

#[test]
fn test_out_of_bounds_carries_coordinates() {
    let grid = grids::conus_0p25();
    match grid.coord_to_cell(-140.0, 45.0) {
        Err(DripError::OutOfBounds { lon, lat, .. }) => {
            assert_eq!(lon, -140.0);
            assert_eq!(lat, 45.0);
        }
        other => panic!("expected OutOfBounds, got {:?}", other),
    }
}

#[test]
fn test_empty_grid_rejects_all_points() {
    let grid = GridSpec::new(0, 0, 1.0, 0.0, 0.0);
    assert!(grid.is_empty());
    assert!(grid.coord_to_cell(0.0, 0.0).is_err());
}

#[test]
fn test_flat_index_row_major() {
    let grid = GridSpec::new(5, 3, 1.0, 0.0, 3.0);
    assert_eq!(grid.flat_index(0, 0), 0);
    assert_eq!(grid.flat_index(0, 4), 4);
    assert_eq!(grid.flat_index(2, 1), 11);
    assert_eq!(grid.len(), 15);
}

#[test]
fn test_validate_rejects_degenerate_specs() {
    assert!(grids::conus_0p25().validate().is_ok());

    let negative = GridSpec::new(4, 4, -1.0, 0.0, 4.0);
    match negative.validate() {
        Err(DripError::InvalidParameter { param, .. }) => assert_eq!(param, "resolution"),
        other => panic!("expected InvalidParameter, got {:?}", other),
    }
    assert!(GridSpec::new(4, 4, 0.0, 0.0, 4.0).validate().is_err());
    assert!(GridSpec::new(4, 4, f64::NAN, 0.0, 4.0).validate().is_err());
    assert!(GridSpec::new(4, 4, 1.0, f64::INFINITY, 4.0).validate().is_err());
    assert!(GridSpec::new(4, 4, 1e308, 1e308, 4.0).validate().is_err());
}

#[test]
fn test_eighth_degree_grid_shape() {
    assert_eq!(grids::conus_0p125().shape(), (240, 600));
}

// ============================================================================
// Dates, ranges and month filters
// ============================================================================

#[test]
fn test_parse_date_forms() {
    assert_eq!(parse_date("2012-07-15").unwrap(), date(2012, 7, 15));
    assert_eq!(parse_date("2012-07").unwrap(), date(2012, 7, 1));
    assert_eq!(parse_date("2012-07-15T06:00:00Z").unwrap(), date(2012, 7, 15));
    assert!(matches!(parse_date("July 2012"), Err(DripError::InvalidTime(_))));
}

#[test]
fn test_time_range_is_inclusive() {
    let range = TimeRange::parse("2011-01/2011-12").unwrap();
    assert!(range.contains(&date(2011, 1, 1)));
    assert!(range.contains(&date(2011, 12, 1)));
    assert!(!range.contains(&date(2011, 12, 2)));
}

#[test]
fn test_time_range_rejects_reversed() {
    assert!(TimeRange::new(date(2012, 1, 1), date(2011, 1, 1)).is_err());
    assert!(TimeRange::parse("2012-01-01").is_err());
}

#[test]
fn test_time_range_from_open_bounds() {
    let range = TimeRange::from_bounds(Some(date(2000, 1, 1)), None).unwrap();
    assert!(range.contains(&date(2099, 1, 1)));
    assert!(!range.contains(&date(1999, 12, 1)));
    assert!(TimeRange::unbounded().contains(&date(1895, 1, 1)));
}

#[test]
fn test_month_filter_parsing() {
    let filter = MonthFilter::parse("8, 6,7,6").unwrap();
    assert_eq!(filter.months(), &[6, 7, 8]);
    assert!(filter.accepts(&date(2012, 7, 1)));
    assert!(!filter.accepts(&date(2012, 9, 1)));

    assert!(MonthFilter::parse("0").is_err());
    assert!(MonthFilter::parse("13").is_err());
    assert!(MonthFilter::parse("jun").is_err());
}

#[test]
fn test_empty_month_filter_accepts_everything() {
    let filter = MonthFilter::new(&[]).unwrap();
    assert!(filter.is_empty());
    assert!(filter.accepts(&date(2012, 2, 1)));
}
