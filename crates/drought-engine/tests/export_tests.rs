//! CSV export written to disk and read back.

use std::fs::File;

use drought_engine::{
    write_field_csv, write_result_csv, AnalysisQuery, ArrayStack, DroughtAnalysisService,
    EngineConfig, GridIndex, MemoryStackSource, Statistic, FRACTION_HEADER,
};
use drip_common::TimeRange;
use tempfile::TempDir;
use test_utils::{create_drying_stack, fixtures};

fn service() -> DroughtAnalysisService<MemoryStackSource> {
    let (data, times) = create_drying_stack(8, 4, 4);
    let source = MemoryStackSource::new()
        .with_stack(fixtures::indices::SPEI_6, ArrayStack::new(data, times).unwrap());
    DroughtAnalysisService::new(
        GridIndex::new(fixtures::grid::unit_4x4()).unwrap(),
        source,
        EngineConfig::default(),
    )
    .unwrap()
}

fn read_back(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

#[test]
fn test_fraction_export_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spei6.csv");

    let result = service()
        .analyze(&AnalysisQuery::drought_area("spei6", false))
        .unwrap();
    write_result_csv(File::create(&path).unwrap(), &result).unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, FRACTION_HEADER);
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0][0], "2000-01-01");

    // Month 8: every cell is below -2.0 -> all D4, DSCI 500
    let last = &rows[7];
    assert_eq!(&last[1..], &["0", "0", "0", "0", "100", "500"]);
}

#[test]
fn test_statistic_export_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mean.csv");

    let query = AnalysisQuery::statistic("spei6", Statistic::Min)
        .between(TimeRange::parse("2000-01/2000-02").unwrap());
    let result = service().analyze(&query).unwrap();
    write_result_csv(File::create(&path).unwrap(), &result).unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["date", "value"]);
    assert_eq!(rows.len(), 2);
    // Easternmost column carries the largest offset: 1.0 - 0.03
    let min: f64 = rows[0][1].parse().unwrap();
    assert!((min - 0.97).abs() < 1e-9);
}

#[test]
fn test_correlation_field_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("correlation.csv");

    let service = service();
    let map = service
        .correlation_at("spei6", &TimeRange::unbounded(), 1.5, 2.5)
        .unwrap();
    write_field_csv(File::create(&path).unwrap(), service.grid(), &map.field).unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["grid_id", "lon", "lat", "value"]);
    assert_eq!(rows.len(), 16);
    assert_eq!(rows[0][..3], ["0", "0.5", "3.5"]);
    for row in &rows {
        let r: f64 = row[3].parse().unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }
}
