//! Tests for the analysis service: query flow, percentiles, caching and
//! correlation lookups.

use drip_common::{DripError, GridSpec, MonthFilter, TimeRange};
use drought_engine::{
    AnalysisQuery, ArrayStack, DroughtAnalysisService, EngineConfig, GridIndex,
    LocationSelector, MemoryStackSource, Statistic,
};
use ndarray::Array2;
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, create_drying_stack, create_split_stack,
    create_test_stack, create_uniform_stack, fixtures, mask_cells, monthly_dates, months_of,
};

fn service_with(
    spec: GridSpec,
    source: MemoryStackSource,
    config: EngineConfig,
) -> DroughtAnalysisService<MemoryStackSource> {
    DroughtAnalysisService::new(GridIndex::new(spec).unwrap(), source, config).unwrap()
}

/// 4x4 grid with a drying SPI-3 record over two years.
fn drying_service() -> DroughtAnalysisService<MemoryStackSource> {
    let (data, times) = create_drying_stack(24, 4, 4);
    let source = MemoryStackSource::new()
        .with_stack(fixtures::indices::SPI_3, ArrayStack::new(data, times).unwrap());
    service_with(fixtures::grid::unit_4x4(), source, EngineConfig::default())
}

// ============================================================================
// Drought area queries
// ============================================================================

#[test]
fn test_drought_area_over_strip() {
    let (data, times) = create_split_stack(1, 10, 3, -2.5, 0.0);
    let source = MemoryStackSource::new().with_stack("pdsi", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::strip_10(), source, EngineConfig::default());

    let result = service
        .analyze(&AnalysisQuery::drought_area("pdsi", false))
        .unwrap();
    let drought = result.classification().unwrap();

    assert_eq!(result.selected_cells, 10);
    assert_eq!(result.times.len(), 1);
    assert_eq!(drought.family, "pdsi");
    assert!(!drought.percentile);
    assert_eq!(drought.fractions.rows[0], [0.0, 30.0, 0.0, 0.0, 0.0]);
    assert_eq!(drought.dsci.values, vec![60.0]);
}

#[test]
fn test_regional_drought_on_operational_grid() {
    // Three years of uniform moderate drought (D2 for SPI) over CONUS
    let (data, _) = create_uniform_stack(36, 120, 300, -1.5);
    let stack = ArrayStack::new(data, monthly_dates(2010, 7, 36)).unwrap();
    let source = MemoryStackSource::new().with_stack(fixtures::indices::SPI_3, stack);
    let service = service_with(fixtures::grid::conus(), source, EngineConfig::default());

    let bbox = drip_common::BoundingBox::from_lat_lon(
        fixtures::bbox::SOUTHERN_PLAINS.0,
        fixtures::bbox::SOUTHERN_PLAINS.1,
        fixtures::bbox::SOUTHERN_PLAINS.2,
        fixtures::bbox::SOUTHERN_PLAINS.3,
    );
    let query = AnalysisQuery::drought_area("spi3", false)
        .between(TimeRange::parse(fixtures::time::DROUGHT_2011_2012).unwrap())
        .over(LocationSelector::bbox(&bbox));
    let result = service.analyze(&query).unwrap();
    let drought = result.classification().unwrap();

    // Centres of rows 54..=95 and columns 94..=145 lie inside the box
    assert_eq!(result.selected_cells, 42 * 52);
    assert_eq!(result.times.len(), 24);
    assert!(drought.fractions.rows.iter().all(|row| *row == [0.0, 0.0, 100.0, 0.0, 0.0]));
    assert!(drought.dsci.values.iter().all(|v| *v == 300.0));

    let (lon, lat) = service.grid().cell_to_coord(54, 94).unwrap();
    assert_coords_approx_eq!((lon, lat), (-106.375, 36.375), 1e-9);
}

#[test]
fn test_selector_restricts_area() {
    let (data, times) = create_split_stack(1, 10, 3, -2.5, 0.0);
    let source = MemoryStackSource::new().with_stack("pdsi", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::strip_10(), source, EngineConfig::default());

    // Cells 2..=3: one dry, one wet
    let query = AnalysisQuery::drought_area("pdsi", false).over(LocationSelector::PointSet {
        rows: vec![0, 0],
        cols: vec![2, 3],
    });
    let result = service.analyze(&query).unwrap();

    assert_eq!(result.selected_cells, 2);
    assert_eq!(
        result.classification().unwrap().fractions.rows[0],
        [0.0, 50.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_window_and_months() {
    let service = drying_service();
    let query = AnalysisQuery::drought_area("spi3", true)
        .between(TimeRange::parse("2000-01/2000-12").unwrap())
        .in_months(MonthFilter::new(&fixtures::time::SUMMER).unwrap());

    let result = service.analyze(&query).unwrap();
    assert_eq!(months_of(&result.times), vec![6, 7, 8]);
    assert_eq!(result.classification().unwrap().fractions.len(), 3);
}

#[test]
fn test_empty_window_gives_empty_series() {
    let service = drying_service();
    let query = AnalysisQuery::drought_area("spi3", false)
        .between(TimeRange::parse("1990-01/1990-12").unwrap());

    let result = service.analyze(&query).unwrap();
    assert!(result.times.is_empty());
    assert!(result.classification().unwrap().dsci.values.is_empty());
}

#[test]
fn test_unknown_index_is_no_data() {
    let service = drying_service();
    let err = service
        .analyze(&AnalysisQuery::drought_area("spi6", false))
        .unwrap_err();
    assert!(matches!(err, DripError::NoData(_)));
}

#[test]
fn test_unknown_family_is_error() {
    let (data, times) = create_drying_stack(3, 4, 4);
    let source = MemoryStackSource::new().with_stack("ndvi", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::unit_4x4(), source, EngineConfig::default());

    let err = service
        .analyze(&AnalysisQuery::drought_area("ndvi", false))
        .unwrap_err();
    assert!(matches!(err, DripError::UnknownIndexFamily(_)));

    // Statistics do not need a threshold family
    assert!(service
        .analyze(&AnalysisQuery::statistic("ndvi", Statistic::Mean))
        .is_ok());
}

#[test]
fn test_stack_grid_mismatch() {
    let (data, times) = create_drying_stack(3, 2, 2);
    let source = MemoryStackSource::new().with_stack("spi3", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::unit_4x4(), source, EngineConfig::default());

    let err = service
        .analyze(&AnalysisQuery::drought_area("spi3", false))
        .unwrap_err();
    assert!(matches!(err, DripError::ShapeMismatch { .. }));
}

// ============================================================================
// Percentile mode
// ============================================================================

#[test]
fn test_percentiles_rank_against_full_record() {
    let service = drying_service();

    // The last year of a steadily drying record is its driest half, so
    // every percentile there is at most 50.
    let query = AnalysisQuery::drought_area("spi3", false)
        .between(TimeRange::parse("2001-01/2001-12").unwrap())
        .as_percentiles();
    let result = service.analyze(&query).unwrap();
    let drought = result.classification().unwrap();

    assert!(drought.percentile);
    assert_eq!(drought.fractions.len(), 12);
    // December 2001 is the minimum of every cell: 100 * 1/24 ≈ 4.2 -> D3
    assert_eq!(drought.fractions.rows[11], [0.0, 0.0, 0.0, 100.0, 0.0]);
    // January 2001 sits at 50 -> no drought
    assert_eq!(drought.fractions.rows[0], [0.0; 5]);
}

#[test]
fn test_percentile_statistic() {
    let service = drying_service();
    let query = AnalysisQuery::statistic("spi3", Statistic::Max).as_percentiles();
    let result = service.analyze(&query).unwrap();
    let series = result.statistic().unwrap();

    assert_eq!(series.statistic, Statistic::Max);
    assert_approx_eq!(series.values[0], 100.0, 1e-9);
    assert_approx_eq!(series.values[23], 100.0 / 24.0, 1e-9);
}

// ============================================================================
// Area statistics
// ============================================================================

#[test]
fn test_statistics_over_bbox() {
    let (data, times) = create_test_stack(2, 4, 4);
    let source = MemoryStackSource::new().with_stack("pdsi", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::unit_4x4(), source, EngineConfig::default());

    // Centres of rows 0-1, cols 0-1
    let selector = LocationSelector::BoundingBox {
        lat_min: 2.0,
        lat_max: 4.0,
        lon_min: 0.0,
        lon_max: 2.0,
    };
    let mean = service
        .analyze(&AnalysisQuery::statistic("pdsi", Statistic::Mean).over(selector.clone()))
        .unwrap();
    let min = service
        .analyze(&AnalysisQuery::statistic("pdsi", Statistic::Min).over(selector))
        .unwrap();

    assert_eq!(mean.selected_cells, 4);
    // Values 0, 1, 100, 101 at t = 0
    assert_approx_eq!(mean.statistic().unwrap().values[0], 50.5, 1e-9);
    assert_approx_eq!(min.statistic().unwrap().values[1], 10_000.0, 1e-9);
}

#[test]
fn test_statistic_ignores_no_data_cells() {
    let (mut data, times) = create_test_stack(1, 4, 4);
    mask_cells(&mut data, &[(0, 0)]);
    let source = MemoryStackSource::new().with_stack("pdsi", ArrayStack::new(data, times).unwrap());
    let service = service_with(fixtures::grid::unit_4x4(), source, EngineConfig::default());

    let query = AnalysisQuery::statistic("pdsi", Statistic::Min)
        .over(LocationSelector::Point { row: 0, col: 0 });
    let result = service.analyze(&query).unwrap();
    assert!(result.statistic().unwrap().values[0].is_nan());
}

// ============================================================================
// Result cache
// ============================================================================

#[test]
fn test_repeated_query_hits_cache() {
    let service = drying_service();
    let query = AnalysisQuery::drought_area("spi3", false);

    let first = service.analyze(&query).unwrap();
    let second = service.analyze(&query).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    let stats = service.cache_stats().unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_cache_hit_matches_recomputation() {
    let service = drying_service();
    let query = AnalysisQuery::drought_area("spi3", true).as_percentiles();

    let cached = service.analyze(&query).unwrap();
    service.clear_cache().unwrap();
    let fresh = service.analyze(&query).unwrap();

    assert!(!std::sync::Arc::ptr_eq(&cached, &fresh));
    assert_eq!(cached.times, fresh.times);
    assert_eq!(
        cached.classification().unwrap().fractions,
        fresh.classification().unwrap().fractions
    );
}

#[test]
fn test_cache_eviction_is_bounded() {
    let (data, times) = create_drying_stack(6, 4, 4);
    let source = MemoryStackSource::new().with_stack("spi3", ArrayStack::new(data, times).unwrap());
    let config = EngineConfig {
        result_cache_entries: 2,
        ..EngineConfig::default()
    };
    let service = service_with(fixtures::grid::unit_4x4(), source, config);

    for row in 0..4 {
        let query = AnalysisQuery::drought_area("spi3", false)
            .over(LocationSelector::Point { row, col: 0 });
        service.analyze(&query).unwrap();
    }

    let stats = service.cache_stats().unwrap();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.evictions, 2);
}

#[test]
fn test_disabled_cache_never_stores() {
    let service = service_with(
        fixtures::grid::unit_4x4(),
        {
            let (data, times) = create_drying_stack(3, 4, 4);
            MemoryStackSource::new().with_stack("spi3", ArrayStack::new(data, times).unwrap())
        },
        EngineConfig {
            cache_enabled: false,
            ..EngineConfig::default()
        },
    );

    let query = AnalysisQuery::drought_area("spi3", false);
    let first = service.analyze(&query).unwrap();
    let second = service.analyze(&query).unwrap();

    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(service.cache_stats().unwrap().entries, 0);
}

#[test]
fn test_invalid_config_rejected() {
    let config = EngineConfig {
        result_cache_entries: 0,
        ..EngineConfig::default()
    };
    let result = DroughtAnalysisService::new(
        GridIndex::new(fixtures::grid::unit_4x4()).unwrap(),
        MemoryStackSource::new(),
        config,
    );
    assert!(matches!(result, Err(DripError::ConfigError(_))));
}

// ============================================================================
// Correlation
// ============================================================================

#[test]
fn test_correlation_at_point() {
    let service = drying_service();
    let map = service
        .correlation_at("spi3", &TimeRange::unbounded(), 2.5, 1.5)
        .unwrap();

    assert_eq!(map.reference_cell, (2, 2));
    assert_eq!(map.times.len(), 24);
    assert_approx_eq!(map.field[[2, 2]], 1.0, 1e-12);
}

#[test]
fn test_correlation_at_outside_grid() {
    let service = drying_service();
    let err = service
        .correlation_at("spi3", &TimeRange::unbounded(), 10.0, 1.5)
        .unwrap_err();
    assert!(matches!(err, DripError::OutOfBounds { .. }));
}

#[test]
fn test_correlation_at_masked_cell_is_no_data() {
    let (data, times) = create_drying_stack(6, 4, 4);
    let source = MemoryStackSource::new().with_stack("spi3", ArrayStack::new(data, times).unwrap());
    let mut footprint = Array2::from_elem((4, 4), true);
    footprint[[0, 0]] = false;
    let grid = GridIndex::with_footprint(fixtures::grid::unit_4x4(), &footprint).unwrap();
    let service = DroughtAnalysisService::new(grid, source, EngineConfig::default()).unwrap();

    let err = service
        .correlation_at("spi3", &TimeRange::unbounded(), 0.5, 3.5)
        .unwrap_err();
    assert!(matches!(err, DripError::NoData(_)));
}

#[test]
fn test_correlation_field_reference_length() {
    let service = drying_service();
    let window = TimeRange::parse("2000-01/2000-03").unwrap();

    let field = service
        .correlation_field(&[3.0, 2.0, 1.0], "spi3", &window)
        .unwrap();
    assert_approx_eq!(field[[0, 0]], 1.0, 1e-12);

    let err = service
        .correlation_field(&[1.0, 2.0], "spi3", &window)
        .unwrap_err();
    assert!(matches!(err, DripError::ShapeMismatch { .. }));
}

#[test]
fn test_result_serializes_to_json() {
    let service = drying_service();
    let result = service
        .analyze(&AnalysisQuery::drought_area("spi3", false))
        .unwrap();

    let json = serde_json::to_value(result.as_ref()).unwrap();
    assert_eq!(json["index"], "spi3");
    assert_eq!(json["analysis"]["kind"], "drought");
    assert_eq!(json["analysis"]["family"], "sp");
    assert_eq!(json["times"][0], "2000-01-01");
}
