//! CSV export of analysis results.
//!
//! NaN is written as an empty field so that spreadsheets and pandas read it
//! back as missing.

use std::io::Write;

use chrono::NaiveDate;
use drip_common::{DripError, DripResult};
use ndarray::Array2;

use crate::grid_index::GridIndex;
use crate::types::{AnalysisResult, AreaAnalysis, ClassificationResult};

/// Header of the category fraction export.
pub const FRACTION_HEADER: [&str; 7] = ["date", "d0", "d1", "d2", "d3", "d4", "dsci"];

/// Write `date,d0,d1,d2,d3,d4,dsci`, one row per time step.
pub fn write_fraction_csv<W: Write>(
    writer: W,
    times: &[NaiveDate],
    result: &ClassificationResult,
) -> DripResult<()> {
    check_len(times.len(), result.fractions.len())?;
    check_len(times.len(), result.dsci.values.len())?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FRACTION_HEADER)?;

    for ((date, row), dsci) in times
        .iter()
        .zip(&result.fractions.rows)
        .zip(&result.dsci.values)
    {
        let mut record = Vec::with_capacity(FRACTION_HEADER.len());
        record.push(date.to_string());
        record.extend(row.iter().map(|v| format_value(*v)));
        record.push(format_value(*dsci));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write `date,value`, one row per time step.
pub fn write_series_csv<W: Write>(
    writer: W,
    times: &[NaiveDate],
    values: &[f64],
) -> DripResult<()> {
    check_len(times.len(), values.len())?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["date", "value"])?;
    for (date, value) in times.iter().zip(values) {
        csv.write_record([date.to_string(), format_value(*value)])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write whichever table fits the analysis.
pub fn write_result_csv<W: Write>(writer: W, result: &AnalysisResult) -> DripResult<()> {
    match &result.analysis {
        AreaAnalysis::Drought(classification) => {
            write_fraction_csv(writer, &result.times, classification)
        }
        AreaAnalysis::Statistic(series) => write_series_csv(writer, &result.times, &series.values),
    }
}

/// Write `grid_id,lon,lat,value` for every valid cell of a field.
pub fn write_field_csv<W: Write>(
    writer: W,
    grid: &GridIndex,
    field: &Array2<f64>,
) -> DripResult<()> {
    if field.dim() != grid.shape() {
        return Err(DripError::shape_mismatch(
            format!("{:?}", grid.shape()),
            format!("{:?}", field.dim()),
        ));
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["grid_id", "lon", "lat", "value"])?;

    for ((row, col), value) in field.indexed_iter() {
        let Ok(id) = grid.grid_id(row, col) else {
            continue;
        };
        let (lon, lat) = grid.cell_to_coord(row, col)?;
        csv.write_record([
            id.to_string(),
            lon.to_string(),
            lat.to_string(),
            format_value(*value),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn check_len(times: usize, values: usize) -> DripResult<()> {
    if times != values {
        return Err(DripError::shape_mismatch(
            format!("{} time steps", times),
            format!("{} rows", values),
        ));
    }
    Ok(())
}
