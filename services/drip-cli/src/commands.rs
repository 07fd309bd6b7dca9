//! Subcommand handlers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use drip_common::{parse_date, BoundingBox, MonthFilter, TimeRange};
use drought_engine::{
    write_field_csv, write_result_csv, AnalysisQuery, DroughtAnalysisService, EngineConfig,
    LocationSelector, Statistic,
};
use tracing::info;

use crate::stack_file::StackFile;
use crate::{AnalyzeArgs, CorrelateArgs};

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// How drought categories are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Counting {
    /// Each cell counts toward its single most severe category
    Exclusive,
    /// Each cell counts toward every category it meets
    Inclusive,
}

pub fn analyze(args: &AnalyzeArgs, config: EngineConfig) -> Result<()> {
    let service = load_service(&args.stack, config)?;

    let mut query = match (&args.statistic, args.counting) {
        (Some(name), None) => {
            let statistic = Statistic::from_str(name)
                .ok_or_else(|| anyhow!("Unknown statistic '{}' (mean, min, max)", name))?;
            AnalysisQuery::statistic(&args.index, statistic)
        }
        (None, Some(counting)) => {
            AnalysisQuery::drought_area(&args.index, counting == Counting::Inclusive)
        }
        (Some(_), Some(_)) => bail!("--counting and --statistic are mutually exclusive"),
        (None, None) => bail!("Either --counting or --statistic is required"),
    };

    query = query.between(parse_window(args.start.as_deref(), args.end.as_deref())?);

    if let Some(months) = &args.months {
        query = query.in_months(MonthFilter::parse(months)?);
    }

    if let Some(bbox) = &args.bbox {
        query = query.over(LocationSelector::bbox(&BoundingBox::from_lat_lon_string(bbox)?));
    } else if let Some(point) = &args.point {
        let (lon, lat) = parse_point(point)?;
        query = query.over(LocationSelector::point_at(service.grid(), lon, lat)?);
    }

    if args.percentile {
        query = query.as_percentiles();
    }

    let result = service.analyze(&query)?;
    info!(
        index = %result.index,
        steps = result.times.len(),
        selected_cells = result.selected_cells,
        "Analysis complete"
    );

    let mut out = open_output(args.output.as_deref())?;
    match args.format {
        OutputFormat::Csv => write_result_csv(&mut out, &result)?,
        OutputFormat::Json => write_json(&mut out, result.as_ref())?,
    }
    out.flush()?;
    Ok(())
}

pub fn correlate(args: &CorrelateArgs, config: EngineConfig) -> Result<()> {
    let service = load_service(&args.stack, config)?;
    let (lon, lat) = parse_point(&args.point)?;
    let window = parse_window(args.start.as_deref(), args.end.as_deref())?;

    let map = service.correlation_at(&args.index, &window, lon, lat)?;
    info!(
        index = %map.index,
        row = map.reference_cell.0,
        col = map.reference_cell.1,
        steps = map.times.len(),
        "Correlation complete"
    );

    let mut out = open_output(args.output.as_deref())?;
    match args.format {
        OutputFormat::Csv => write_field_csv(&mut out, service.grid(), &map.field)?,
        OutputFormat::Json => write_json(&mut out, &map)?,
    }
    out.flush()?;
    Ok(())
}

fn load_service(
    path: &Path,
    config: EngineConfig,
) -> Result<DroughtAnalysisService<drought_engine::MemoryStackSource>> {
    let loaded = StackFile::read(path)?.into_engine()?;
    info!(
        path = %path.display(),
        rows = loaded.grid.shape().0,
        cols = loaded.grid.shape().1,
        valid_cells = loaded.grid.valid_count(),
        "Loaded stack file"
    );
    Ok(DroughtAnalysisService::new(
        loaded.grid,
        loaded.source,
        config,
    )?)
}

fn parse_window(start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
    let start = start.map(parse_date).transpose()?;
    let end = end.map(parse_date).transpose()?;
    Ok(TimeRange::from_bounds(start, end)?)
}

/// Parse `"lon,lat"`.
pub fn parse_point(s: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        bail!("Expected 'lon,lat', got '{}'", s);
    }

    let lon: f64 = parts[0]
        .parse()
        .with_context(|| format!("Invalid longitude '{}'", parts[0]))?;
    let lat: f64 = parts[1]
        .parse()
        .with_context(|| format!("Invalid latitude '{}'", parts[1]))?;
    Ok((lon, lat))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
