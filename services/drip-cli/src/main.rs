//! Drought index command-line tool.
//!
//! Loads index stacks from a JSON stack file and runs area drought
//! analyses or correlation maps against them, writing CSV or JSON.

mod commands;
mod stack_file;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use drought_engine::EngineConfig;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use commands::{Counting, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "drip")]
#[command(about = "Drought classification and areal aggregation")]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "DRIP_JSON_LOGS", global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Category fractions, DSCI or an area statistic over a region
    Analyze(AnalyzeArgs),
    /// Correlate every cell with the cell containing a point
    Correlate(CorrelateArgs),
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// JSON stack file
    #[arg(long, env = "DRIP_STACK")]
    stack: PathBuf,

    /// Index identifier (e.g. spi3, spei6, pdsi, eddi1)
    #[arg(short, long)]
    index: String,

    /// Bounding box as lat_min,lat_max,lon_min,lon_max
    #[arg(long, conflicts_with = "point")]
    bbox: Option<String>,

    /// Single location as lon,lat
    #[arg(long)]
    point: Option<String>,

    /// First date of the window (YYYY-MM or YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last date of the window (YYYY-MM or YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Months to keep, e.g. 6,7,8
    #[arg(long)]
    months: Option<String>,

    /// Category counting: exclusive bands or cumulative "at least this severe"
    #[arg(
        long,
        value_enum,
        required_unless_present = "statistic",
        conflicts_with = "statistic"
    )]
    counting: Option<Counting>,

    /// Reduce the area to mean, min or max instead of classifying
    #[arg(long)]
    statistic: Option<String>,

    /// Classify percentiles of each cell's record instead of raw values
    #[arg(long)]
    percentile: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct CorrelateArgs {
    /// JSON stack file
    #[arg(long, env = "DRIP_STACK")]
    stack: PathBuf,

    /// Index identifier
    #[arg(short, long)]
    index: String,

    /// Reference location as lon,lat
    #[arg(long)]
    point: String,

    #[arg(long)]
    start: Option<String>,

    #[arg(long)]
    end: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so results can be piped from stdout
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = EngineConfig::from_env();
    info!(
        parallel = config.parallel,
        cache_entries = config.result_cache_entries,
        "Starting drip"
    );

    match &cli.command {
        Command::Analyze(args) => commands::analyze(args, config),
        Command::Correlate(args) => commands::correlate(args, config),
    }
}
