//! Weekly ARIMA forecast batch
//!
//! Reads weekly demand observations, forecasts next week for every entity
//! and writes the results table as CSV.

use chrono::{Local, NaiveDate};
use clap::Parser;
use demand_forecast::config::BatchConfig;
use demand_forecast::data::DataLoader;
use demand_forecast::prepare::week_start;
use demand_forecast::{logging, run_batch, ForecastError, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "forecast_batch", version, about = "Per-entity ARIMA order search and one-week forecast")]
struct Args {
    /// CSV file with entity, period and value columns
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML batch configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First day of the forecast week, YYYY-MM-DD (default: Monday of this week)
    #[arg(long, value_parser = parse_date)]
    forecast_start: Option<NaiveDate>,

    /// Also print the table as JSON
    #[arg(long)]
    json: bool,

    /// Do not write last_model_run back to the config file
    #[arg(long)]
    no_record_run: bool,
}

fn parse_date(text: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", text, e))
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };

    let forecast_start = args
        .forecast_start
        .unwrap_or_else(|| week_start(Local::now().date_naive()));

    if let Some(path) = logging::init(config.log_dir.as_deref(), forecast_start)? {
        eprintln!("Logging to {}", path.display());
    }

    info!(input = %args.input.display(), %forecast_start, "batch started");
    let observations = DataLoader::from_csv(&args.input, &config.columns)?;
    let table = run_batch(&observations, &config, forecast_start);

    match &args.output {
        Some(path) => table.write_csv(BufWriter::new(File::create(path)?))?,
        None => table.write_csv(io::stdout().lock())?,
    }

    if args.json {
        println!("{}", table.to_json()?);
    }

    if let (Some(path), false) = (&args.config, args.no_record_run) {
        config.record_run(path, forecast_start)?;
    }

    eprintln!(
        "Forecast {} entities for week of {} ({} skipped: no admissible order)",
        table.len(),
        forecast_start,
        table.skipped_count()
    );
    info!(forecasts = table.len(), skipped = table.skipped_count(), "batch finished");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "batch failed");
            eprintln!("Error: {}", err);
            match err {
                ForecastError::SchemaError(_) | ForecastError::ConfigError(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
