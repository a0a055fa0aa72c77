//! Subscriber setup for the batch binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary. `RUST_LOG` overrides the default `info` level.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file of the run starting at `forecast_start`
pub fn log_file_path(log_dir: &Path, forecast_start: NaiveDate) -> PathBuf {
    log_dir.join(format!("arima_{}.log", forecast_start.format("%Y-%m-%d")))
}

/// Install the global subscriber
///
/// With a log directory, events go to `arima_<forecast_start>.log` inside it
/// and the file path is returned. Otherwise they go to stderr.
pub fn init(log_dir: Option<&Path>, forecast_start: NaiveDate) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = log_file_path(dir, forecast_start);
            let file = File::create(&path)?;

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .map_err(|e| ForecastError::ConfigError(format!("Logging setup failed: {}", e)))?;

            Ok(Some(path))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| ForecastError::ConfigError(format!("Logging setup failed: {}", e)))?;

            Ok(None)
        }
    }
}
