//! YAML configuration of a forecast batch

use crate::data::ColumnNames;
use crate::error::{ForecastError, Result};
use crate::evaluation::DEFAULT_TRAIN_FRACTION;
use crate::models::arima::{ArimaModel, FitOptions};
use crate::models::Z_95;
use crate::order::OrderGrid;
use crate::prepare::{SeriesPreparer, DEFAULT_MIN_HISTORY};
use crate::search::OrderSearch;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings of one forecast batch
///
/// Every field has a default, so an empty file or a file with only some
/// keys is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Candidate orders
    pub grid: OrderGrid,
    /// Entities with this many rows or fewer are not modelled
    pub min_history: usize,
    /// Share of each series used as the initial training prefix
    pub train_fraction: f64,
    /// Interval multiplier
    pub z_score: f64,
    /// Iteration budget of one fit
    pub max_iter: usize,
    /// Convergence tolerance of one fit
    pub tolerance: f64,
    /// Wall-clock limit of one fit in milliseconds
    pub fit_timeout_ms: Option<u64>,
    /// Reject fits that spend the iteration budget without converging
    pub require_convergence: bool,
    /// Insert zero demand for missing weeks
    pub fill_missing_weeks: bool,
    /// Input column names
    pub columns: ColumnNames,
    /// Directory for per-run log files
    pub log_dir: Option<PathBuf>,
    /// Forecast start of the last completed run
    pub last_model_run: Option<NaiveDate>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            grid: OrderGrid::default(),
            min_history: DEFAULT_MIN_HISTORY,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            z_score: Z_95,
            max_iter: fit.max_iter,
            tolerance: fit.tolerance,
            fit_timeout_ms: None,
            require_convergence: fit.require_convergence,
            fill_missing_weeks: false,
            columns: ColumnNames::default(),
            log_dir: None,
            last_model_run: None,
        }
    }
}

impl BatchConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;

        let config: BatchConfig = if text.trim().is_empty() {
            BatchConfig::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        config.validate()?;

        debug!(path = %path.display(), candidates = config.grid.len(), "loaded config");
        Ok(config)
    }

    /// Save the configuration as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Check that the settings describe a runnable batch
    pub fn validate(&self) -> Result<()> {
        if self.grid.is_empty() {
            return Err(ForecastError::ConfigError(
                "Order grid has no candidates".to_string(),
            ));
        }

        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }

        if !self.z_score.is_finite() || self.z_score <= 0.0 {
            return Err(ForecastError::ConfigError(format!(
                "z_score must be positive, got {}",
                self.z_score
            )));
        }

        if self.max_iter == 0 {
            return Err(ForecastError::ConfigError(
                "max_iter must be at least 1".to_string(),
            ));
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ForecastError::ConfigError(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        Ok(())
    }

    /// Remember `forecast_start` as the last run and write the file back
    pub fn record_run<P: AsRef<Path>>(&mut self, path: P, forecast_start: NaiveDate) -> Result<()> {
        self.last_model_run = Some(forecast_start);
        self.save(path)
    }

    /// Limits applied to every single fit
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            timeout: self.fit_timeout_ms.map(Duration::from_millis),
            require_convergence: self.require_convergence,
        }
    }

    /// Series preparer for a batch cut off at `forecast_start`
    pub fn preparer(&self, forecast_start: NaiveDate) -> SeriesPreparer {
        SeriesPreparer::new(forecast_start, self.min_history)
            .with_fill_missing_weeks(self.fill_missing_weeks)
    }

    /// ARIMA order search with the configured grid and limits
    pub fn order_search(&self) -> OrderSearch<ArimaModel> {
        OrderSearch::new(ArimaModel::with_options(self.fit_options()), self.grid.clone())
            .with_train_fraction(self.train_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_config(
            "min_history: 8\ncolumns:\n  entity: profile_name\nlast_model_run: 2018-02-26\n",
        );

        let config = BatchConfig::load(file.path()).unwrap();
        assert_eq!(config.min_history, 8);
        assert_eq!(config.columns.entity, "profile_name");
        assert_eq!(config.columns.period, "period");
        assert_eq!(config.grid, OrderGrid::default());
        assert_eq!(config.last_model_run, NaiveDate::from_ymd_opt(2018, 2, 26));
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = write_config("");
        assert_eq!(BatchConfig::load(file.path()).unwrap(), BatchConfig::default());
    }

    #[test]
    fn test_grid_ranges() {
        let file = write_config(
            "grid:\n  p_values: {start: 0, end: 2}\n  d_values: {start: 0, end: 1}\n  q_values: {start: 1, end: 3}\n",
        );

        let config = BatchConfig::load(file.path()).unwrap();
        assert_eq!(config.grid, OrderGrid::new(0..2, 0..1, 1..3));
        assert_eq!(config.order_search().grid().len(), 4);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = write_config("train_fraction: 1.5\n");
        assert!(matches!(
            BatchConfig::load(file.path()),
            Err(ForecastError::ConfigError(_))
        ));

        let empty_grid = BatchConfig {
            grid: OrderGrid::new(0..0, 0..2, 0..5),
            ..BatchConfig::default()
        };
        assert!(empty_grid.validate().is_err());
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let file = write_config("min_history: [1, 2\n");
        assert!(matches!(
            BatchConfig::load(file.path()),
            Err(ForecastError::YamlError(_))
        ));
    }

    #[test]
    fn test_record_run_writes_back() {
        let file = write_config("z_score: 2.0\n");
        let mut config = BatchConfig::load(file.path()).unwrap();
        let start = NaiveDate::from_ymd_opt(2018, 3, 5).unwrap();

        config.record_run(file.path(), start).unwrap();

        let reloaded = BatchConfig::load(file.path()).unwrap();
        assert_eq!(reloaded.last_model_run, Some(start));
        assert_eq!(reloaded.z_score, 2.0);
    }

    #[test]
    fn test_fit_options_timeout() {
        let config = BatchConfig {
            fit_timeout_ms: Some(250),
            ..BatchConfig::default()
        };
        assert_eq!(config.fit_options().timeout, Some(Duration::from_millis(250)));
        assert!(!config.fit_options().require_convergence);
    }
}
