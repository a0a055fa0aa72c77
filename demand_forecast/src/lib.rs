//! # Demand Forecast
//!
//! Weekly demand forecasting for many products at once. For every entity the
//! crate searches a grid of ARIMA(p, d, q) orders, scores each candidate with
//! expanding-window walk-forward validation and forecasts the next week with
//! the best one.
//!
//! ## Features
//!
//! - Observation loading from CSV or polars DataFrames
//! - Series preparation (cutoff, minimum history, duplicate collapse)
//! - CSS-estimated ARIMA models with standard errors
//! - Walk-forward evaluation and deterministic parallel order search
//! - Results table with 95% intervals, exportable as CSV, JSON or DataFrame
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::config::BatchConfig;
//! use demand_forecast::data::{ColumnNames, DataLoader};
//! use demand_forecast::prepare::week_start;
//!
//! # fn main() -> demand_forecast::Result<()> {
//! let config = BatchConfig::default();
//! let observations = DataLoader::from_csv("weekly_demand.csv", &ColumnNames::default())?;
//!
//! let forecast_start = week_start(chrono::Local::now().date_naive());
//! let table = demand_forecast::run_batch(&observations, &config, forecast_start);
//!
//! for record in table.records() {
//!     println!("{} {} {:.2}", record.entity_id, record.best_order, record.prediction);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod models;
pub mod order;
pub mod prepare;
pub mod search;
pub mod table;

// Re-export commonly used types
pub use crate::aggregate::{run_batch, ForecastAggregator};
pub use crate::config::BatchConfig;
pub use crate::data::{ColumnNames, DataLoader, Observation};
pub use crate::error::{FitError, ForecastError, Result};
pub use crate::models::arima::ArimaModel;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::order::{ModelOrder, OrderGrid};
pub use crate::prepare::{EntitySeries, SeriesPreparer};
pub use crate::search::{OrderSearch, SearchOutcome};
pub use crate::table::{ForecastRecord, ForecastTable};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
