//! Error types for the demand_forecast crate

use crate::order::ModelOrder;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input table does not honour the expected column contract
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error while loading or saving the batch configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error while serializing JSON output
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error while reading or writing YAML
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

/// Reasons a candidate order cannot be fitted to a series
///
/// These never escape the order search: each one marks a single
/// (entity, order) pair as inadmissible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Too few observations for the requested order
    #[error("{order} needs at least {needed} observations, got {got}")]
    InsufficientData {
        order: ModelOrder,
        needed: usize,
        got: usize,
    },

    /// Series has no variation left after differencing
    #[error("{order} leaves a constant series after differencing")]
    DegenerateSeries { order: ModelOrder },

    /// Coefficient search did not converge within its iteration budget
    #[error("{order} did not converge after {iterations} iterations")]
    NonConvergence { order: ModelOrder, iterations: usize },

    /// Coefficient search exceeded its wall-clock limit
    #[error("{order} exceeded the fit time limit")]
    Timeout { order: ModelOrder },

    /// Fit produced NaN or infinite values
    #[error("{order} produced non-finite estimates")]
    NonFinite { order: ModelOrder },
}

impl FitError {
    /// Order the failure belongs to
    pub fn order(&self) -> ModelOrder {
        match self {
            FitError::InsufficientData { order, .. }
            | FitError::DegenerateSeries { order }
            | FitError::NonConvergence { order, .. }
            | FitError::Timeout { order }
            | FitError::NonFinite { order } => *order,
        }
    }
}
