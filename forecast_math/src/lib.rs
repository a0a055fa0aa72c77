//! # Forecast Math
//!
//! Numerical building blocks for ARIMA order search.
//! This crate provides differencing and integration of series, descriptive
//! statistics and forecast error metrics, and a bounded Nelder-Mead
//! minimiser with iteration and wall-clock budgets.

use thiserror::Error;

pub mod differencing;
pub mod metrics;
pub mod optimization;
pub mod statistics;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
