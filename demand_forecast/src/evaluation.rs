//! Walk-forward evaluation of one candidate order
//!
//! The series is split into a training prefix and a test suffix. Each test
//! point is forecast from a model fitted on everything before it, then the
//! actual value is appended to the history (expanding window). The error
//! score is the mean squared error of those one-step forecasts.

use crate::error::FitError;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::order::ModelOrder;
use forecast_math::metrics::{forecast_accuracy, ForecastAccuracy};

/// Share of the series used as the initial training prefix
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.75;

/// Outcome of evaluating one admissible order on one series
#[derive(Debug)]
pub struct EvaluationResult<T> {
    /// Order that was evaluated
    order: ModelOrder,
    /// Accuracy of the walk-forward forecasts
    accuracy: ForecastAccuracy,
    /// One-step forecasts, one per test point
    forecasts: Vec<f64>,
    /// Model fitted on the whole series
    model: T,
}

impl<T> EvaluationResult<T> {
    /// Get the evaluated order
    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Mean squared error of the walk-forward forecasts
    pub fn error_score(&self) -> f64 {
        self.accuracy.mse
    }

    /// All accuracy metrics of the walk-forward forecasts
    pub fn accuracy(&self) -> ForecastAccuracy {
        self.accuracy
    }

    /// One-step forecasts made for the test points
    pub fn forecasts(&self) -> &[f64] {
        &self.forecasts
    }

    /// Model fitted on the whole series
    pub fn model(&self) -> &T {
        &self.model
    }

    /// Take ownership of the fitted model
    pub fn into_model(self) -> T {
        self.model
    }
}

/// Length of the training prefix for a series of `len` values
pub fn train_size(len: usize, train_fraction: f64) -> usize {
    ((len as f64) * train_fraction).floor() as usize
}

/// Split a series into training prefix and test suffix
pub fn train_test_split(series: &[f64], train_fraction: f64) -> (&[f64], &[f64]) {
    let split = train_size(series.len(), train_fraction).min(series.len());
    series.split_at(split)
}

/// Score `order` on `series` with expanding-window walk-forward validation
///
/// Fails if the test partition is empty or if any fit along the way fails.
pub fn evaluate_order<M: ForecastModel>(
    model: &M,
    series: &[f64],
    order: ModelOrder,
    train_fraction: f64,
) -> Result<EvaluationResult<M::Trained>, FitError> {
    let (train, test) = train_test_split(series, train_fraction);
    if test.is_empty() || train.is_empty() {
        return Err(FitError::InsufficientData {
            order,
            needed: 2,
            got: series.len(),
        });
    }

    let mut history = train.to_vec();
    let mut forecasts = Vec::with_capacity(test.len());

    for &actual in test {
        let trained = model.train(&history, order)?;
        let forecast = trained.one_step();
        if !forecast.is_finite() {
            return Err(FitError::NonFinite { order });
        }

        forecasts.push(forecast.prediction);
        history.push(actual);
    }

    // History now holds the whole series
    let final_model = model.train(&history, order)?;
    if !final_model.one_step().is_finite() {
        return Err(FitError::NonFinite { order });
    }

    let accuracy =
        forecast_accuracy(&forecasts, test).map_err(|_| FitError::NonFinite { order })?;
    if !accuracy.mse.is_finite() {
        return Err(FitError::NonFinite { order });
    }

    Ok(EvaluationResult {
        order,
        accuracy,
        forecasts,
        model: final_model,
    })
}
