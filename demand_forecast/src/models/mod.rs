//! Forecasting models for weekly demand series

use crate::error::FitError;
use crate::order::ModelOrder;
use std::fmt::Debug;

pub mod arima;

/// Multiplier for a 95% normal-approximation interval
pub const Z_95: f64 = 1.96;

/// Forecast result containing predicted values and their standard errors
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Standard error of each forecasted value
    std_errors: Vec<f64>,
}

impl ForecastResult {
    /// Create a new forecast result
    ///
    /// Returns `None` if the two vectors differ in length.
    pub fn new(values: Vec<f64>, std_errors: Vec<f64>) -> Option<Self> {
        if values.len() != std_errors.len() {
            return None;
        }

        Some(Self { values, std_errors })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the standard errors
    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }

    /// Symmetric intervals `value ± z * std_error`
    pub fn confidence_intervals(&self, z_score: f64) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .zip(self.std_errors.iter())
            .map(|(v, se)| (v - z_score * se, v + z_score * se))
            .collect()
    }
}

/// Point forecast one period ahead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneStepForecast {
    /// Predicted value
    pub prediction: f64,
    /// Standard error of the prediction
    pub std_error: f64,
}

impl OneStepForecast {
    /// Lower and upper interval bounds for the given multiplier
    pub fn bounds(&self, z_score: f64) -> (f64, f64) {
        (
            self.prediction - z_score * self.std_error,
            self.prediction + z_score * self.std_error,
        )
    }

    /// Whether both numbers are usable
    pub fn is_finite(&self) -> bool {
        self.prediction.is_finite() && self.std_error.is_finite()
    }
}

/// Model fitted to one history with one order
pub trait TrainedForecastModel: Debug + Send {
    /// Forecast the next `horizons` periods
    fn forecast(&self, horizons: usize) -> ForecastResult;

    /// Forecast the next period
    fn one_step(&self) -> OneStepForecast {
        let forecast = self.forecast(1);
        OneStepForecast {
            prediction: forecast.values().first().copied().unwrap_or(f64::NAN),
            std_error: forecast.std_errors().first().copied().unwrap_or(f64::NAN),
        }
    }

    /// Order the model was fitted with
    fn order(&self) -> ModelOrder;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Fitting routine: a pure function from (history, order) to a fitted model
pub trait ForecastModel: Debug + Clone + Send + Sync {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit the model of `order` to `history`
    fn train(&self, history: &[f64], order: ModelOrder) -> Result<Self::Trained, FitError>;

    /// Get the name of the model family
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_forecast_result_lengths() {
        assert!(ForecastResult::new(vec![1.0, 2.0], vec![0.5]).is_none());

        let result = ForecastResult::new(vec![1.0, 2.0], vec![0.5, 0.7]).unwrap();
        assert_eq!(result.horizons(), 2);
    }

    #[test]
    fn test_confidence_intervals() {
        let result = ForecastResult::new(vec![100.0], vec![2.0]).unwrap();
        let intervals = result.confidence_intervals(Z_95);

        assert_approx_eq!(intervals[0].0, 96.08);
        assert_approx_eq!(intervals[0].1, 103.92);
    }

    #[test]
    fn test_one_step_bounds() {
        let forecast = OneStepForecast {
            prediction: 10.0,
            std_error: 1.0,
        };
        let (lower, upper) = forecast.bounds(Z_95);

        assert_approx_eq!(lower, 8.04);
        assert_approx_eq!(upper, 11.96);
        assert!(forecast.is_finite());
    }
}
