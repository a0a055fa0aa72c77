//! ARIMA models for weekly demand series
//!
//! Coefficients are estimated by minimising the conditional sum of squares
//! (CSS) of the `d`-times differenced series with a bounded Nelder-Mead
//! search. AR and MA coefficients are kept inside `(-0.99, 0.99)`.

use crate::error::FitError;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::order::ModelOrder;
use forecast_math::differencing::{difference, integrate, integration_anchors};
use forecast_math::optimization::{nelder_mead, NelderMeadConfig, Termination};
use forecast_math::statistics::{all_finite, mean, variance};
use std::time::Duration;
use tracing::debug;

/// Coefficient bound keeping AR/MA terms away from the unit circle
const COEFFICIENT_BOUND: f64 = 0.99;

/// Variance under which a differenced series counts as constant
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Limits applied to every single fit
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Nelder-Mead iteration budget
    pub max_iter: usize,
    /// Relative convergence tolerance
    pub tolerance: f64,
    /// Wall-clock limit for one fit
    pub timeout: Option<Duration>,
    /// Reject fits that exhaust `max_iter` before meeting `tolerance`
    ///
    /// When off, the best simplex vertex is kept as long as its CSS is
    /// finite.
    pub require_convergence: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-8,
            timeout: None,
            require_convergence: false,
        }
    }
}

/// ARIMA model family (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone, Default)]
pub struct ArimaModel {
    /// Limits for each fit
    options: FitOptions,
}

/// ARIMA model fitted to one history
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model, e.g. `ARIMA(1, 1, 0)`
    name: String,
    /// Order the model was fitted with
    order: ModelOrder,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series
    intercept: f64,
    /// Differenced history
    differenced: Vec<f64>,
    /// In-sample residuals on the differenced scale
    residuals: Vec<f64>,
    /// Last value of each differencing level, for integration
    anchors: Vec<f64>,
    /// Residual variance
    sigma2: f64,
    /// Akaike information criterion
    aic: f64,
    /// Bayesian information criterion
    bic: f64,
    /// Number of observations the model was fitted on
    n_obs: usize,
}

impl ArimaModel {
    /// Create a new ARIMA model family with default fit limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new ARIMA model family with custom fit limits
    pub fn with_options(options: FitOptions) -> Self {
        Self { options }
    }

    /// Fit limits in use
    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Minimum history length an order can be fitted on
    pub fn min_observations(order: ModelOrder) -> usize {
        order.d + order.p.max(order.q) + 2
    }

    /// Conditional sum of squares and residuals for the given parameters
    fn css(series: &[f64], p: usize, q: usize, params: &[f64]) -> (f64, Vec<f64>) {
        let intercept = params[0];
        let ar = &params[1..1 + p];
        let ma = &params[1 + p..1 + p + q];
        let start = p.max(q);

        let mut residuals = vec![0.0; series.len()];
        let mut css = 0.0;

        for t in start..series.len() {
            let mut pred = intercept;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (series[t - 1 - i] - intercept);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * residuals[t - 1 - i];
            }

            let error = series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        (css, residuals)
    }

    /// Estimate `[intercept, ar..., ma...]` on the differenced series
    fn estimate(&self, series: &[f64], order: ModelOrder) -> Result<Vec<f64>, FitError> {
        let p = order.p;
        let q = order.q;
        let series_mean = mean(series).map_err(|_| FitError::InsufficientData {
            order,
            needed: Self::min_observations(order),
            got: series.len(),
        })?;

        // Pure mean model needs no search
        if p == 0 && q == 0 {
            return Ok(vec![series_mean]);
        }

        let mut initial = vec![0.0; order.num_params()];
        initial[0] = series_mean;
        for i in 0..p {
            initial[1 + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            initial[1 + p + i] = 0.1 / (i + 1) as f64;
        }

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(p + q));

        let config = NelderMeadConfig {
            max_iter: self.options.max_iter,
            tolerance: self.options.tolerance,
            time_limit: self.options.timeout,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (css, _) = Self::css(series, p, q, params);
                if css.is_finite() {
                    css
                } else {
                    f64::MAX
                }
            },
            &initial,
            Some(&bounds),
            &config,
        );

        match result.termination {
            Termination::Converged => Ok(result.optimal_point),
            Termination::TimedOut => Err(FitError::Timeout { order }),
            Termination::MaxIterations
                if !self.options.require_convergence && result.optimal_value < f64::MAX =>
            {
                debug!(%order, css = result.optimal_value, "iteration budget spent, keeping best vertex");
                Ok(result.optimal_point)
            }
            Termination::MaxIterations => Err(FitError::NonConvergence {
                order,
                iterations: result.iterations,
            }),
        }
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, history: &[f64], order: ModelOrder) -> Result<TrainedArimaModel, FitError> {
        let needed = Self::min_observations(order);
        if history.len() < needed {
            return Err(FitError::InsufficientData {
                order,
                needed,
                got: history.len(),
            });
        }
        if !all_finite(history) {
            return Err(FitError::NonFinite { order });
        }

        let insufficient = |_| FitError::InsufficientData {
            order,
            needed,
            got: history.len(),
        };
        let differenced = difference(history, order.d).map_err(insufficient)?;
        let anchors = integration_anchors(history, order.d).map_err(insufficient)?;

        let spread = variance(&differenced).map_err(insufficient)?;
        if spread <= DEGENERATE_VARIANCE {
            return Err(FitError::DegenerateSeries { order });
        }

        let params = self.estimate(&differenced, order)?;
        let (css, residuals) = Self::css(&differenced, order.p, order.q, &params);

        // At least two residuals remain by the minimum-length check
        let n_eff = (differenced.len() - order.p.max(order.q)) as f64;
        let sigma2 = css / n_eff;
        if !all_finite(&params) || !sigma2.is_finite() {
            return Err(FitError::NonFinite { order });
        }

        let k = order.num_params() as f64;
        let log_likelihood = if sigma2 > 0.0 {
            -0.5 * n_eff * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln())
        } else {
            f64::INFINITY
        };

        Ok(TrainedArimaModel {
            name: format!("ARIMA{}", order),
            order,
            intercept: params[0],
            ar_coefficients: params[1..1 + order.p].to_vec(),
            ma_coefficients: params[1 + order.p..].to_vec(),
            differenced,
            residuals,
            anchors,
            sigma2,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n_eff.ln(),
            n_obs: history.len(),
        })
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

impl TrainedArimaModel {
    /// Get AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept (mean of the differenced series)
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get the residual variance
    pub fn residual_variance(&self) -> f64 {
        self.sigma2
    }

    /// Get the in-sample residuals on the differenced scale
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Get AIC
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Get BIC
    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Number of observations the model was fitted on
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// ψ-weights of the integrated process, `psi[0] == 1`
    ///
    /// The AR polynomial is multiplied by `(1 - B)^d` so that the weights
    /// describe forecast error growth on the original scale.
    fn psi_weights(&self, horizons: usize) -> Vec<f64> {
        // Coefficients of 1 - phi_1 B - ... - phi_p B^p
        let mut polynomial: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar_coefficients.iter().map(|phi| -phi))
            .collect();
        for _ in 0..self.order.d {
            let mut next = vec![0.0; polynomial.len() + 1];
            for (k, c) in polynomial.iter().enumerate() {
                next[k] += c;
                next[k + 1] -= c;
            }
            polynomial = next;
        }
        let phi: Vec<f64> = polynomial[1..].iter().map(|c| -c).collect();

        let mut psi = vec![1.0; horizons.max(1)];
        for j in 1..psi.len() {
            let mut weight = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for i in 1..=j.min(phi.len()) {
                weight += phi[i - 1] * psi[j - i];
            }
            psi[j] = weight;
        }
        psi.truncate(horizons);
        psi
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizons: usize) -> ForecastResult {
        let p = self.order.p;
        let q = self.order.q;

        let mut extended = self.differenced.clone();
        let mut residuals = self.residuals.clone();

        for _ in 0..horizons {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate().take(p) {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate().take(q) {
                if t > i {
                    pred += theta * residuals[t - 1 - i];
                }
            }

            extended.push(pred);
            // Future shocks have zero expectation
            residuals.push(0.0);
        }

        let values = integrate(&extended[self.differenced.len()..], &self.anchors);

        let mut cumulative = 0.0;
        let std_errors = self
            .psi_weights(horizons)
            .iter()
            .map(|psi| {
                cumulative += psi * psi;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        ForecastResult { values, std_errors }
    }

    fn order(&self) -> ModelOrder {
        self.order
    }

    fn name(&self) -> &str {
        &self.name
    }
}
