//! Bounded Nelder-Mead simplex minimisation
//!
//! Used to estimate ARIMA coefficients by minimising the conditional sum of
//! squares. Every run is bounded by an iteration budget and, optionally, a
//! wall-clock limit, so a pathological objective can never stall a batch.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Configuration for a Nelder-Mead run
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values in the simplex
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Initial simplex step size
    pub initial_step: f64,
    /// Wall-clock limit for the whole run
    pub time_limit: Option<Duration>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            time_limit: None,
        }
    }
}

/// Why a Nelder-Mead run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Simplex collapsed or objective spread fell under tolerance
    Converged,
    /// Iteration budget spent
    MaxIterations,
    /// Wall-clock limit hit
    TimedOut,
}

/// Result of a Nelder-Mead run
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point
    pub optimal_value: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// Why the run stopped
    pub termination: Termination,
}

impl NelderMeadResult {
    /// Whether the run met the convergence tolerance
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Minimise `objective` starting from `initial`
///
/// `bounds` clamps each coordinate to `(min, max)` after every simplex move.
///
/// # Example
///
/// ```
/// use forecast_math::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged());
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let start = Instant::now();

    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: objective(&[]),
            iterations: 0,
            termination: Termination::Converged,
        };
    }

    // Initial simplex: the start point plus one step along each axis
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(apply_bounds(initial, bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(apply_bounds(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();
    let mut iterations = 0;
    let mut termination = Termination::MaxIterations;

    while iterations < config.max_iter {
        if let Some(limit) = config.time_limit {
            if start.elapsed() >= limit {
                termination = Termination::TimedOut;
                break;
            }
        }
        iterations += 1;

        let mut indices: Vec<usize> = (0..=n).collect();
        indices.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

        let best_idx = indices[0];
        let worst_idx = indices[n];
        let second_worst_idx = indices[n - 1];

        let spread = values[worst_idx] - values[best_idx];
        if spread <= config.tolerance * (1.0 + values[best_idx].abs()) {
            termination = Termination::Converged;
            break;
        }

        let centroid = compute_centroid(&simplex, worst_idx);
        let max_dist = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if max_dist < config.tolerance {
            termination = Termination::Converged;
            break;
        }

        // Reflection
        let reflected = apply_bounds(&reflect(&simplex[worst_idx], &centroid, config.alpha), bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst_idx] && reflected_value >= values[best_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
            continue;
        }

        // Expansion
        if reflected_value < values[best_idx] {
            let expanded = apply_bounds(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = objective(&expanded);

            if expanded_value < reflected_value {
                simplex[worst_idx] = expanded;
                values[worst_idx] = expanded_value;
            } else {
                simplex[worst_idx] = reflected;
                values[worst_idx] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside depending on the reflected value
        if reflected_value < values[worst_idx] {
            let contracted = apply_bounds(&towards(&centroid, &reflected, config.rho), bounds);
            let contracted_value = objective(&contracted);
            if contracted_value <= reflected_value {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        } else {
            let contracted =
                apply_bounds(&towards(&centroid, &simplex[worst_idx], config.rho), bounds);
            let contracted_value = objective(&contracted);
            if contracted_value < values[worst_idx] {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        }

        // Shrink towards the best vertex
        let best = simplex[best_idx].clone();
        for i in 0..=n {
            if i != best_idx {
                let shrunk: Vec<f64> = best
                    .iter()
                    .zip(simplex[i].iter())
                    .map(|(b, x)| b + config.sigma * (x - b))
                    .collect();
                simplex[i] = apply_bounds(&shrunk, bounds);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best_idx = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value: values[best_idx],
        iterations,
        termination,
    }
}

/// Centroid of the simplex excluding one vertex
fn compute_centroid(simplex: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];

    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude_idx {
            for (c, v) in centroid.iter_mut().zip(vertex.iter()) {
                *c += v;
            }
        }
    }

    centroid.iter().map(|c| c / count).collect()
}

/// Reflect a point through the centroid
fn reflect(point: &[f64], centroid: &[f64], alpha: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + alpha * (c - p))
        .collect()
}

/// Move from the centroid towards `point` by `factor`
fn towards(centroid: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + factor * (p - c))
        .collect()
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
