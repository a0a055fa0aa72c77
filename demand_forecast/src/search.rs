//! Exhaustive grid search over model orders

use crate::error::FitError;
use crate::evaluation::{evaluate_order, EvaluationResult, DEFAULT_TRAIN_FRACTION};
use crate::models::ForecastModel;
use crate::order::{ModelOrder, OrderGrid};
use rayon::prelude::*;
use tracing::debug;

/// Result of evaluating a single candidate order
#[derive(Debug)]
pub enum CandidateOutcome<T> {
    /// Order was fitted at every walk-forward step
    Admissible(EvaluationResult<T>),
    /// Order could not be fitted to this series
    Inadmissible(FitError),
}

impl<T> CandidateOutcome<T> {
    /// Order this outcome belongs to
    pub fn order(&self) -> ModelOrder {
        match self {
            CandidateOutcome::Admissible(result) => result.order(),
            CandidateOutcome::Inadmissible(err) => err.order(),
        }
    }
}

/// Result of searching the whole grid for one series
#[derive(Debug)]
pub enum SearchOutcome<T> {
    /// Lowest-error admissible order
    Best {
        /// Evaluation of the winning order
        result: EvaluationResult<T>,
        /// Number of candidates evaluated
        tried: usize,
        /// Candidates that could not be fitted
        failures: Vec<FitError>,
    },
    /// Every candidate failed
    NoAdmissibleOrder {
        /// Number of candidates evaluated
        tried: usize,
        /// Why each candidate failed
        failures: Vec<FitError>,
    },
}

impl<T> SearchOutcome<T> {
    /// Winning evaluation, if any order was admissible
    pub fn best(&self) -> Option<&EvaluationResult<T>> {
        match self {
            SearchOutcome::Best { result, .. } => Some(result),
            SearchOutcome::NoAdmissibleOrder { .. } => None,
        }
    }

    /// Number of candidates evaluated
    pub fn tried(&self) -> usize {
        match self {
            SearchOutcome::Best { tried, .. } | SearchOutcome::NoAdmissibleOrder { tried, .. } => {
                *tried
            }
        }
    }

    /// Candidates that could not be fitted
    pub fn failures(&self) -> &[FitError] {
        match self {
            SearchOutcome::Best { failures, .. }
            | SearchOutcome::NoAdmissibleOrder { failures, .. } => failures,
        }
    }
}

/// Grid search of one model family over a grid of orders
#[derive(Debug, Clone)]
pub struct OrderSearch<M> {
    /// Fitting routine
    model: M,
    /// Candidate orders
    grid: OrderGrid,
    /// Share of each series used as the initial training prefix
    train_fraction: f64,
    /// Evaluate candidates on the rayon thread pool
    parallel: bool,
}

impl<M: ForecastModel> OrderSearch<M> {
    /// Create a new search over `grid`
    pub fn new(model: M, grid: OrderGrid) -> Self {
        Self {
            model,
            grid,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            parallel: true,
        }
    }

    /// Set the training fraction used for walk-forward validation
    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    /// Enable or disable parallel candidate evaluation
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Get the candidate grid
    pub fn grid(&self) -> &OrderGrid {
        &self.grid
    }

    /// Get the fitting routine
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Evaluate a single candidate
    pub fn evaluate(&self, series: &[f64], order: ModelOrder) -> CandidateOutcome<M::Trained> {
        match evaluate_order(&self.model, series, order, self.train_fraction) {
            Ok(result) => {
                debug!(%order, error_score = result.error_score(), "candidate evaluated");
                CandidateOutcome::Admissible(result)
            }
            Err(err) => {
                debug!(%order, reason = %err, "candidate inadmissible");
                CandidateOutcome::Inadmissible(err)
            }
        }
    }

    /// Evaluate every candidate, returned in grid enumeration order
    pub fn evaluate_all(&self, series: &[f64]) -> Vec<CandidateOutcome<M::Trained>> {
        let orders = self.grid.orders();
        if self.parallel {
            orders
                .par_iter()
                .map(|&order| self.evaluate(series, order))
                .collect()
        } else {
            orders
                .iter()
                .map(|&order| self.evaluate(series, order))
                .collect()
        }
    }

    /// Search the grid and keep the lowest-error order
    pub fn run(&self, series: &[f64]) -> SearchOutcome<M::Trained> {
        select_best(self.evaluate_all(series))
    }
}

/// Reduce candidate outcomes to the best one
///
/// Outcomes must be in grid enumeration order: only a strictly lower error
/// replaces the current best, so ties keep the earlier candidate.
pub fn select_best<T>(outcomes: Vec<CandidateOutcome<T>>) -> SearchOutcome<T> {
    let tried = outcomes.len();
    let mut best: Option<EvaluationResult<T>> = None;
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            CandidateOutcome::Admissible(result) => {
                let improves = match &best {
                    Some(current) => result.error_score() < current.error_score(),
                    None => true,
                };
                if improves {
                    best = Some(result);
                }
            }
            CandidateOutcome::Inadmissible(err) => failures.push(err),
        }
    }

    match best {
        Some(result) => SearchOutcome::Best {
            result,
            tried,
            failures,
        },
        None => SearchOutcome::NoAdmissibleOrder { tried, failures },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::ArimaModel;
    use crate::models::{ForecastResult, TrainedForecastModel};

    /// Error depends only on the order through a lookup table
    #[derive(Debug, Clone)]
    struct ScriptedModel {
        failing: Vec<ModelOrder>,
        offsets: Vec<(ModelOrder, f64)>,
    }

    #[derive(Debug)]
    struct ScriptedTrained {
        order: ModelOrder,
        prediction: f64,
    }

    impl TrainedForecastModel for ScriptedTrained {
        fn forecast(&self, horizons: usize) -> ForecastResult {
            ForecastResult::new(vec![self.prediction; horizons], vec![1.0; horizons]).unwrap()
        }

        fn order(&self) -> ModelOrder {
            self.order
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    impl ForecastModel for ScriptedModel {
        type Trained = ScriptedTrained;

        fn train(&self, _history: &[f64], order: ModelOrder) -> Result<ScriptedTrained, FitError> {
            if self.failing.contains(&order) {
                return Err(FitError::DegenerateSeries { order });
            }
            let offset = self
                .offsets
                .iter()
                .find(|(o, _)| *o == order)
                .map(|(_, offset)| *offset)
                .unwrap_or(10.0);
            Ok(ScriptedTrained {
                order,
                prediction: offset,
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn series() -> Vec<f64> {
        vec![0.0; 8]
    }

    #[test]
    fn test_lowest_error_wins() {
        let model = ScriptedModel {
            failing: vec![],
            offsets: vec![(ModelOrder::new(1, 0, 1), 0.5), (ModelOrder::new(0, 1, 0), 2.0)],
        };
        let outcome = OrderSearch::new(model, OrderGrid::new(0..2, 0..2, 0..2)).run(&series());

        let best = outcome.best().unwrap();
        assert_eq!(best.order(), ModelOrder::new(1, 0, 1));
        assert_eq!(best.error_score(), 0.25);
        assert_eq!(outcome.tried(), 8);
        assert!(outcome.failures().is_empty());
    }

    #[test]
    fn test_ties_keep_first_enumerated() {
        let model = ScriptedModel {
            failing: vec![],
            offsets: vec![(ModelOrder::new(0, 1, 1), 1.0), (ModelOrder::new(1, 0, 0), 1.0)],
        };
        let outcome = OrderSearch::new(model, OrderGrid::new(0..2, 0..2, 0..2)).run(&series());

        assert_eq!(outcome.best().unwrap().order(), ModelOrder::new(0, 1, 1));
    }

    #[test]
    fn test_failures_are_skipped() {
        let model = ScriptedModel {
            failing: vec![ModelOrder::new(0, 0, 0), ModelOrder::new(0, 0, 1)],
            offsets: vec![(ModelOrder::new(0, 0, 0), 0.0)],
        };
        let outcome = OrderSearch::new(model, OrderGrid::new(0..1, 0..1, 0..3)).run(&series());

        assert_eq!(outcome.best().unwrap().order(), ModelOrder::new(0, 0, 2));
        assert_eq!(outcome.failures().len(), 2);
        assert_eq!(outcome.failures()[0].order(), ModelOrder::new(0, 0, 0));
    }

    #[test]
    fn test_all_failures_surface_sentinel() {
        let grid = OrderGrid::new(0..2, 0..2, 0..1);
        let model = ScriptedModel {
            failing: grid.orders(),
            offsets: vec![],
        };
        let outcome = OrderSearch::new(model, grid).run(&series());

        assert!(matches!(
            outcome,
            SearchOutcome::NoAdmissibleOrder { tried: 4, .. }
        ));
        assert_eq!(outcome.failures().len(), 4);
    }

    #[test]
    fn test_select_best_needs_no_model_bound() {
        let order = ModelOrder::new(0, 1, 0);
        let outcomes: Vec<CandidateOutcome<()>> =
            vec![CandidateOutcome::Inadmissible(FitError::DegenerateSeries { order })];

        assert_eq!(outcomes[0].order(), order);
        let outcome = select_best(outcomes);
        assert!(outcome.best().is_none());
        assert_eq!(outcome.tried(), 1);
    }

        #[test]
    fn test_parallel_matches_sequential() {
        let series = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0];
        let grid = OrderGrid::new(0..2, 0..2, 0..2);

        let parallel = OrderSearch::new(ArimaModel::new(), grid.clone()).run(&series);
        let sequential = OrderSearch::new(ArimaModel::new(), grid)
            .with_parallel(false)
            .run(&series);

        let (a, b) = (parallel.best().unwrap(), sequential.best().unwrap());
        assert_eq!(a.order(), b.order());
        assert_eq!(a.error_score(), b.error_score());
    }

    #[test]
    fn test_evaluate_all_keeps_grid_order() {
        let grid = OrderGrid::new(0..2, 0..2, 0..2);
        let outcomes = OrderSearch::new(ArimaModel::new(), grid.clone())
            .evaluate_all(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0]);

        let orders: Vec<ModelOrder> = outcomes.iter().map(|o| o.order()).collect();
        assert_eq!(orders, grid.orders());
    }
}
