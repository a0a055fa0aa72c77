//! Batch orchestration: one order search and one forecast per entity

use crate::config::BatchConfig;
use crate::data::Observation;
use crate::models::arima::ArimaModel;
use crate::models::{ForecastModel, TrainedForecastModel, Z_95};
use crate::prepare::EntitySeries;
use crate::search::{OrderSearch, SearchOutcome};
use crate::table::{ForecastRecord, ForecastTable, SkippedEntity};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// What the batch produced for one entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    /// Entity was forecast
    Forecast(ForecastRecord),
    /// No candidate order could be fitted
    Skipped(SkippedEntity),
}

/// Runs the order search for every entity and assembles the results table
#[derive(Debug, Clone)]
pub struct ForecastAggregator<M> {
    /// Per-entity order search
    search: OrderSearch<M>,
    /// Stamped on every record of the batch
    forecast_start: NaiveDate,
    /// Interval multiplier
    z_score: f64,
    /// Process entities on the rayon thread pool
    parallel: bool,
}

impl<M: ForecastModel> ForecastAggregator<M> {
    /// Create a new aggregator with a 95% interval
    pub fn new(search: OrderSearch<M>, forecast_start: NaiveDate) -> Self {
        Self {
            search,
            forecast_start,
            z_score: Z_95,
            parallel: true,
        }
    }

    /// Set the interval multiplier
    pub fn with_z_score(mut self, z_score: f64) -> Self {
        self.z_score = z_score;
        self
    }

    /// Enable or disable parallel entity processing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Get the forecast start date
    pub fn forecast_start(&self) -> NaiveDate {
        self.forecast_start
    }

    /// Search and forecast a single entity
    pub fn forecast_entity(&self, series: &EntitySeries) -> EntityOutcome {
        match self.search.run(series.values()) {
            SearchOutcome::Best {
                result, failures, ..
            } => {
                // The evaluated model was fitted on the entity's whole history
                let forecast = result.model().one_step();
                let (lower_bound, upper_bound) = forecast.bounds(self.z_score);

                info!(
                    entity_id = series.entity_id(),
                    best_order = %result.order(),
                    error_score = result.error_score(),
                    inadmissible = failures.len(),
                    "model complete"
                );

                EntityOutcome::Forecast(ForecastRecord {
                    entity_id: series.entity_id().to_string(),
                    best_order: result.order(),
                    error_score: result.error_score(),
                    prediction: forecast.prediction,
                    std_error: forecast.std_error,
                    lower_bound,
                    upper_bound,
                    forecast_start: self.forecast_start,
                })
            }
            SearchOutcome::NoAdmissibleOrder { tried, failures } => {
                warn!(
                    entity_id = series.entity_id(),
                    tried,
                    first_failure = failures.first().map(|f| f.to_string()).unwrap_or_default(),
                    "no admissible order, entity skipped"
                );

                EntityOutcome::Skipped(SkippedEntity {
                    entity_id: series.entity_id().to_string(),
                    candidates_tried: tried,
                })
            }
        }
    }

    /// Forecast every entity
    ///
    /// Entities without an admissible order are reported in the table's
    /// skipped list. An empty map yields an empty table.
    pub fn run(&self, series: &BTreeMap<String, EntitySeries>) -> ForecastTable {
        info!(
            entities = series.len(),
            candidates = self.search.grid().len(),
            forecast_start = %self.forecast_start,
            "begin modelling"
        );

        let outcomes: Vec<EntityOutcome> = if self.parallel {
            series
                .par_iter()
                .map(|(_, s)| self.forecast_entity(s))
                .collect()
        } else {
            series.values().map(|s| self.forecast_entity(s)).collect()
        };

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                EntityOutcome::Forecast(record) => records.push(record),
                EntityOutcome::Skipped(entity) => skipped.push(entity),
            }
        }

        let table = ForecastTable::new(records, skipped);
        info!(
            forecasts = table.len(),
            skipped = table.skipped_count(),
            "modelling complete"
        );
        table
    }
}

impl ForecastAggregator<ArimaModel> {
    /// ARIMA aggregator built from a batch configuration
    pub fn from_config(config: &BatchConfig, forecast_start: NaiveDate) -> Self {
        Self::new(config.order_search(), forecast_start).with_z_score(config.z_score)
    }
}

/// Prepare series from raw observations and forecast every entity
pub fn run_batch(
    observations: &[Observation],
    config: &BatchConfig,
    forecast_start: NaiveDate,
) -> ForecastTable {
    let series = config.preparer(forecast_start).prepare(observations);
    ForecastAggregator::from_config(config, forecast_start).run(&series)
}
