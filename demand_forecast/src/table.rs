//! Forecast results table handed to the persistence layer

use crate::error::Result;
use crate::order::ModelOrder;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Forecast of one entity for the week starting at `forecast_start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Entity identifier
    pub entity_id: String,
    /// Order with the lowest walk-forward error
    pub best_order: ModelOrder,
    /// Walk-forward mean squared error of the best order
    pub error_score: f64,
    /// One-step point forecast
    pub prediction: f64,
    /// Standard error of the forecast
    pub std_error: f64,
    /// `prediction - z * std_error`
    pub lower_bound: f64,
    /// `prediction + z * std_error`
    pub upper_bound: f64,
    /// First day of the forecast week
    pub forecast_start: NaiveDate,
}

/// Entity for which no candidate order could be fitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    /// Entity identifier
    pub entity_id: String,
    /// Number of candidate orders evaluated
    pub candidates_tried: usize,
}

/// All forecasts of one batch plus the entities that produced none
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    /// One record per forecast entity, ordered by entity id
    records: Vec<ForecastRecord>,
    /// Entities without an admissible order, ordered by entity id
    skipped: Vec<SkippedEntity>,
}

impl ForecastTable {
    /// Create a table, ordering both lists by entity id
    pub fn new(mut records: Vec<ForecastRecord>, mut skipped: Vec<SkippedEntity>) -> Self {
        records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        skipped.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Self { records, skipped }
    }

    /// Get the forecast records
    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    /// Get the skipped entities
    pub fn skipped(&self) -> &[SkippedEntity] {
        &self.skipped
    }

    /// Number of entities that yielded no forecast
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Number of forecast records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for one entity, if it was forecast
    pub fn get(&self, entity_id: &str) -> Option<&ForecastRecord> {
        self.records
            .binary_search_by(|r| r.entity_id.as_str().cmp(entity_id))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Build the DataFrame with the persisted column layout
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let records = &self.records;
        let df = DataFrame::new(vec![
            Series::new(
                "entity_id",
                records.iter().map(|r| r.entity_id.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                "best_order",
                records.iter().map(|r| r.best_order.to_string()).collect::<Vec<_>>(),
            ),
            Series::new(
                "error_score",
                records.iter().map(|r| r.error_score).collect::<Vec<_>>(),
            ),
            Series::new(
                "prediction",
                records.iter().map(|r| r.prediction).collect::<Vec<_>>(),
            ),
            Series::new(
                "std_error",
                records.iter().map(|r| r.std_error).collect::<Vec<_>>(),
            ),
            Series::new(
                "lower_bound",
                records.iter().map(|r| r.lower_bound).collect::<Vec<_>>(),
            ),
            Series::new(
                "upper_bound",
                records.iter().map(|r| r.upper_bound).collect::<Vec<_>>(),
            ),
            Series::new(
                "forecast_start",
                records
                    .iter()
                    .map(|r| r.forecast_start.format("%Y-%m-%d").to_string())
                    .collect::<Vec<_>>(),
            ),
        ])?;

        Ok(df)
    }

    /// Write the records as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Serialize records and skipped entities as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
