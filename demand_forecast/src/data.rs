//! Loading of weekly demand observations

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One aggregated demand value of one entity in one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Entity (product/form) identifier
    pub entity_id: String,
    /// Week the demand belongs to
    pub period: NaiveDate,
    /// Aggregated demand
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(entity_id: impl Into<String>, period: NaiveDate, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            period,
            value,
        }
    }
}

/// Names of the input columns holding entity, period and value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Entity identifier column
    pub entity: String,
    /// Period (week) column
    pub period: String,
    /// Demand value column
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            entity: "entity_id".to_string(),
            period: "period".to_string(),
            value: "value".to_string(),
        }
    }
}

/// Data loader for observation tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load observations from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &ColumnNames) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, columns)
    }

    /// Extract observations from an existing DataFrame
    ///
    /// A missing column, a null cell or an unparseable period violates the
    /// input contract and fails the whole load.
    pub fn from_dataframe(df: &DataFrame, columns: &ColumnNames) -> Result<Vec<Observation>> {
        let entities = Self::entity_column(df, &columns.entity)?;
        let periods = Self::period_column(df, &columns.period)?;
        let values = Self::value_column(df, &columns.value)?;

        Ok(entities
            .into_iter()
            .zip(periods)
            .zip(values)
            .map(|((entity_id, period), value)| Observation {
                entity_id,
                period,
                value,
            })
            .collect())
    }

    /// Look up a column, treating absence as a contract violation
    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
        df.column(name).map_err(|_| {
            ForecastError::SchemaError(format!(
                "Missing column '{}' (found: {})",
                name,
                df.get_column_names().join(", ")
            ))
        })
    }

    fn null_error(name: &str, row: usize) -> ForecastError {
        ForecastError::SchemaError(format!("Null value in column '{}' at row {}", name, row))
    }

    fn entity_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
        let col = Self::column(df, name)?.cast(&DataType::Utf8)?;

        col.utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(|s| s.to_string())
                    .ok_or_else(|| Self::null_error(name, row))
            })
            .collect()
    }

    fn value_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let col = Self::column(df, name)?.cast(&DataType::Float64)?;

        col.f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| Self::null_error(name, row)))
            .collect()
    }

    fn period_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
        let col = Self::column(df, name)?;

        match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let text = v.ok_or_else(|| Self::null_error(name, row))?;
                    parse_period(text).ok_or_else(|| {
                        ForecastError::SchemaError(format!(
                            "Unparseable period '{}' in column '{}' at row {}",
                            text, name, row
                        ))
                    })
                })
                .collect(),
            DataType::Date => col
                .cast(&DataType::Int32)?
                .i32()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(|days| {
                        NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                    })
                    .ok_or_else(|| Self::null_error(name, row))
                })
                .collect(),
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                col.cast(&DataType::Int64)?
                    .i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| {
                        v.and_then(|ts| {
                            let millis = match unit {
                                TimeUnit::Nanoseconds => ts.div_euclid(1_000_000),
                                TimeUnit::Microseconds => ts.div_euclid(1_000),
                                TimeUnit::Milliseconds => ts,
                            };
                            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
                        })
                        .ok_or_else(|| Self::null_error(name, row))
                    })
                    .collect()
            }
            other => Err(ForecastError::SchemaError(format!(
                "Column '{}' has type {} which cannot hold periods",
                name, other
            ))),
        }
    }
}

/// Parse a period given as a date, a naive timestamp or an RFC 3339 timestamp
pub fn parse_period(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z")
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
