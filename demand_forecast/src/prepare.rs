//! Preparation of long-format observations into per-entity series

use crate::data::Observation;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Entities need strictly more rows than this to be modelled
pub const DEFAULT_MIN_HISTORY: usize = 5;

/// Chronologically ordered demand history of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySeries {
    /// Entity identifier
    entity_id: String,
    /// Period of each value, ascending
    periods: Vec<NaiveDate>,
    /// Demand per period
    values: Vec<f64>,
}

impl EntitySeries {
    /// Create a series from already ordered periods and values
    ///
    /// Returns `None` if the lengths differ or the periods are not strictly
    /// ascending.
    pub fn new(entity_id: impl Into<String>, periods: Vec<NaiveDate>, values: Vec<f64>) -> Option<Self> {
        if periods.len() != values.len() || periods.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }

        Some(Self {
            entity_id: entity_id.into(),
            periods,
            values,
        })
    }

    /// Get the entity identifier
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Get the periods
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Get the values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Length of the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Turns observations into one ordered series per entity
#[derive(Debug, Clone)]
pub struct SeriesPreparer {
    /// Only periods strictly before this date are used
    cutoff: NaiveDate,
    /// Entities with this many rows or fewer are dropped
    min_history: usize,
    /// Insert zero demand for weeks missing inside an entity's history
    fill_missing_weeks: bool,
}

impl SeriesPreparer {
    /// Create a new preparer with the given cutoff and history threshold
    pub fn new(cutoff: NaiveDate, min_history: usize) -> Self {
        Self {
            cutoff,
            min_history,
            fill_missing_weeks: false,
        }
    }

    /// Enable or disable zero-filling of missing weeks
    pub fn with_fill_missing_weeks(mut self, fill: bool) -> Self {
        self.fill_missing_weeks = fill;
        self
    }

    /// Get the cutoff date
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Build one series per surviving entity
    pub fn prepare(&self, observations: &[Observation]) -> BTreeMap<String, EntitySeries> {
        // Rows before the cutoff, grouped by entity
        let mut grouped: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
        for obs in observations.iter().filter(|o| o.period < self.cutoff) {
            grouped.entry(obs.entity_id.as_str()).or_default().push(obs);
        }

        let mut prepared = BTreeMap::new();
        for (entity_id, rows) in grouped {
            if rows.len() <= self.min_history {
                debug!(entity_id, rows = rows.len(), "dropping entity with short history");
                continue;
            }

            // Collapse duplicate periods and order them
            let mut by_period: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for row in rows {
                *by_period.entry(row.period).or_insert(0.0) += row.value;
            }
            if self.fill_missing_weeks {
                fill_gaps(&mut by_period);
            }

            let (periods, values) = by_period.into_iter().unzip();
            prepared.insert(
                entity_id.to_string(),
                EntitySeries {
                    entity_id: entity_id.to_string(),
                    periods,
                    values,
                },
            );
        }

        info!(
            entities = prepared.len(),
            cutoff = %self.cutoff,
            "prepared entity series"
        );
        prepared
    }
}

/// Insert zero demand for every week between consecutive periods
fn fill_gaps(by_period: &mut BTreeMap<NaiveDate, f64>) {
    let periods: Vec<NaiveDate> = by_period.keys().copied().collect();
    for pair in periods.windows(2) {
        let mut week = pair[0] + Duration::weeks(1);
        while week < pair[1] {
            by_period.insert(week, 0.0);
            week += Duration::weeks(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn weekly(entity: &str, start: NaiveDate, values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                entity_id: entity.to_string(),
                period: start + Duration::weeks(i as i64),
                value,
            })
            .collect()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
    }

    fn far_cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    #[rstest]
    #[case(5, false)]
    #[case(6, true)]
    fn test_history_threshold(#[case] weeks: usize, #[case] kept: bool) {
        let values = vec![1.0; weeks];
        let observations = weekly("A", monday(), &values);

        let prepared = SeriesPreparer::new(far_cutoff(), DEFAULT_MIN_HISTORY).prepare(&observations);
        assert_eq!(prepared.contains_key("A"), kept);
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let observations = weekly("A", monday(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        // Cutoff on the 8th week drops it and everything after
        let cutoff = monday() + Duration::weeks(7);

        let prepared = SeriesPreparer::new(cutoff, DEFAULT_MIN_HISTORY).prepare(&observations);
        assert_eq!(prepared["A"].values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_cutoff_applies_before_counting() {
        let observations = weekly("A", monday(), &[1.0; 7]);
        let cutoff = monday() + Duration::weeks(5);

        let prepared = SeriesPreparer::new(cutoff, DEFAULT_MIN_HISTORY).prepare(&observations);
        assert!(prepared.is_empty());
    }

    #[test]
    fn test_duplicates_summed_and_sorted() {
        let mut observations = weekly("A", monday(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        observations.reverse();
        observations.push(Observation {
            entity_id: "A".to_string(),
            period: monday(),
            value: 10.0,
        });

        let prepared = SeriesPreparer::new(far_cutoff(), DEFAULT_MIN_HISTORY).prepare(&observations);
        let series = &prepared["A"];

        assert_eq!(series.values(), &[11.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(series.periods()[0], monday());
        assert!(series.periods().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_entities_keyed_by_id() {
        let mut observations = weekly("beta", monday(), &[1.0; 6]);
        observations.extend(weekly("alpha", monday(), &[2.0; 6]));
        observations.extend(weekly("gamma", monday(), &[3.0; 2]));

        let prepared = SeriesPreparer::new(far_cutoff(), DEFAULT_MIN_HISTORY).prepare(&observations);
        let ids: Vec<&String> = prepared.keys().collect();

        assert_eq!(ids, vec!["alpha", "beta"]);
        assert_eq!(prepared["alpha"].entity_id(), "alpha");
    }

    #[test]
    fn test_fill_missing_weeks() {
        let mut observations = weekly("A", monday(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        observations.push(Observation {
            entity_id: "A".to_string(),
            period: monday() + Duration::weeks(7),
            value: 8.0,
        });

        let preparer = SeriesPreparer::new(far_cutoff(), DEFAULT_MIN_HISTORY);
        assert_eq!(preparer.prepare(&observations)["A"].len(), 6);

        let filled = preparer.with_fill_missing_weeks(true).prepare(&observations);
        assert_eq!(
            filled["A"].values(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 8.0]
        );
    }

    #[test]
    fn test_empty_input() {
        let prepared = SeriesPreparer::new(far_cutoff(), DEFAULT_MIN_HISTORY).prepare(&[]);
        assert!(prepared.is_empty());
    }

    #[test]
    fn test_week_start() {
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(week_start(monday()), monday());
    }

    #[test]
    fn test_series_constructor_validates_order() {
        let periods = vec![monday() + Duration::weeks(1), monday()];
        assert!(EntitySeries::new("A", periods, vec![1.0, 2.0]).is_none());
        assert!(EntitySeries::new("A", vec![monday()], vec![1.0, 2.0]).is_none());
    }
}
