use chrono::NaiveDate;
use demand_forecast::{
    run_batch, BatchConfig, ColumnNames, DataLoader, ModelOrder, Observation, OrderGrid,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn forecast_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 3, 5).unwrap()
}

fn small_grid_config() -> BatchConfig {
    BatchConfig {
        grid: OrderGrid::new(0..2, 0..2, 0..1),
        ..BatchConfig::default()
    }
}

// Weekly rows for one entity, starting 2018-01-01
fn weekly_rows(file: &mut NamedTempFile, entity: &str, values: &[f64]) {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    for (i, value) in values.iter().enumerate() {
        let period = start + chrono::Duration::weeks(i as i64);
        writeln!(file, "{},{},{}", entity, period.format("%Y-%m-%d"), value).unwrap();
    }
}

fn sample_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "profile_name,week_date,weight").unwrap();
    weekly_rows(&mut file, "X", &[10.0, 12.0, 11.0, 13.0, 12.0, 14.0]);
    weekly_rows(&mut file, "Y", &[4.0, 5.0, 6.0]);
    weekly_rows(&mut file, "Z", &[0.0; 8]);
    file
}

fn columns() -> ColumnNames {
    ColumnNames {
        entity: "profile_name".to_string(),
        period: "week_date".to_string(),
        value: "weight".to_string(),
    }
}

#[test]
fn test_full_batch_workflow() {
    // 1. Load observations
    let file = sample_file();
    let observations = DataLoader::from_csv(file.path(), &columns()).unwrap();
    assert_eq!(observations.len(), 17);

    // 2. Run the batch
    let table = run_batch(&observations, &small_grid_config(), forecast_start());

    // 3. Only X is forecast
    assert_eq!(table.len(), 1);
    let record = table.get("X").unwrap();
    assert!([
        ModelOrder::new(0, 0, 0),
        ModelOrder::new(0, 1, 0),
        ModelOrder::new(1, 0, 0),
        ModelOrder::new(1, 1, 0),
    ]
    .contains(&record.best_order));
    assert!(record.lower_bound < record.prediction);
    assert!(record.prediction < record.upper_bound);
    assert!(record.error_score >= 0.0);
    assert_eq!(record.forecast_start, forecast_start());

    // 4. Y is below the history threshold, Z has no admissible order
    assert!(table.get("Y").is_none());
    assert!(table.get("Z").is_none());
    assert_eq!(table.skipped_count(), 1);
    assert_eq!(table.skipped()[0].entity_id, "Z");
    assert_eq!(table.skipped()[0].candidates_tried, 4);
}

#[test]
fn test_batch_is_deterministic() {
    let file = sample_file();
    let observations = DataLoader::from_csv(file.path(), &columns()).unwrap();

    let first = run_batch(&observations, &small_grid_config(), forecast_start());
    let second = run_batch(&observations, &small_grid_config(), forecast_start());

    assert_eq!(first, second);
}

#[test]
fn test_history_threshold_boundary() {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let rows = |entity: &str, n: usize| -> Vec<Observation> {
        (0..n)
            .map(|i| {
                Observation::new(
                    entity,
                    start + chrono::Duration::weeks(i as i64),
                    (10 + i % 3) as f64,
                )
            })
            .collect()
    };
    let mut observations = rows("five", 5);
    observations.extend(rows("six", 6));

    let table = run_batch(&observations, &small_grid_config(), forecast_start());

    assert!(table.get("five").is_none());
    assert!(table.get("six").is_some());
    // Dropped before modelling, so not reported as skipped either
    assert_eq!(table.skipped_count(), 0);
}

#[test]
fn test_rows_on_or_after_forecast_start_are_ignored() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,period,value").unwrap();
    weekly_rows(&mut file, "X", &[10.0, 12.0, 11.0, 13.0, 12.0, 14.0]);
    writeln!(file, "X,2018-03-05,1000.0").unwrap();
    writeln!(file, "X,2018-03-12,1000.0").unwrap();

    let observations = DataLoader::from_csv(file.path(), &ColumnNames::default()).unwrap();
    let with_future = run_batch(&observations, &small_grid_config(), forecast_start());
    let without_future = run_batch(&observations[..6], &small_grid_config(), forecast_start());

    assert_eq!(with_future, without_future);
}

#[test]
fn test_csv_output_round_trip_of_orders() {
    let file = sample_file();
    let observations = DataLoader::from_csv(file.path(), &columns()).unwrap();
    let table = run_batch(&observations, &small_grid_config(), forecast_start());

    let mut buffer = Vec::new();
    table.write_csv(&mut buffer).unwrap();

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let restored: Vec<demand_forecast::ForecastRecord> =
        reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(restored, table.records().to_vec());
}

#[test]
fn test_empty_input_yields_empty_table() {
    let table = run_batch(&[], &BatchConfig::default(), forecast_start());
    assert!(table.is_empty());
    assert_eq!(table.skipped_count(), 0);
}
