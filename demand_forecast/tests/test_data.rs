use chrono::NaiveDate;
use demand_forecast::data::{ColumnNames, DataLoader, Observation};
use demand_forecast::prepare::SeriesPreparer;
use demand_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    // Create a temporary CSV file
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,period,value").unwrap();
    writeln!(file, "Dark,2018-01-01,12.5").unwrap();
    writeln!(file, "Dark,2018-01-08,10.0").unwrap();
    writeln!(file, "Light,2018-01-01,3.25").unwrap();

    let observations = DataLoader::from_csv(file.path(), &ColumnNames::default()).unwrap();

    assert_eq!(observations.len(), 3);
    assert_eq!(observations[0], Observation::new("Dark", date(2018, 1, 1), 12.5));
    assert_eq!(observations[2].entity_id, "Light");
}

#[test]
fn test_timestamp_periods() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,period,value").unwrap();
    writeln!(file, "A,2018-01-08 00:00:00+00:00,1").unwrap();
    writeln!(file, "A,2018-01-15 00:00:00+00:00,2").unwrap();

    let observations = DataLoader::from_csv(file.path(), &ColumnNames::default()).unwrap();
    assert_eq!(observations[1].period, date(2018, 1, 15));
}

#[test]
fn test_missing_column_fails_load() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,week,value").unwrap();
    writeln!(file, "A,2018-01-01,1").unwrap();

    let result = DataLoader::from_csv(file.path(), &ColumnNames::default());
    assert!(matches!(result, Err(ForecastError::SchemaError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = DataLoader::from_csv("/nonexistent/weekly.csv", &ColumnNames::default());
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_loaded_rows_feed_preparer() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "entity_id,period,value").unwrap();
    for week in 0..7 {
        let period = date(2018, 1, 1) + chrono::Duration::weeks(week);
        writeln!(file, "A,{},{}", period.format("%Y-%m-%d"), week + 1).unwrap();
    }
    // Duplicate week is summed
    writeln!(file, "A,2018-01-01,10").unwrap();

    let observations = DataLoader::from_csv(file.path(), &ColumnNames::default()).unwrap();
    let prepared = SeriesPreparer::new(date(2018, 3, 5), 5).prepare(&observations);

    let series = &prepared["A"];
    assert_eq!(series.len(), 7);
    assert_eq!(series.values()[0], 11.0);
    assert_eq!(series.periods()[6], date(2018, 2, 12));
}
