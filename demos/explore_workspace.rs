// This program walks through the workspace crates on a small weekly dataset
use chrono::{Duration, NaiveDate};
use demand_forecast::prepare::week_start;
use demand_forecast::{BatchConfig, ForecastAggregator, Observation, SeriesPreparer};
use forecast_math::differencing::difference;
use forecast_math::statistics::{mean, variance};

fn main() {
    println!("Exploring the demand forecast workspace\n");

    // Forecast math utilities
    println!("=== Forecast Math ===");
    let weekly = [20.0, 22.0, 21.0, 25.0, 24.0, 27.0, 26.0, 29.0];
    println!("Series:             {:?}", weekly);
    if let Ok(diff) = difference(&weekly, 1) {
        println!("First differences:  {:?}", diff);
        if let (Ok(m), Ok(v)) = (mean(&diff), variance(&diff)) {
            println!("Mean / variance:    {:.3} / {:.3}", m, v);
        }
    }

    // Demand forecast batch
    println!("\n=== Demand Forecast ===");
    let Some(today) = NaiveDate::from_ymd_opt(2018, 3, 7) else {
        return;
    };
    let forecast_start = week_start(today);
    println!("Forecast week starts {}", forecast_start);

    let observations: Vec<Observation> = weekly
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new("Espresso 1kg", forecast_start - Duration::weeks(8 - i as i64), *v))
        .collect();

    let config = BatchConfig::default();
    let series = SeriesPreparer::new(forecast_start, config.min_history).prepare(&observations);
    println!("Prepared {} entity series", series.len());

    let table = ForecastAggregator::from_config(&config, forecast_start).run(&series);
    for record in table.records() {
        println!(
            "{}: best {} (MSE {:.3}), next week {:.2} +/- {:.2}",
            record.entity_id,
            record.best_order,
            record.error_score,
            record.prediction,
            record.upper_bound - record.prediction
        );
    }

    println!("\nDone exploring");
}
