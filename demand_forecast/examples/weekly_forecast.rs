use chrono::{Duration, NaiveDate};
use demand_forecast::{run_batch, BatchConfig, Observation, OrderGrid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let first_week = NaiveDate::from_ymd_opt(2018, 1, 1).ok_or("bad date")?;
    let forecast_start = first_week + Duration::weeks(12);

    // Three coffee profiles: a steady seller, a new one and one with no sales
    let profiles: [(&str, Vec<f64>); 3] = [
        ("Dark Roast 1kg", vec![40.0, 42.0, 39.0, 45.0, 44.0, 47.0, 46.0, 49.0, 48.0, 51.0, 50.0, 53.0]),
        ("Decaf 250g", vec![3.0, 4.0, 2.0]),
        ("Sample Pack", vec![0.0; 10]),
    ];

    let mut observations = Vec::new();
    for (profile, weights) in &profiles {
        for (week, weight) in weights.iter().enumerate() {
            observations.push(Observation::new(
                *profile,
                first_week + Duration::weeks(week as i64),
                *weight,
            ));
        }
    }

    let config = BatchConfig {
        grid: OrderGrid::new(0..3, 0..2, 0..3),
        ..BatchConfig::default()
    };
    let table = run_batch(&observations, &config, forecast_start);

    println!("Forecasts for week of {}:", forecast_start);
    for record in table.records() {
        println!(
            "  {:<16} {} {:>8.2} [{:.2}, {:.2}]",
            record.entity_id, record.best_order, record.prediction, record.lower_bound, record.upper_bound
        );
    }
    println!("Skipped {} profile(s) without an admissible order", table.skipped_count());

    table.write_csv(std::io::stdout())?;
    Ok(())
}
