use demand_forecast::models::arima::ArimaModel;
use demand_forecast::search::CandidateOutcome;
use demand_forecast::{OrderGrid, OrderSearch, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() {
    // Two years of weekly demand with a slow upward drift
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 3.0).unwrap();
    let mut demand = Vec::with_capacity(104);
    let mut level = 120.0;
    for _ in 0..104 {
        level += 0.4 + 0.5 * noise.sample(&mut rng);
        demand.push(level + noise.sample(&mut rng));
    }

    let search = OrderSearch::new(ArimaModel::new(), OrderGrid::new(0..3, 0..2, 0..3));
    println!("Evaluating {} candidate orders on {} weeks", search.grid().len(), demand.len());

    for outcome in search.evaluate_all(&demand) {
        match outcome {
            CandidateOutcome::Admissible(result) => {
                println!("{:<12} MSE {:>10.3}", result.order().to_string(), result.error_score())
            }
            CandidateOutcome::Inadmissible(err) => println!("{:<12} {}", err.order().to_string(), err),
        }
    }

    let outcome = search.run(&demand);
    match outcome.best() {
        Some(best) => {
            let forecast = best.model().one_step();
            let (lower, upper) = forecast.bounds(1.96);
            println!(
                "\nBest order {} -> next week {:.1} [{:.1}, {:.1}]",
                best.order(),
                forecast.prediction,
                lower,
                upper
            );
        }
        None => println!("\nNo admissible order among {} candidates", outcome.tried()),
    }
}
