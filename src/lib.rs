//! # Demand Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members.
//!
//! - [`demand_forecast`]: observation loading, series preparation, ARIMA
//!   order search and the weekly forecast batch
//! - [`forecast_math`]: differencing, statistics, accuracy metrics and the
//!   Nelder-Mead optimiser
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::demand_forecast::ModelOrder;
//!
//! let order: ModelOrder = "(1, 1, 0)".parse().unwrap();
//! assert_eq!(order, ModelOrder::new(1, 1, 0));
//! ```

pub use demand_forecast;
pub use forecast_math;

/// Version of the workspace umbrella crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
