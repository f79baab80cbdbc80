//! # Smooth Forecast workspace
//!
//! Umbrella crate for the workspace members:
//!
//! - [`series_math`]: descriptive statistics and distribution helpers
//! - [`smooth_forecast`]: exponential smoothing models, grid search and diagnostics
//!
//! ```
//! use smooth_forecast_workspace::series_math::SeriesStats;
//!
//! let stats = SeriesStats::compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//! assert_eq!(stats.mean, 2.5);
//! ```

pub use series_math;
pub use smooth_forecast;

pub use smooth_forecast::{ForecastEngine, ForecastReport, ForecastRequest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_runs_a_request() {
        let values: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let report = ForecastEngine::new()
            .run(&ForecastRequest::new("demand", values, 2))
            .unwrap();
        assert_eq!(report.field, "demand");
        assert_eq!(report.intervals.len(), 2);
    }
}
