//! # Smooth Forecast
//!
//! Exponential smoothing forecasts for univariate series.
//!
//! ## Features
//!
//! - Simple, Holt (double) and Holt-Winters (triple) smoothing with optional trend damping
//! - Additive or multiplicative seasonality with decomposition-based initialisation
//! - Parallel grid search over the smoothing weights, scored on a holdout split
//! - Prediction intervals that widen with the horizon
//! - Accuracy metrics (MAE, MSE, RMSE, MAPE, sMAPE, R², AIC, BIC)
//! - Residual diagnostics (ACF, Ljung-Box, normality score, Q-Q data)
//! - JSON request/report surface and CSV loading
//!
//! ## Quick Start
//!
//! ```rust
//! use smooth_forecast::{ForecastEngine, ForecastRequest};
//!
//! let values: Vec<f64> = (0..24).map(|i| 100.0 + 2.0 * i as f64).collect();
//! let request = ForecastRequest::new("sales", values, 3);
//!
//! let report = ForecastEngine::new().run(&request)?;
//! assert_eq!(report.point_forecasts.len(), 3);
//! # Ok::<(), smooth_forecast::ForecastError>(())
//! ```
//!
//! Lower-level pieces can be used directly:
//!
//! ```rust
//! use smooth_forecast::models::{SmoothingParameters, TrainedForecastModel};
//! use smooth_forecast::models::exponential_smoothing::fit;
//!
//! let params = SmoothingParameters::double(0.5, 0.1, None)?;
//! let state = fit(&[10.0, 12.0, 14.0, 16.0, 18.0], &params)?;
//! let forecast = state.forecast(2, 0.95)?;
//! assert!(forecast.upper()[1] > forecast.point()[1]);
//! # Ok::<(), smooth_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod heuristics;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{DataLoader, TimeSeries};
pub use crate::diagnostics::{DiagnosticsReport, LjungBox};
pub use crate::engine::{ForecastEngine, ForecastReport, ForecastRequest, SmoothingConfig};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::AccuracyReport;
pub use crate::models::{
    FittedState, ForecastModel, ForecastResult, ModelKind, SeasonalType, SmoothingParameters,
    TrainedForecastModel,
};
pub use crate::optimizer::{CancellationToken, GridConfig, GridSearchOptimizer, GridSearchResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
