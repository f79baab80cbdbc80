//! Error types for the smooth_forecast crate

use series_math::MathError;
use thiserror::Error;

/// Custom error types for the smooth_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series too short for the requested model
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Smoothing parameters outside their valid ranges
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Malformed input series or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The recursion or projection produced a non-finite value
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// A grid search was cancelled before it finished
    #[error("Grid search cancelled after {0} evaluated points")]
    Cancelled(usize),

    /// Error from the numeric helpers
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error while reading CSV input
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error while encoding or decoding JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether a simpler model or a naive forecast can still answer the request
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ForecastError::InsufficientData(_))
    }
}
