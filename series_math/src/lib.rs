//! # Series Math
//!
//! Descriptive statistics and distribution helpers for univariate time series.
//! This crate provides the numeric building blocks used by the smoothing models,
//! the parameter heuristics and the residual diagnostics.

use thiserror::Error;

pub mod distribution;
pub mod stats;

pub use stats::SeriesStats;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
