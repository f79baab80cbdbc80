//! Metrics for evaluating forecast performance
//!
//! All metrics for a fitted model are computed over the evaluation window
//! that starts after warm-up. Metrics that are undefined for the window
//! (zero total variance, no nonzero actuals, a perfect fit for the
//! likelihood) are `None` rather than a misleading number.

use crate::error::{ForecastError, Result};
use crate::models::FittedState;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Accuracy metrics for a set of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over nonzero actuals
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: Option<f64>,
    /// Coefficient of determination
    pub r2: Option<f64>,
    /// Akaike information criterion
    pub aic: Option<f64>,
    /// Bayesian information criterion
    pub bic: Option<f64>,
}

impl AccuracyReport {
    /// Metrics of a fitted model over its post-warm-up window
    pub fn from_state(state: &FittedState) -> Result<Self> {
        let (actual, fitted) = state.evaluation_window();
        evaluate(actual, &fitted, state.params().parameter_count())
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::InvalidInput(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.iter().chain(predicted.iter()).any(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidInput(
            "Metrics require finite actual and predicted values".to_string(),
        ));
    }
    Ok(())
}

/// Compute every accuracy metric for `predicted` against `actual`.
///
/// `parameter_count` is the `k` used by AIC and BIC.
pub fn evaluate(
    actual: &[f64],
    predicted: &[f64],
    parameter_count: usize,
) -> Result<AccuracyReport> {
    check_lengths(actual, predicted)?;

    let n = actual.len() as f64;
    let sse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let mae = mean_absolute_error(actual, predicted)?;
    if !sse.is_finite() || !mae.is_finite() {
        return Err(ForecastError::NumericalInstability(
            "Squared errors overflow f64".to_string(),
        ));
    }
    let mse = sse / n;

    let actual_mean = actual.iter().sum::<f64>() / n;
    let sst: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    // an overflowing SST leaves nothing to compare against
    let r2 = if sst == 0.0 || !sst.is_finite() {
        None
    } else {
        Some(1.0 - sse / sst)
    };

    let (aic, bic) = information_criteria(sse, actual.len(), parameter_count);

    Ok(AccuracyReport {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape: mean_absolute_percentage_error(actual, predicted)?,
        smape: symmetric_mean_absolute_percentage_error(actual, predicted)?,
        r2,
        aic,
        bic,
    })
}

/// AIC and BIC under the Gaussian-residual log-likelihood
/// `-0.5 n ln(2π SSE / n) - 0.5 n`.
///
/// Both are `None` when SSE is zero, where the likelihood is unbounded.
pub fn information_criteria(sse: f64, n: usize, k: usize) -> (Option<f64>, Option<f64>) {
    if n == 0 || sse <= 0.0 || !sse.is_finite() {
        return (None, None);
    }
    let nf = n as f64;
    let kf = k as f64;
    let log_likelihood = -0.5 * nf * (2.0 * PI * sse / nf).ln() - 0.5 * nf;
    let aic = 2.0 * kf - 2.0 * log_likelihood;
    let bic = aic + kf * (nf.ln() - 2.0);
    (Some(aic), Some(bic))
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean squared error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// MAPE in percent, averaged over points with a nonzero actual.
///
/// Zero actuals are excluded instead of inflating the average; `None` when
/// every actual is zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_lengths(actual, predicted)?;
    let terms: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| (a - p).abs() / a.abs())
        .collect();
    Ok(percent_mean(&terms))
}

/// sMAPE in percent, skipping points where `|y| + |ŷ|` is zero
pub fn symmetric_mean_absolute_percentage_error(
    actual: &[f64],
    predicted: &[f64],
) -> Result<Option<f64>> {
    check_lengths(actual, predicted)?;
    let terms: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a.abs() + p.abs() != 0.0)
        .map(|(a, p)| 2.0 * (a - p).abs() / (a.abs() + p.abs()))
        .collect();
    Ok(percent_mean(&terms))
}

fn percent_mean(terms: &[f64]) -> Option<f64> {
    if terms.is_empty() {
        return None;
    }
    let mean = 100.0 * terms.iter().sum::<f64>() / terms.len() as f64;
    mean.is_finite().then_some(mean)
}

fn fmt_optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.4}{}", v, suffix),
        None => "n/a".to_string(),
    }
}

impl std::fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {}", fmt_optional(self.mape, "%"))?;
        writeln!(f, "  SMAPE: {}", fmt_optional(self.smape, "%"))?;
        writeln!(f, "  R2:    {}", fmt_optional(self.r2, ""))?;
        writeln!(f, "  AIC:   {}", fmt_optional(self.aic, ""))?;
        writeln!(f, "  BIC:   {}", fmt_optional(self.bic, ""))?;
        Ok(())
    }
}
