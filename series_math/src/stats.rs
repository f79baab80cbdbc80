//! Descriptive statistics for univariate series
//!
//! Contains the quantities used to characterise a series before fitting:
//! - Mean and population variance
//! - Coefficient of variation
//! - Closed-form OLS trend slope
//! - Autocorrelation and seasonal-period detection
//! - Sample quantiles

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Largest lag scanned when looking for a seasonal period
pub const MAX_SEASONAL_LAG: usize = 12;

/// Arithmetic mean of a series
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by n)
pub fn variance(values: &[f64]) -> Result<f64> {
    let mu = mean(values)?;
    let sum_sq = values.iter().map(|&x| (x - mu).powi(2)).sum::<f64>();

    Ok(sum_sq / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(variance(values)?.sqrt())
}

/// Ratio of the standard deviation to the mean.
///
/// Returns `None` when the mean is zero, since the ratio is undefined there.
pub fn coefficient_of_variation(values: &[f64]) -> Result<Option<f64>> {
    let mu = mean(values)?;
    if mu == 0.0 {
        return Ok(None);
    }

    Ok(Some(std_dev(values)? / mu))
}

/// Closed-form OLS slope of the series against its index `0..n-1`.
///
/// A single point (or none) has no slope and yields 0.
pub fn linear_trend_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / nf;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Autocorrelation at `lag`:
///
/// ```text
/// ρ_k = Σ_{t=k}^{n-1} (x_t - x̄)(x_{t-k} - x̄) / Σ_t (x_t - x̄)²
/// ```
///
/// Returns 0 for a zero denominator, an empty series, or `lag >= n`.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if n == 0 || lag >= n {
        return 0.0;
    }

    let mu = values.iter().sum::<f64>() / n as f64;
    let denominator: f64 = values.iter().map(|&x| (x - mu).powi(2)).sum();
    if denominator == 0.0 {
        return 0.0;
    }

    let numerator: f64 = (lag..n)
        .map(|t| (values[t] - mu) * (values[t - lag] - mu))
        .sum();

    numerator / denominator
}

/// Autocorrelations for lags `1..=max_lag`
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    (1..=max_lag).map(|lag| autocorrelation(values, lag)).collect()
}

/// Scan lags `2..=min(12, n/4)` and return the lag with the largest |ρ|.
///
/// Returns `None` when the series is too short for any candidate lag.
pub fn detect_seasonal_period(values: &[f64]) -> Option<usize> {
    let upper = MAX_SEASONAL_LAG.min(values.len() / 4);
    if upper < 2 {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for lag in 2..=upper {
        let strength = autocorrelation(values, lag).abs();
        match best {
            Some((_, best_strength)) if strength <= best_strength => {}
            _ => best = Some((lag, strength)),
        }
    }

    best.map(|(lag, _)| lag)
}

/// Sample quantile with linear interpolation between order statistics.
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a quantile of an empty series".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be within [0, 1], got {}",
            q
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Quantiles require finite values".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    Ok(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Interquartile range (Q3 - Q1)
pub fn interquartile_range(values: &[f64]) -> Result<f64> {
    Ok(quantile(values, 0.75)? - quantile(values, 0.25)?)
}

/// Summary of a series used to seed model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Number of observations
    pub len: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Standard deviation over mean, if the mean is nonzero
    pub coefficient_of_variation: Option<f64>,
    /// OLS slope against the index
    pub trend_slope: f64,
    /// Lag with the strongest autocorrelation in the seasonal scan
    pub seasonal_period: Option<usize>,
    /// |ρ| at the detected seasonal lag
    pub seasonal_strength: f64,
}

impl SeriesStats {
    /// Characterise a series
    pub fn compute(values: &[f64]) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let mean = mean(values)?;
        let variance = variance(values)?;
        let seasonal_period = detect_seasonal_period(values);
        let seasonal_strength = seasonal_period
            .map(|lag| autocorrelation(values, lag).abs())
            .unwrap_or(0.0);

        Ok(Self {
            len: values.len(),
            mean,
            variance,
            std_dev: variance.sqrt(),
            coefficient_of_variation: coefficient_of_variation(values)?,
            trend_slope: linear_trend_slope(values),
            seasonal_period,
            seasonal_strength,
        })
    }

    /// Total trend movement across the series relative to its mean level.
    ///
    /// Returns `None` for a zero mean.
    pub fn relative_trend(&self) -> Option<f64> {
        if self.mean == 0.0 {
            return None;
        }
        Some((self.trend_slope * self.len as f64 / self.mean).abs())
    }
}
