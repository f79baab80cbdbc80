//! Residual diagnostics for a fitted model
//!
//! - Autocorrelation function of the residuals
//! - Ljung-Box portmanteau test with a chi-square tail probability
//! - IQR/σ normality proxy (≈1.349 for Gaussian residuals)
//! - Normal Q-Q coordinates

use crate::error::{ForecastError, Result};
use crate::models::FittedState;
use serde::{Deserialize, Serialize};
use series_math::distribution::{chi_square_sf, qq_normal};
use series_math::stats;

/// IQR/σ of a normal distribution
pub const NORMAL_IQR_RATIO: f64 = 1.349;

/// Result of a Ljung-Box test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LjungBox {
    /// Q statistic
    pub q: f64,
    /// Degrees of freedom after removing fitted parameters
    pub dof: usize,
    /// Upper-tail chi-square probability of Q
    pub p_value: f64,
}

impl LjungBox {
    /// Whether the residuals look uncorrelated at the given significance
    pub fn is_white_noise(&self, significance: f64) -> bool {
        self.p_value > significance
    }
}

/// Diagnostics computed from a model's residuals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Residual autocorrelations at lags 1..=max_lag
    pub acf: Vec<f64>,
    pub ljung_box_q: f64,
    pub ljung_box_dof: usize,
    pub ljung_box_p_value: f64,
    pub residual_mean: f64,
    /// Population standard deviation of the residuals
    pub residual_std: f64,
    /// IQR/σ of the residuals, `None` when σ is zero
    pub normality_score: Option<f64>,
    /// Normal Q-Q coordinates as (theoretical, sample), when enough residuals exist
    pub qq: Option<(Vec<f64>, Vec<f64>)>,
}

/// Default number of lags: `max(1, min(10, n/5))`, capped at `n - 1`
pub fn default_max_lag(n: usize) -> usize {
    (n / 5).min(10).max(1).min(n.saturating_sub(1))
}

/// Residual autocorrelations for lags `1..=max_lag`
pub fn acf(residuals: &[f64], max_lag: usize) -> Vec<f64> {
    stats::acf(residuals, max_lag)
}

/// Ljung-Box test on `residuals` with `fitted_params` removed from the dof.
///
/// ```text
/// Q = n (n + 2) Σ_{k=1}^{L} ρ_k² / (n - k),   dof = max(1, L - fitted_params)
/// ```
pub fn ljung_box(residuals: &[f64], max_lag: usize, fitted_params: usize) -> Result<LjungBox> {
    let n = residuals.len();
    if max_lag == 0 {
        return Err(ForecastError::InvalidInput(
            "Ljung-Box needs at least one lag".to_string(),
        ));
    }
    if n <= max_lag {
        return Err(ForecastError::InsufficientData(format!(
            "Ljung-Box with {} lags needs more than {} residuals, got {}",
            max_lag, max_lag, n
        )));
    }

    let nf = n as f64;
    let sum: f64 = acf(residuals, max_lag)
        .iter()
        .enumerate()
        .map(|(i, rho)| rho * rho / (nf - (i + 1) as f64))
        .sum();
    let q = nf * (nf + 2.0) * sum;

    let dof = max_lag.saturating_sub(fitted_params).max(1);
    let p_value = chi_square_sf(q, dof)?;

    Ok(LjungBox { q, dof, p_value })
}

/// IQR/σ of the residuals, `None` for zero spread
pub fn normality_score(residuals: &[f64]) -> Result<Option<f64>> {
    let sigma = stats::std_dev(residuals)?;
    if sigma == 0.0 {
        return Ok(None);
    }
    Ok(Some(stats::interquartile_range(residuals)? / sigma))
}

impl DiagnosticsReport {
    /// Diagnose a fitted model with the default lag count
    pub fn from_state(state: &FittedState) -> Result<Self> {
        let residuals = state.residuals();
        Self::from_residuals(
            &residuals,
            default_max_lag(residuals.len()),
            state.params().smoothing_weights(),
        )
    }

    /// Diagnose raw residuals
    pub fn from_residuals(residuals: &[f64], max_lag: usize, fitted_params: usize) -> Result<Self> {
        if residuals.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Diagnostics need at least 2 residuals, got {}",
                residuals.len()
            )));
        }

        let test = ljung_box(residuals, max_lag, fitted_params)?;
        let qq = qq_normal(residuals).ok();

        Ok(Self {
            acf: acf(residuals, max_lag),
            ljung_box_q: test.q,
            ljung_box_dof: test.dof,
            ljung_box_p_value: test.p_value,
            residual_mean: stats::mean(residuals)?,
            residual_std: stats::std_dev(residuals)?,
            normality_score: normality_score(residuals)?,
            qq,
        })
    }

    /// Ljung-Box result as a value
    pub fn ljung_box(&self) -> LjungBox {
        LjungBox {
            q: self.ljung_box_q,
            dof: self.ljung_box_dof,
            p_value: self.ljung_box_p_value,
        }
    }
}
