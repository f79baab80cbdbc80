//! Distribution helpers: normal quantiles, chi-square tails and Q-Q coordinates

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::gamma::checked_gamma_ur;

/// Two-sided z-score for a confidence level.
///
/// The common levels use the fixed table values (1.282, 1.645, 1.96, 2.576)
/// so reported intervals stay reproducible; any other level in (0, 1) falls
/// back to the exact standard-normal quantile.
pub fn z_score(confidence_level: f64) -> Result<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {}",
            confidence_level
        )));
    }

    let table = [(0.80, 1.282), (0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];
    if let Some(&(_, z)) = table
        .iter()
        .find(|(level, _)| (confidence_level - level).abs() < 1e-9)
    {
        return Ok(z);
    }

    normal_quantile(0.5 + confidence_level / 2.0)
}

/// Standard-normal quantile function
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Probability must be in (0, 1), got {}",
            p
        )));
    }

    let normal =
        Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Upper-tail probability P(X > x) for X ~ chi-square(dof).
///
/// Evaluated through the regularized upper incomplete gamma function
/// Q(dof/2, x/2).
pub fn chi_square_sf(x: f64, dof: usize) -> Result<f64> {
    if dof == 0 {
        return Err(MathError::InvalidInput(
            "Chi-square degrees of freedom must be positive".to_string(),
        ));
    }
    if !x.is_finite() || x < 0.0 {
        return Err(MathError::InvalidInput(format!(
            "Chi-square statistic must be finite and non-negative, got {}",
            x
        )));
    }
    if x == 0.0 {
        return Ok(1.0);
    }

    let p = checked_gamma_ur(dof as f64 / 2.0, x / 2.0)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(p.clamp(0.0, 1.0))
}

/// Normal Q-Q plot coordinates as `(theoretical, sample)`.
///
/// Theoretical quantiles use the plotting positions `(i + 0.5) / n` and the
/// sample side is the sorted data.
pub fn qq_normal(values: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = values.len();
    if n < 3 {
        return Err(MathError::InsufficientData(
            "Q-Q coordinates need at least 3 points".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Q-Q coordinates require finite values".to_string(),
        ));
    }

    let mut sample = values.to_vec();
    sample.sort_by(f64::total_cmp);

    let nf = n as f64;
    let theoretical = (0..n)
        .map(|i| normal_quantile((i as f64 + 0.5) / nf))
        .collect::<Result<Vec<f64>>>()?;

    Ok((theoretical, sample))
}
