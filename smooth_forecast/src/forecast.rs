//! Multi-step projection of a fitted state with prediction intervals

use crate::error::{ForecastError, Result};
use crate::models::{FittedState, ForecastResult, SeasonalType};
use series_math::distribution::z_score;

/// Project `state` forward `horizon` periods.
///
/// Point forecasts follow the damped-trend sum `L + Σ_{j=1}^{h} φ^{j-1} T`
/// and apply the latest seasonal factor of the target phase. The interval
/// half-width is
///
/// ```text
/// z · sqrt(σ² · (1 + 0.1 h) · (1 + sqrt(h) / 10))
/// ```
///
/// where σ² is the mean squared in-sample residual after warm-up. The
/// inflation factor is empirical and kept for compatibility with previously
/// reported intervals.
pub fn forecast(
    state: &FittedState,
    horizon: usize,
    confidence_level: f64,
) -> Result<ForecastResult> {
    if horizon == 0 {
        return Err(ForecastError::InvalidInput(
            "Forecast horizon must be at least 1".to_string(),
        ));
    }
    let z = z_score(confidence_level)?;

    let point = point_forecasts(state, horizon)?;
    let variance = state.residual_variance();

    let mut lower = Vec::with_capacity(horizon);
    let mut upper = Vec::with_capacity(horizon);
    for (i, &p) in point.iter().enumerate() {
        let h = (i + 1) as f64;
        let half_width = z * (variance * (1.0 + 0.1 * h) * (1.0 + h.sqrt() / 10.0)).sqrt();
        lower.push(p - half_width);
        upper.push(p + half_width);
    }

    ForecastResult::new(point, lower, upper, Some(state.params), confidence_level)
}

/// Point forecasts only, without interval computation
pub fn point_forecasts(state: &FittedState, horizon: usize) -> Result<Vec<f64>> {
    if state.is_empty() {
        return Err(ForecastError::InsufficientData(
            "Cannot forecast from an empty state".to_string(),
        ));
    }

    let n = state.len();
    let level = state.last_level();
    let trend = state.last_trend();
    let phi = state.params.phi();
    let seasonal_type = state.params.seasonal_type();

    let mut values = Vec::with_capacity(horizon);
    let mut damped_sum = 0.0;
    let mut phi_power = 1.0;
    for h in 1..=horizon {
        damped_sum += phi_power;
        phi_power *= phi;

        let base = match trend {
            Some(t) => level + damped_sum * t,
            None => level,
        };
        let value = match (seasonal_type, state.seasonal_factor_for(n - 1 + h)) {
            (Some(SeasonalType::Additive), Some(s)) => base + s,
            (Some(SeasonalType::Multiplicative), Some(s)) => base * s,
            _ => base,
        };

        if !value.is_finite() {
            return Err(ForecastError::NumericalInstability(format!(
                "Forecast diverged to a non-finite value at horizon {}",
                h
            )));
        }
        values.push(value);
    }

    Ok(values)
}
