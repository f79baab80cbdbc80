//! Exponential smoothing models for time series forecasting
//!
//! One recursion covers the three families:
//!
//! ```text
//! Simple:   L_t = α x_t + (1 - α) L_{t-1}
//!           ŷ_t = L_{t-1}
//! Double:   L_t = α x_t + (1 - α)(L_{t-1} + φ T_{t-1})
//!           T_t = β (L_t - L_{t-1}) + (1 - β) φ T_{t-1}
//!           ŷ_t = L_{t-1} + φ T_{t-1}
//! Triple:   L_t = α (x_t - S_{t-m}) + (1 - α)(L_{t-1} + φ T_{t-1})
//!           S_t = γ (x_t - L_t) + (1 - γ) S_{t-m}
//!           ŷ_t = L_{t-1} + φ T_{t-1} + S_{t-m}
//! ```
//!
//! The multiplicative seasonal form divides by the seasonal factor (and the
//! level) instead of subtracting, and multiplies the fitted value by it.

use crate::error::{ForecastError, Result};
use crate::forecast;
use crate::models::{
    FittedState, ForecastModel, ForecastResult, SeasonalType, SmoothingParameters,
    TrainedForecastModel,
};
use series_math::stats::linear_trend_slope;
use tracing::{debug, warn};

/// Smallest magnitude allowed for a multiplicative divisor
pub const DIVISOR_FLOOR: f64 = 0.001;

/// Prefix length used for the non-seasonal level and trend seeds
const NON_SEASONAL_SEED: usize = 4;

/// Fit a model to `data` and return its full state.
///
/// Fails with `InsufficientData` for fewer than 2 observations (or fewer than
/// two seasonal cycles for Holt-Winters) and with `InvalidInput` for
/// non-finite observations.
pub fn fit(data: &[f64], params: &SmoothingParameters) -> Result<FittedState> {
    params.validate()?;

    let n = data.len();
    if n < params.min_observations() {
        return Err(ForecastError::InsufficientData(format!(
            "{} model needs at least {} observations, got {}",
            params.kind(),
            params.min_observations(),
            n
        )));
    }
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidInput(format!(
            "Non-finite observation at index {}",
            pos
        )));
    }

    let seed_len = params.period().unwrap_or(NON_SEASONAL_SEED).min(n / 2);
    let seed = &data[..seed_len];
    let level0 = seed.iter().sum::<f64>() / seed_len as f64;
    let trend0 = linear_trend_slope(seed);

    let warm_up = params.warm_up();
    let phi = params.phi();
    let alpha = params.alpha();

    let mut level = vec![level0; n];
    let mut trend = params.beta().map(|_| vec![trend0; n]);
    let mut seasonal = match (params.period(), params.seasonal_type()) {
        (Some(m), Some(kind)) => {
            let mut factors = initial_seasonal(data, m, kind);
            factors.resize(n + m, 0.0);
            for t in 0..warm_up {
                factors[t + m] = factors[t];
            }
            Some(factors)
        }
        _ => None,
    };
    let mut fitted = vec![None; n];
    let mut floor_hits = 0usize;

    for t in warm_up..n {
        let x = data[t];
        let prev_level = level[t - 1];
        let prev_trend = trend.as_ref().map_or(0.0, |tr| tr[t - 1]);
        let base = prev_level + phi * prev_trend;

        let new_level = match (seasonal.as_mut(), params) {
            (
                Some(factors),
                SmoothingParameters::Triple {
                    gamma,
                    period,
                    seasonal_type,
                    ..
                },
            ) => {
                let s_prev = factors[t];
                let (fit_t, new_level, new_season) = match seasonal_type {
                    SeasonalType::Additive => {
                        let l = alpha * (x - s_prev) + (1.0 - alpha) * base;
                        (base + s_prev, l, gamma * (x - l) + (1.0 - gamma) * s_prev)
                    }
                    SeasonalType::Multiplicative => {
                        let (s_div, s_floored) = floored(s_prev);
                        let l = alpha * (x / s_div) + (1.0 - alpha) * base;
                        let (l_div, l_floored) = floored_magnitude(l);
                        floor_hits += usize::from(s_floored) + usize::from(l_floored);
                        (
                            base * s_prev,
                            l,
                            gamma * (x / l_div) + (1.0 - gamma) * s_prev,
                        )
                    }
                };
                factors[t + *period] = new_season;
                fitted[t] = Some(fit_t);
                new_level
            }
            _ => {
                fitted[t] = Some(base);
                alpha * x + (1.0 - alpha) * base
            }
        };

        level[t] = new_level;
        if let (Some(tr), Some(beta)) = (trend.as_mut(), params.beta()) {
            tr[t] = beta * (new_level - prev_level) + (1.0 - beta) * phi * prev_trend;
        }
    }

    if floor_hits > 0 {
        warn!(
            floor_hits,
            floor = DIVISOR_FLOOR,
            "multiplicative divisor clamped during fit"
        );
    }
    if let Some(pos) = level.iter().position(|l| !l.is_finite()) {
        return Err(ForecastError::NumericalInstability(format!(
            "Level became non-finite at index {}",
            pos
        )));
    }
    debug!(params = %params, n, "fitted exponential smoothing model");

    Ok(FittedState {
        params: *params,
        observations: data.to_vec(),
        level,
        trend,
        seasonal,
        fitted,
    })
}

fn floored(value: f64) -> (f64, bool) {
    if value < DIVISOR_FLOOR {
        (DIVISOR_FLOOR, true)
    } else {
        (value, false)
    }
}

fn floored_magnitude(value: f64) -> (f64, bool) {
    if value.abs() < DIVISOR_FLOOR {
        (DIVISOR_FLOOR.copysign(value), true)
    } else {
        (value, false)
    }
}

/// Initial seasonal factors by classical decomposition.
///
/// Each full cycle is centred on its own mean, phases are averaged across
/// cycles, and the factors are normalised to sum to 0 (additive) or to a
/// product of 1 (multiplicative). With fewer than two full cycles the
/// factors are neutral, which is an approximation rather than an estimate.
pub fn initial_seasonal(data: &[f64], period: usize, seasonal_type: SeasonalType) -> Vec<f64> {
    let neutral = match seasonal_type {
        SeasonalType::Additive => 0.0,
        SeasonalType::Multiplicative => 1.0,
    };
    if period == 0 {
        return Vec::new();
    }
    let cycles = data.len() / period;
    if cycles < 2 {
        return vec![neutral; period];
    }

    let mut factors = vec![0.0; period];
    for cycle in data.chunks_exact(period).take(cycles) {
        let cycle_mean = cycle.iter().sum::<f64>() / period as f64;
        for (phase, &x) in cycle.iter().enumerate() {
            factors[phase] += match seasonal_type {
                SeasonalType::Additive => x - cycle_mean,
                SeasonalType::Multiplicative => {
                    if cycle_mean.abs() < DIVISOR_FLOOR {
                        1.0
                    } else {
                        x / cycle_mean
                    }
                }
            };
        }
    }
    for f in factors.iter_mut() {
        *f /= cycles as f64;
    }

    match seasonal_type {
        SeasonalType::Additive => {
            let offset = factors.iter().sum::<f64>() / period as f64;
            factors.iter().map(|f| f - offset).collect()
        }
        SeasonalType::Multiplicative => {
            let floored: Vec<f64> = factors.iter().map(|f| f.max(DIVISOR_FLOOR)).collect();
            let log_mean = floored.iter().map(|f| f.ln()).sum::<f64>() / period as f64;
            let geometric_mean = log_mean.exp();
            floored
                .iter()
                .map(|f| (f / geometric_mean).max(DIVISOR_FLOOR))
                .collect()
        }
    }
}

impl ForecastModel for SmoothingParameters {
    type Trained = FittedState;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        fit(data, self)
    }

    fn name(&self) -> String {
        self.to_string()
    }
}

impl TrainedForecastModel for FittedState {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        forecast::forecast(self, horizon, confidence_level)
    }

    fn fitted(&self) -> &[Option<f64>] {
        &self.fitted
    }

    fn name(&self) -> String {
        self.params.to_string()
    }
}
