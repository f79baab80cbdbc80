//! Default smoothing parameters derived from series statistics
//!
//! Used when a caller neither supplies parameters nor asks for a grid
//! search. The weights are rules of thumb, not estimates:
//! - α rises with the coefficient of variation (noisier level, faster update)
//! - β is larger when the OLS trend moves the level noticeably over the series
//! - γ is fixed; the period comes from the strongest autocorrelation lag

use crate::error::{ForecastError, Result};
use crate::models::{ModelKind, SeasonalType, SmoothingParameters};
use series_math::SeriesStats;
use tracing::debug;

/// Minimum |ρ| at the detected lag for the series to count as seasonal
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.3;

/// Relative trend above which the larger trend weight is used
const TREND_THRESHOLD: f64 = 0.1;

/// Level weight biased by variability
pub fn suggest_alpha(stats: &SeriesStats) -> f64 {
    match stats.coefficient_of_variation {
        Some(cv) => (0.2 + 0.5 * cv.abs().min(1.0)).clamp(0.1, 0.9),
        None => 0.3,
    }
}

/// Trend weight from the relative trend strength
pub fn suggest_beta(stats: &SeriesStats) -> f64 {
    match stats.relative_trend() {
        Some(rel) if rel > TREND_THRESHOLD => 0.1,
        Some(_) => 0.02,
        None => 0.05,
    }
}

/// Seasonal period if the autocorrelation scan found a strong enough lag
pub fn suggest_period(stats: &SeriesStats) -> Option<usize> {
    stats
        .seasonal_period
        .filter(|_| stats.seasonal_strength >= SEASONAL_STRENGTH_THRESHOLD)
}

/// Heuristic parameters for `kind`.
///
/// Holt-Winters uses `period` when given, otherwise the detected one, and
/// fails with `InvalidParameters` when neither exists.
pub fn suggest_parameters(
    data: &[f64],
    kind: ModelKind,
    period: Option<usize>,
    seasonal_type: SeasonalType,
    damping: Option<f64>,
) -> Result<SmoothingParameters> {
    let stats = SeriesStats::compute(data)?;
    let alpha = suggest_alpha(&stats);
    let beta = suggest_beta(&stats);
    debug!(alpha, beta, cv = ?stats.coefficient_of_variation, "heuristic parameters");

    match kind {
        ModelKind::Naive => Err(ForecastError::InvalidParameters(
            "naive model has no smoothing parameters".to_string(),
        )),
        ModelKind::Simple => SmoothingParameters::simple(alpha),
        ModelKind::Holt => SmoothingParameters::double(alpha, beta, None),
        ModelKind::Double => SmoothingParameters::double(alpha, beta, damping),
        ModelKind::Triple => {
            let period = period.or_else(|| suggest_period(&stats)).ok_or_else(|| {
                ForecastError::InvalidParameters(
                    "no seasonal period given and none detected".to_string(),
                )
            })?;
            SmoothingParameters::triple(alpha, beta, 0.1, period, seasonal_type, damping)
        }
    }
}
