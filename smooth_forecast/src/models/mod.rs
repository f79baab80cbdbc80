//! Forecasting models for time series data

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seasonal component form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalType {
    /// Seasonal effect is added to level and trend
    #[default]
    Additive,
    /// Seasonal effect scales level and trend
    Multiplicative,
}

/// Model family requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Last observed value carried forward
    Naive,
    /// Level only
    Simple,
    /// Level and trend, optionally damped
    Double,
    /// Undamped level and trend searched over the dense low-beta grid
    #[default]
    Holt,
    /// Level, trend and season
    Triple,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Naive => "naive",
            ModelKind::Simple => "simple",
            ModelKind::Double => "double",
            ModelKind::Holt => "holt",
            ModelKind::Triple => "triple",
        };
        write!(f, "{}", name)
    }
}

/// Smoothing parameters, one variant per model family.
///
/// Every variant carries exactly the fields its recursion reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SmoothingParameters {
    /// Simple exponential smoothing
    Simple { alpha: f64 },
    /// Holt's linear method
    Double {
        alpha: f64,
        beta: f64,
        #[serde(default)]
        damping: Option<f64>,
    },
    /// Holt-Winters
    Triple {
        alpha: f64,
        beta: f64,
        gamma: f64,
        period: usize,
        #[serde(default)]
        seasonal_type: SeasonalType,
        #[serde(default)]
        damping: Option<f64>,
    },
}

fn check_weight(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(ForecastError::InvalidParameters(format!(
            "{} must be between 0 and 1 (exclusive), got {}",
            name, value
        )));
    }
    Ok(())
}

impl SmoothingParameters {
    /// Validated simple smoothing parameters
    pub fn simple(alpha: f64) -> Result<Self> {
        let params = SmoothingParameters::Simple { alpha };
        params.validate()?;
        Ok(params)
    }

    /// Validated Holt parameters
    pub fn double(alpha: f64, beta: f64, damping: Option<f64>) -> Result<Self> {
        let params = SmoothingParameters::Double {
            alpha,
            beta,
            damping,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validated Holt-Winters parameters
    pub fn triple(
        alpha: f64,
        beta: f64,
        gamma: f64,
        period: usize,
        seasonal_type: SeasonalType,
        damping: Option<f64>,
    ) -> Result<Self> {
        let params = SmoothingParameters::Triple {
            alpha,
            beta,
            gamma,
            period,
            seasonal_type,
            damping,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every field against its valid range
    pub fn validate(&self) -> Result<()> {
        check_weight("alpha", self.alpha())?;
        if let Some(beta) = self.beta() {
            check_weight("beta", beta)?;
        }
        if let Some(gamma) = self.gamma() {
            check_weight("gamma", gamma)?;
        }
        if let Some(phi) = self.damping() {
            if !phi.is_finite() || phi <= 0.0 || phi > 1.0 {
                return Err(ForecastError::InvalidParameters(format!(
                    "damping factor must be in (0, 1], got {}",
                    phi
                )));
            }
        }
        if let Some(period) = self.period() {
            if period < 2 {
                return Err(ForecastError::InvalidParameters(format!(
                    "seasonal period must be at least 2, got {}",
                    period
                )));
            }
        }
        Ok(())
    }

    /// Model family of this parameter set
    pub fn kind(&self) -> ModelKind {
        match self {
            SmoothingParameters::Simple { .. } => ModelKind::Simple,
            SmoothingParameters::Double { .. } => ModelKind::Double,
            SmoothingParameters::Triple { .. } => ModelKind::Triple,
        }
    }

    pub fn alpha(&self) -> f64 {
        match *self {
            SmoothingParameters::Simple { alpha }
            | SmoothingParameters::Double { alpha, .. }
            | SmoothingParameters::Triple { alpha, .. } => alpha,
        }
    }

    pub fn beta(&self) -> Option<f64> {
        match *self {
            SmoothingParameters::Simple { .. } => None,
            SmoothingParameters::Double { beta, .. } | SmoothingParameters::Triple { beta, .. } => {
                Some(beta)
            }
        }
    }

    pub fn gamma(&self) -> Option<f64> {
        match *self {
            SmoothingParameters::Triple { gamma, .. } => Some(gamma),
            _ => None,
        }
    }

    pub fn damping(&self) -> Option<f64> {
        match *self {
            SmoothingParameters::Simple { .. } => None,
            SmoothingParameters::Double { damping, .. }
            | SmoothingParameters::Triple { damping, .. } => damping,
        }
    }

    /// Damping factor applied to the trend, 1 when undamped
    pub fn phi(&self) -> f64 {
        self.damping().unwrap_or(1.0)
    }

    pub fn period(&self) -> Option<usize> {
        match *self {
            SmoothingParameters::Triple { period, .. } => Some(period),
            _ => None,
        }
    }

    pub fn seasonal_type(&self) -> Option<SeasonalType> {
        match *self {
            SmoothingParameters::Triple { seasonal_type, .. } => Some(seasonal_type),
            _ => None,
        }
    }

    pub fn has_trend(&self) -> bool {
        self.beta().is_some()
    }

    /// Damped only when a factor below 1 is set
    pub fn is_damped(&self) -> bool {
        self.damping().map_or(false, |phi| phi < 1.0)
    }

    /// Leading fitted values with no one-step-ahead prediction
    pub fn warm_up(&self) -> usize {
        self.period().unwrap_or(1)
    }

    /// Shortest series this model can be fitted on
    pub fn min_observations(&self) -> usize {
        self.period().map_or(2, |m| 2 * m)
    }

    /// Number of smoothing weights (alpha, beta, gamma) in the recursion
    pub fn smoothing_weights(&self) -> usize {
        1 + usize::from(self.has_trend()) + usize::from(self.gamma().is_some())
    }

    /// Parameter count used by the information criteria.
    ///
    /// Counts the smoothing weights, the damping factor when damped and
    /// `m - 1` free seasonal initial states.
    pub fn parameter_count(&self) -> usize {
        let seasonal_states = self.period().map_or(0, |m| m.saturating_sub(1));
        self.smoothing_weights() + usize::from(self.is_damped()) + seasonal_states
    }
}

impl fmt::Display for SmoothingParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmoothingParameters::Simple { alpha } => write!(f, "Simple(alpha={})", alpha),
            SmoothingParameters::Double {
                alpha,
                beta,
                damping,
            } => {
                write!(f, "Double(alpha={}, beta={}", alpha, beta)?;
                if let Some(phi) = damping {
                    write!(f, ", phi={}", phi)?;
                }
                write!(f, ")")
            }
            SmoothingParameters::Triple {
                alpha,
                beta,
                gamma,
                period,
                seasonal_type,
                damping,
            } => {
                write!(
                    f,
                    "Triple(alpha={}, beta={}, gamma={}, period={}, {:?}",
                    alpha, beta, gamma, period, seasonal_type
                )?;
                if let Some(phi) = damping {
                    write!(f, ", phi={}", phi)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// State produced by one model fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedState {
    pub(crate) params: SmoothingParameters,
    pub(crate) observations: Vec<f64>,
    pub(crate) level: Vec<f64>,
    pub(crate) trend: Option<Vec<f64>>,
    /// Index `i` holds the factor for time `i - m`
    pub(crate) seasonal: Option<Vec<f64>>,
    pub(crate) fitted: Vec<Option<f64>>,
}

impl FittedState {
    pub fn params(&self) -> &SmoothingParameters {
        &self.params
    }

    /// Observations the state was fitted on
    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    pub fn level(&self) -> &[f64] {
        &self.level
    }

    pub fn trend(&self) -> Option<&[f64]> {
        self.trend.as_deref()
    }

    /// Seasonal factors, `n + m` long; index `i` belongs to time `i - m`
    pub fn seasonal(&self) -> Option<&[f64]> {
        self.seasonal.as_deref()
    }

    /// One-step-ahead in-sample predictions, `None` during warm-up
    pub fn fitted(&self) -> &[Option<f64>] {
        &self.fitted
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn warm_up(&self) -> usize {
        self.params.warm_up()
    }

    /// Level at the final observation
    pub fn last_level(&self) -> f64 {
        self.level.last().copied().unwrap_or(0.0)
    }

    /// Trend at the final observation, if the model has one
    pub fn last_trend(&self) -> Option<f64> {
        self.trend.as_ref().and_then(|t| t.last().copied())
    }

    /// Actual and fitted values from the end of warm-up onwards
    pub fn evaluation_window(&self) -> (&[f64], Vec<f64>) {
        let start = self.warm_up().min(self.observations.len());
        let fitted = self.fitted[start..].iter().map(|f| f.unwrap_or(f64::NAN)).collect();
        (&self.observations[start..], fitted)
    }

    /// In-sample residuals `y - ŷ` over the evaluation window
    pub fn residuals(&self) -> Vec<f64> {
        let (actual, fitted) = self.evaluation_window();
        actual.iter().zip(fitted.iter()).map(|(y, f)| y - f).collect()
    }

    /// Mean squared in-sample residual
    pub fn residual_variance(&self) -> f64 {
        let residuals = self.residuals();
        if residuals.is_empty() {
            return 0.0;
        }
        residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64
    }

    /// Most recent seasonal factor for the phase of time `t`
    pub(crate) fn seasonal_factor_for(&self, t: usize) -> Option<f64> {
        let seasonal = self.seasonal.as_ref()?;
        let m = self.params.period()?;
        let n = self.observations.len();
        let phase = t % m;
        let first = n - m;
        let tau = first + (phase + m - first % m) % m;
        seasonal.get(tau + m).copied()
    }
}

/// Forecast interval for a single horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    pub lower: f64,
    pub upper: f64,
    pub point: f64,
}

/// Forecast result containing predicted values and prediction intervals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub(crate) point: Vec<f64>,
    pub(crate) lower: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    /// Parameters of the model that produced the forecast, `None` for naive
    pub(crate) parameters: Option<SmoothingParameters>,
    pub(crate) confidence_level: f64,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        parameters: Option<SmoothingParameters>,
        confidence_level: f64,
    ) -> Result<Self> {
        if point.len() != lower.len() || point.len() != upper.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Point ({}), lower ({}) and upper ({}) lengths differ",
                point.len(),
                lower.len(),
                upper.len()
            )));
        }

        Ok(Self {
            point,
            lower,
            upper,
            parameters,
            confidence_level,
        })
    }

    /// Point forecasts
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn parameters(&self) -> Option<&SmoothingParameters> {
        self.parameters.as_ref()
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Per-horizon intervals
    pub fn intervals(&self) -> Vec<ForecastInterval> {
        self.point
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .map(|(&point, (&lower, &upper))| ForecastInterval {
                lower,
                upper,
                point,
            })
            .collect()
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        if self.point.len() != actual.len() || actual.is_empty() {
            return Err(ForecastError::InvalidInput(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.point.len(),
                actual.len()
            )));
        }

        let sum: f64 = self
            .point
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).abs())
            .sum();

        Ok(sum / actual.len() as f64)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: fmt::Debug {
    /// Generate a forecast with prediction intervals
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult>;

    /// One-step-ahead in-sample predictions
    fn fitted(&self) -> &[Option<f64>];

    /// Name of the model
    fn name(&self) -> String;
}

/// Forecast model that can be trained on a series
pub trait ForecastModel: fmt::Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the observations
    fn train(&self, data: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> String;
}

pub mod exponential_smoothing;
pub mod naive;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_validation() {
        assert!(SmoothingParameters::simple(0.5).is_ok());
        assert!(SmoothingParameters::simple(1.0).is_err());
        assert!(SmoothingParameters::simple(0.0).is_err());
        assert!(SmoothingParameters::double(0.5, 1.2, None).is_err());
        assert!(SmoothingParameters::double(0.5, 0.1, Some(1.0)).is_ok());
        assert!(SmoothingParameters::double(0.5, 0.1, Some(0.0)).is_err());
        assert!(
            SmoothingParameters::triple(0.5, 0.1, 0.1, 1, SeasonalType::Additive, None).is_err()
        );
        assert!(
            SmoothingParameters::triple(0.5, 0.1, f64::NAN, 4, SeasonalType::Additive, None)
                .is_err()
        );
    }

    #[test]
    fn test_parameter_counts() {
        let simple = SmoothingParameters::simple(0.3).unwrap();
        assert_eq!(simple.parameter_count(), 1);
        assert_eq!(simple.warm_up(), 1);
        assert_eq!(simple.min_observations(), 2);

        let damped = SmoothingParameters::double(0.3, 0.1, Some(0.9)).unwrap();
        assert_eq!(damped.parameter_count(), 3);

        let undamped = SmoothingParameters::double(0.3, 0.1, Some(1.0)).unwrap();
        assert_eq!(undamped.parameter_count(), 2);

        let seasonal =
            SmoothingParameters::triple(0.3, 0.1, 0.1, 6, SeasonalType::Additive, None).unwrap();
        assert_eq!(seasonal.parameter_count(), 3 + 5);
        assert_eq!(seasonal.smoothing_weights(), 3);
        assert_eq!(seasonal.warm_up(), 6);
        assert_eq!(seasonal.min_observations(), 12);
    }

    #[test]
    fn test_parameters_serde_tagging() {
        let params =
            SmoothingParameters::triple(0.3, 0.1, 0.2, 4, SeasonalType::Multiplicative, None)
                .unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"kind\":\"triple\""));
        assert!(json.contains("\"seasonal_type\":\"multiplicative\""));

        let parsed: SmoothingParameters =
            serde_json::from_str(r#"{"kind":"double","alpha":0.4,"beta":0.05}"#).unwrap();
        assert_eq!(parsed, SmoothingParameters::double(0.4, 0.05, None).unwrap());
    }

    #[test]
    fn test_forecast_result_length_check() {
        let mismatched =
            ForecastResult::new(vec![1.0, 2.0], vec![0.0], vec![3.0, 4.0], None, 0.95);
        assert!(mismatched.is_err());

        let result = ForecastResult::new(
            vec![105.0, 106.0],
            vec![100.0, 100.0],
            vec![110.0, 112.0],
            None,
            0.95,
        )
        .unwrap();
        assert_eq!(result.horizon(), 2);
        assert_eq!(result.intervals()[1].upper, 112.0);
        assert_eq!(result.mean_absolute_error(&[106.0, 107.0]).unwrap(), 1.0);
    }
}
