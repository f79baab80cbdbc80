//! Naive last-value model used when a series is too short to smooth

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use series_math::distribution::z_score;

/// Naive forecaster
#[derive(Debug, Clone, Default)]
pub struct NaiveModel;

/// Trained naive model
#[derive(Debug, Clone)]
pub struct TrainedNaive {
    /// Last observed value
    last_value: f64,
    /// Mean squared one-step change, the naive residual variance
    step_variance: f64,
    /// Previous observation as the one-step prediction, `None` for the first
    fitted: Vec<Option<f64>>,
}

impl TrainedNaive {
    pub fn last_value(&self) -> f64 {
        self.last_value
    }
}

impl ForecastModel for NaiveModel {
    type Trained = TrainedNaive;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        let last_value = *data.last().ok_or_else(|| {
            ForecastError::InsufficientData("Empty time series data".to_string())
        })?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let step_variance = if data.len() < 2 {
            0.0
        } else {
            data.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>()
                / (data.len() - 1) as f64
        };

        let fitted = std::iter::once(None)
            .chain(data[..data.len() - 1].iter().map(|&v| Some(v)))
            .collect();

        Ok(TrainedNaive {
            last_value,
            step_variance,
            fitted,
        })
    }

    fn name(&self) -> String {
        "Naive".to_string()
    }
}

impl TrainedForecastModel for TrainedNaive {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }
        let z = z_score(confidence_level)?;

        let point = vec![self.last_value; horizon];
        // random-walk error variance grows linearly with the horizon
        let half_widths: Vec<f64> = (1..=horizon)
            .map(|h| z * (self.step_variance * h as f64).sqrt())
            .collect();
        let lower = point.iter().zip(&half_widths).map(|(p, w)| p - w).collect();
        let upper = point.iter().zip(&half_widths).map(|(p, w)| p + w).collect();

        ForecastResult::new(point, lower, upper, None, confidence_level)
    }

    fn fitted(&self) -> &[Option<f64>] {
        &self.fitted
    }

    fn name(&self) -> String {
        "Naive".to_string()
    }
}
