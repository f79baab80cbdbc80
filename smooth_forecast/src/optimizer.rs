//! Grid search over smoothing parameters
//!
//! Every grid point is fitted on the training split, projected over the
//! holdout and scored by RMSE (MAE breaks ties, then grid order). The sweep
//! runs on a rayon parallel iterator; the reduction uses a total order over
//! `(rmse, mae, index)`, so the winner does not depend on scheduling.

use crate::error::{ForecastError, Result};
use crate::forecast::point_forecasts;
use crate::metrics::{mean_absolute_error, root_mean_squared_error};
use crate::models::exponential_smoothing::fit;
use crate::models::{FittedState, ModelKind, SeasonalType, SmoothingParameters};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info};

/// Discretised parameter grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Level smoothing candidates
    pub alphas: Vec<f64>,
    /// Trend smoothing candidates, dense near zero
    pub betas: Vec<f64>,
    /// Seasonal smoothing candidates
    pub gammas: Vec<f64>,
    /// Damping factors tried in addition to the undamped trend
    pub dampings: Vec<f64>,
    /// Share of the series held out when no explicit holdout is given
    pub holdout_fraction: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            alphas: (1..=19).map(|i| i as f64 * 0.05).collect(),
            betas: vec![
                0.001, 0.002, 0.003, 0.005, 0.0075, 0.01, 0.02, 0.03, 0.04, 0.05, 0.1, 0.2, 0.3,
                0.4, 0.5,
            ],
            gammas: vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.3, 0.5],
            dampings: vec![0.8, 0.85, 0.9, 0.95, 0.98],
            holdout_fraction: 0.2,
        }
    }
}

impl GridConfig {
    /// Check every grid value against its parameter range
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("alpha", &self.alphas),
            ("beta", &self.betas),
            ("gamma", &self.gammas),
        ];
        for (name, grid) in weights {
            if grid.is_empty() {
                return Err(ForecastError::InvalidParameters(format!(
                    "{} grid is empty",
                    name
                )));
            }
            if let Some(bad) = grid.iter().find(|v| !(**v > 0.0 && **v < 1.0)) {
                return Err(ForecastError::InvalidParameters(format!(
                    "{} grid value {} is outside (0, 1)",
                    name, bad
                )));
            }
        }
        if let Some(bad) = self.dampings.iter().find(|v| !(**v > 0.0 && **v <= 1.0)) {
            return Err(ForecastError::InvalidParameters(format!(
                "damping grid value {} is outside (0, 1]",
                bad
            )));
        }
        if !(self.holdout_fraction >= 0.0 && self.holdout_fraction < 1.0) {
            return Err(ForecastError::InvalidParameters(format!(
                "holdout fraction must be in [0, 1), got {}",
                self.holdout_fraction
            )));
        }
        Ok(())
    }
}

/// Cooperative cancellation flag checked between grid points
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }
}

/// Score of one evaluated grid point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridEvaluation {
    /// Position of the point in the grid
    pub index: usize,
    pub params: SmoothingParameters,
    pub rmse: f64,
    pub mae: f64,
}

impl GridEvaluation {
    fn rank(&self, other: &Self) -> Ordering {
        self.rmse
            .total_cmp(&other.rmse)
            .then(self.mae.total_cmp(&other.mae))
            .then(self.index.cmp(&other.index))
    }
}

/// Callback invoked for every scored grid point
pub type GridObserver = Arc<dyn Fn(&GridEvaluation) + Send + Sync>;

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// Winning grid point and its holdout (or in-sample) score
    pub best: GridEvaluation,
    /// State refit on the entire series with the winning parameters
    pub state: FittedState,
    /// Holdout length actually used, 0 for in-sample scoring
    pub holdout: usize,
    /// Number of grid points that produced a finite score
    pub evaluated: usize,
}

impl GridSearchResult {
    pub fn params(&self) -> &SmoothingParameters {
        &self.best.params
    }
}

/// Grid search optimizer for one model family
#[derive(Clone)]
pub struct GridSearchOptimizer {
    kind: ModelKind,
    config: GridConfig,
    period: Option<usize>,
    seasonal_type: SeasonalType,
    search_damping: bool,
    holdout: Option<usize>,
    cancellation: Option<CancellationToken>,
    observer: Option<GridObserver>,
}

impl fmt::Debug for GridSearchOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSearchOptimizer")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("period", &self.period)
            .field("seasonal_type", &self.seasonal_type)
            .field("search_damping", &self.search_damping)
            .field("holdout", &self.holdout)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl GridSearchOptimizer {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            config: GridConfig::default(),
            period: None,
            seasonal_type: SeasonalType::Additive,
            search_damping: false,
            holdout: None,
            cancellation: None,
            observer: None,
        }
    }

    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// Seasonal period and form for Holt-Winters searches
    pub fn with_seasonality(mut self, period: usize, seasonal_type: SeasonalType) -> Self {
        self.period = Some(period);
        self.seasonal_type = seasonal_type;
        self
    }

    /// Also search the damping grid (double and triple models)
    pub fn with_damping(mut self, search_damping: bool) -> Self {
        self.search_damping = search_damping;
        self
    }

    /// Explicit holdout length; 0 scores in-sample
    pub fn with_holdout(mut self, holdout: usize) -> Self {
        self.holdout = Some(holdout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_observer(mut self, observer: GridObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn damping_options(&self) -> Vec<Option<f64>> {
        let mut options = vec![None];
        if self.search_damping {
            options.extend(self.config.dampings.iter().map(|&phi| Some(phi)));
        }
        options
    }

    /// Every parameter set in the grid, in evaluation order
    pub fn candidates(&self) -> Result<Vec<SmoothingParameters>> {
        self.config.validate()?;
        let alphas = &self.config.alphas;
        let betas = &self.config.betas;

        let mut grid = Vec::new();
        match self.kind {
            ModelKind::Naive => {
                return Err(ForecastError::InvalidParameters(
                    "naive model has no parameters to search".to_string(),
                ))
            }
            ModelKind::Simple => {
                grid.extend(alphas.iter().map(|&alpha| SmoothingParameters::Simple { alpha }));
            }
            ModelKind::Holt | ModelKind::Double => {
                let dampings = if self.kind == ModelKind::Holt {
                    vec![None]
                } else {
                    self.damping_options()
                };
                for &alpha in alphas {
                    for &beta in betas {
                        for &damping in &dampings {
                            grid.push(SmoothingParameters::Double {
                                alpha,
                                beta,
                                damping,
                            });
                        }
                    }
                }
            }
            ModelKind::Triple => {
                let period = self.period.ok_or_else(|| {
                    ForecastError::InvalidParameters(
                        "Holt-Winters search needs a seasonal period".to_string(),
                    )
                })?;
                let dampings = self.damping_options();
                for &alpha in alphas {
                    for &beta in betas {
                        for &gamma in &self.config.gammas {
                            for &damping in &dampings {
                                grid.push(SmoothingParameters::Triple {
                                    alpha,
                                    beta,
                                    gamma,
                                    period,
                                    seasonal_type: self.seasonal_type,
                                    damping,
                                });
                            }
                        }
                    }
                }
            }
        }

        if let Some(first) = grid.first() {
            first.validate()?;
        }
        Ok(grid)
    }

    /// Holdout length for a series of `n` points given the model's minimum
    /// training length
    fn holdout_for(&self, n: usize, min_train: usize) -> usize {
        let requested = self.holdout.unwrap_or_else(|| {
            ((n as f64 * self.config.holdout_fraction).round() as usize).max(1)
        });
        let allowed = n.saturating_sub(min_train);
        if requested > allowed {
            debug!(requested, allowed, "holdout shrunk to keep a trainable split");
        }
        requested.min(allowed)
    }

    /// Search the grid on `data` for a model that will forecast `horizon` steps
    pub fn search(&self, data: &[f64], horizon: usize) -> Result<GridSearchResult> {
        let n = data.len();
        if n < 3 {
            return Err(ForecastError::InsufficientData(format!(
                "Grid search needs at least 3 observations, got {}",
                n
            )));
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "Non-finite observation at index {}",
                pos
            )));
        }

        let grid = self.candidates()?;
        let min_train = grid.first().map_or(2, |p| p.min_observations());
        if n < min_train {
            return Err(ForecastError::InsufficientData(format!(
                "{} search needs at least {} observations, got {}",
                self.kind, min_train, n
            )));
        }

        let holdout = self.holdout_for(n, min_train);
        let (train, test) = data.split_at(n - holdout);
        info!(
            kind = %self.kind,
            points = grid.len(),
            n,
            holdout,
            horizon,
            "starting grid search"
        );

        let evaluated = AtomicUsize::new(0);
        let best = grid
            .par_iter()
            .enumerate()
            .filter_map(|(index, params)| {
                if self
                    .cancellation
                    .as_ref()
                    .map_or(false, CancellationToken::is_cancelled)
                {
                    return None;
                }
                let scored = match score(params, data, train, test) {
                    Ok(Some((rmse, mae))) => GridEvaluation {
                        index,
                        params: *params,
                        rmse,
                        mae,
                    },
                    Ok(None) => return None,
                    Err(err) => {
                        debug!(params = %params, error = %err, "grid point skipped");
                        return None;
                    }
                };
                evaluated.fetch_add(1, AtomicOrdering::Relaxed);
                if let Some(observer) = &self.observer {
                    observer(&scored);
                }
                Some(scored)
            })
            .min_by(|a, b| a.rank(b));

        let evaluated = evaluated.into_inner();
        if self
            .cancellation
            .as_ref()
            .map_or(false, CancellationToken::is_cancelled)
        {
            return Err(ForecastError::Cancelled(evaluated));
        }

        let best = best.ok_or_else(|| {
            ForecastError::NumericalInstability(
                "No grid point produced a finite score".to_string(),
            )
        })?;
        let state = fit(data, &best.params)?;

        info!(
            params = %best.params,
            rmse = best.rmse,
            mae = best.mae,
            evaluated,
            "grid search finished"
        );

        Ok(GridSearchResult {
            best,
            state,
            holdout,
            evaluated,
        })
    }
}

/// RMSE and MAE of one grid point, `None` if the score is not finite
fn score(
    params: &SmoothingParameters,
    data: &[f64],
    train: &[f64],
    test: &[f64],
) -> Result<Option<(f64, f64)>> {
    let (rmse, mae) = if test.is_empty() {
        let state = fit(data, params)?;
        let (actual, fitted) = state.evaluation_window();
        (
            root_mean_squared_error(actual, &fitted)?,
            mean_absolute_error(actual, &fitted)?,
        )
    } else {
        let state = fit(train, params)?;
        let predicted = point_forecasts(&state, test.len())?;
        (
            root_mean_squared_error(test, &predicted)?,
            mean_absolute_error(test, &predicted)?,
        )
    };

    if rmse.is_finite() && mae.is_finite() {
        Ok(Some((rmse, mae)))
    } else {
        Ok(None)
    }
}
