//! Request/report surface tying the pipeline together
//!
//! A request names a series, a smoothing configuration, a horizon and a
//! confidence level. The engine validates the shape up front, picks or
//! searches parameters, fits on the full series, forecasts, and attaches
//! accuracy metrics and residual diagnostics. Series that are too short for
//! the requested model degrade to a simpler one and the report says so.

use crate::data::TimeSeries;
use crate::diagnostics::DiagnosticsReport;
use crate::error::{ForecastError, Result};
use crate::heuristics::{suggest_parameters, suggest_period};
use crate::metrics::{self, AccuracyReport};
use crate::models::exponential_smoothing::fit;
use crate::models::naive::NaiveModel;
use crate::models::{
    FittedState, ForecastInterval, ForecastModel, ModelKind, SeasonalType, SmoothingParameters,
    TrainedForecastModel,
};
use crate::optimizer::{CancellationToken, GridConfig, GridObserver, GridSearchOptimizer};
use crate::utils::future_timestamps;
use serde::{Deserialize, Serialize};
use series_math::distribution::z_score;
use series_math::SeriesStats;
use tracing::{info, warn};

/// Smoothing configuration of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmoothingConfig {
    /// Model family
    pub mode: ModelKind,
    /// Search the parameter grid instead of using heuristics
    pub grid_search: bool,
    /// Explicit parameters; these override `mode` and `grid_search`
    pub params: Option<SmoothingParameters>,
    /// Seasonal period for Holt-Winters, detected when absent
    pub seasonal_period: Option<usize>,
    pub seasonal_type: SeasonalType,
    /// Allow a damped trend
    pub damped: bool,
    /// Explicit holdout length for the grid search
    pub holdout: Option<usize>,
    pub grid: GridConfig,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            mode: ModelKind::Holt,
            grid_search: true,
            params: None,
            seasonal_period: None,
            seasonal_type: SeasonalType::Additive,
            damped: false,
            holdout: None,
            grid: GridConfig::default(),
        }
    }
}

fn default_confidence() -> f64 {
    0.95
}

/// A forecasting request for one named series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub field: String,
    /// Epoch milliseconds, either empty or one per value
    #[serde(default)]
    pub timestamps: Vec<i64>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub config: SmoothingConfig,
    pub horizon: usize,
    #[serde(default = "default_confidence")]
    pub confidence_level: f64,
}

impl ForecastRequest {
    pub fn new(field: &str, values: Vec<f64>, horizon: usize) -> Self {
        Self {
            field: field.to_string(),
            timestamps: Vec::new(),
            values,
            config: SmoothingConfig::default(),
            horizon,
            confidence_level: default_confidence(),
        }
    }

    pub fn with_config(mut self, config: SmoothingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_timestamps(mut self, timestamps: Vec<i64>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn with_confidence(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Parse a request from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validated series view of the request
    pub fn series(&self) -> Result<TimeSeries> {
        if self.timestamps.is_empty() {
            Ok(TimeSeries::from_values(self.values.clone())?.named(&self.field))
        } else {
            TimeSeries::with_timestamps(&self.field, self.timestamps.clone(), self.values.clone())
        }
    }
}

/// Forecast output record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub field: String,
    /// Model family that produced the forecast
    pub model: ModelKind,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub damping: Option<f64>,
    pub seasonal_period: Option<usize>,
    pub seasonal_type: Option<SeasonalType>,
    /// In-sample accuracy over the post-warm-up window
    pub metrics: Option<AccuracyReport>,
    pub point_forecasts: Vec<f64>,
    pub intervals: Vec<ForecastInterval>,
    pub confidence_level: f64,
    /// One-step-ahead in-sample predictions, `null` during warm-up
    pub fitted_train: Vec<Option<f64>>,
    /// Final level
    pub level: Option<f64>,
    /// Final trend
    pub trend: Option<f64>,
    pub forecast_timestamps: Option<Vec<i64>>,
    pub diagnostics: Option<DiagnosticsReport>,
    /// Why the engine used a simpler model than requested, if it did
    pub fallback: Option<String>,
}

impl ForecastReport {
    /// Encode the report as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode the report as indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs forecasting requests
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    cancellation: Option<CancellationToken>,
    observer: Option<GridObserverHandle>,
}

#[derive(Clone)]
struct GridObserverHandle(GridObserver);

impl std::fmt::Debug for GridObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GridObserver")
    }
}

/// Resolved choice of model before fitting
enum Plan {
    Naive,
    Fixed(SmoothingParameters),
    Search(GridSearchOptimizer),
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token checked between grid points of any search this engine runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Callback receiving every scored grid point
    pub fn with_observer(mut self, observer: GridObserver) -> Self {
        self.observer = Some(GridObserverHandle(observer));
        self
    }

    /// Run a request end to end
    pub fn run(&self, request: &ForecastRequest) -> Result<ForecastReport> {
        if request.horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }
        z_score(request.confidence_level)?;
        let series = request.series()?;
        let values = series.values();
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Forecasting needs at least 2 observations, got {}",
                values.len()
            )));
        }

        let mut fallback = None;
        let plan = self.plan(&request.config, values, &mut fallback)?;

        let mut report = match plan {
            Plan::Naive => naive_report(&series, request)?,
            Plan::Fixed(params) => {
                let state = fit(values, &params)?;
                state_report(&series, request, &state)?
            }
            Plan::Search(optimizer) => match optimizer.search(values, request.horizon) {
                Ok(result) => state_report(&series, request, &result.state)?,
                Err(ForecastError::NumericalInstability(detail)) => {
                    let reason = format!("{}; used naive", detail);
                    warn!(%reason, "falling back to naive forecast");
                    fallback = Some(reason);
                    naive_report(&series, request)?
                }
                Err(err) => return Err(err),
            },
        };
        report.fallback = fallback;

        info!(
            field = %report.field,
            model = %report.model,
            horizon = request.horizon,
            fallback = report.fallback.is_some(),
            "forecast complete"
        );
        Ok(report)
    }

    fn plan(
        &self,
        config: &SmoothingConfig,
        values: &[f64],
        fallback: &mut Option<String>,
    ) -> Result<Plan> {
        let n = values.len();
        let damping_hint = if config.damped { Some(0.98) } else { None };

        if let Some(params) = config.params {
            params.validate()?;
            if n < params.min_observations() {
                let reason = format!(
                    "{} observations are fewer than the {} a seasonal fit needs; used Holt",
                    n,
                    params.min_observations()
                );
                warn!(%reason, "falling back to double exponential smoothing");
                *fallback = Some(reason);
                return Ok(Plan::Fixed(SmoothingParameters::double(
                    params.alpha(),
                    params.beta().unwrap_or(0.1),
                    params.damping(),
                )?));
            }
            return Ok(Plan::Fixed(params));
        }

        let mut kind = config.mode;
        let mut period = config.seasonal_period;
        if kind == ModelKind::Triple {
            if period.is_none() {
                period = suggest_period(&SeriesStats::compute(values)?);
            }
            match period {
                None => {
                    let reason = "no seasonal period given or detected; used Holt".to_string();
                    warn!(%reason, "falling back to double exponential smoothing");
                    *fallback = Some(reason);
                    kind = ModelKind::Double;
                }
                Some(m) if n < 2 * m => {
                    let reason = format!(
                        "{} observations are fewer than two seasonal cycles of {}; used Holt",
                        n, m
                    );
                    warn!(%reason, "falling back to double exponential smoothing");
                    *fallback = Some(reason);
                    kind = ModelKind::Double;
                }
                Some(_) => {}
            }
        }

        if kind == ModelKind::Naive {
            return Ok(Plan::Naive);
        }

        if !config.grid_search {
            return Ok(Plan::Fixed(suggest_parameters(
                values,
                kind,
                period,
                config.seasonal_type,
                damping_hint,
            )?));
        }

        if n < 3 {
            let reason = format!("{} observations are too few to search; used naive", n);
            warn!(%reason, "falling back to naive forecast");
            *fallback = Some(reason);
            return Ok(Plan::Naive);
        }

        let mut optimizer = GridSearchOptimizer::new(kind)
            .with_config(config.grid.clone())
            .with_damping(config.damped);
        if let (ModelKind::Triple, Some(m)) = (kind, period) {
            optimizer = optimizer.with_seasonality(m, config.seasonal_type);
        }
        if let Some(holdout) = config.holdout {
            optimizer = optimizer.with_holdout(holdout);
        }
        if let Some(token) = &self.cancellation {
            optimizer = optimizer.with_cancellation(token.clone());
        }
        if let Some(GridObserverHandle(observer)) = &self.observer {
            optimizer = optimizer.with_observer(observer.clone());
        }
        Ok(Plan::Search(optimizer))
    }
}

fn state_report(
    series: &TimeSeries,
    request: &ForecastRequest,
    state: &FittedState,
) -> Result<ForecastReport> {
    let forecast = state.forecast(request.horizon, request.confidence_level)?;
    let params = state.params();

    let diagnostics = match DiagnosticsReport::from_state(state) {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(error = %err, "residual diagnostics unavailable");
            None
        }
    };

    Ok(ForecastReport {
        field: series.field().to_string(),
        model: params.kind(),
        alpha: Some(params.alpha()),
        beta: params.beta(),
        gamma: params.gamma(),
        damping: params.damping(),
        seasonal_period: params.period(),
        seasonal_type: params.seasonal_type(),
        metrics: accuracy_or_none(AccuracyReport::from_state(state)),
        point_forecasts: forecast.point().to_vec(),
        intervals: forecast.intervals(),
        confidence_level: request.confidence_level,
        fitted_train: state.fitted().to_vec(),
        level: Some(state.last_level()),
        trend: state.last_trend(),
        forecast_timestamps: series
            .timestamps()
            .and_then(|ts| future_timestamps(ts, request.horizon)),
        diagnostics,
        fallback: None,
    })
}

/// Metrics that overflow are reported as missing
fn accuracy_or_none(result: Result<AccuracyReport>) -> Option<AccuracyReport> {
    match result {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(error = %err, "accuracy metrics unavailable");
            None
        }
    }
}

fn naive_report(series: &TimeSeries, request: &ForecastRequest) -> Result<ForecastReport> {
    let trained = NaiveModel.train(series.values())?;
    let forecast = trained.forecast(request.horizon, request.confidence_level)?;

    let actual = &series.values()[1..];
    let predicted = &series.values()[..series.len() - 1];
    let accuracy = if actual.is_empty() {
        None
    } else {
        accuracy_or_none(metrics::evaluate(actual, predicted, 0))
    };

    Ok(ForecastReport {
        field: series.field().to_string(),
        model: ModelKind::Naive,
        alpha: None,
        beta: None,
        gamma: None,
        damping: None,
        seasonal_period: None,
        seasonal_type: None,
        metrics: accuracy,
        point_forecasts: forecast.point().to_vec(),
        intervals: forecast.intervals(),
        confidence_level: request.confidence_level,
        fitted_train: trained.fitted().to_vec(),
        level: Some(trained.last_value()),
        trend: None,
        forecast_timestamps: series
            .timestamps()
            .and_then(|ts| future_timestamps(ts, request.horizon)),
        diagnostics: None,
        fallback: None,
    })
}
