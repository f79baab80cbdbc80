use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use smooth_forecast::models::exponential_smoothing::fit;
use smooth_forecast::optimizer::GridEvaluation;
use smooth_forecast::{
    AccuracyReport, CancellationToken, DataLoader, ForecastEngine, ForecastError,
    ForecastRequest, GridConfig, ModelKind, SeasonalType, SmoothingConfig, SmoothingParameters,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

const DAY_MS: i64 = 86_400_000;

fn seasonal_fixture() -> Vec<f64> {
    vec![
        100.0, 120.0, 140.0, 160.0, 180.0, 200.0, 110.0, 130.0, 150.0, 170.0, 190.0, 210.0, 105.0,
        125.0, 145.0, 165.0, 185.0, 205.0,
    ]
}

fn small_grid() -> GridConfig {
    GridConfig {
        alphas: vec![0.1, 0.3, 0.5, 0.7, 0.9],
        betas: vec![0.01, 0.1],
        gammas: vec![0.05, 0.2],
        ..GridConfig::default()
    }
}

fn noisy_trend(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    (0..n)
        .map(|i| 50.0 + 1.5 * i as f64 + noise.sample(&mut rng))
        .collect()
}

#[test]
fn test_explicit_parameters_match_direct_fit() {
    let params =
        SmoothingParameters::triple(0.867, 0.003, 0.0001, 6, SeasonalType::Additive, None)
            .unwrap();
    let config = SmoothingConfig {
        params: Some(params),
        ..SmoothingConfig::default()
    };
    let request = ForecastRequest::new("orders", seasonal_fixture(), 6).with_config(config);
    let report = ForecastEngine::new().run(&request).unwrap();

    let state = fit(&seasonal_fixture(), &params).unwrap();
    assert_eq!(report.metrics, Some(AccuracyReport::from_state(&state).unwrap()));
    assert_eq!(report.model, ModelKind::Triple);
    assert_eq!(report.seasonal_period, Some(6));
    assert_eq!(report.fitted_train.iter().filter(|f| f.is_none()).count(), 6);
    assert_eq!(report.fallback, None);
    assert!((report.point_forecasts[0] - 127.28768449198202).abs() < 1e-6);
}

#[test]
fn test_json_request_to_json_report() {
    let values: Vec<String> = noisy_trend(30, 11).iter().map(|v| v.to_string()).collect();
    let timestamps: Vec<String> = (0..30).map(|i| (i as i64 * DAY_MS).to_string()).collect();
    let json = format!(
        r#"{{"field":"load","values":[{}],"timestamps":[{}],"horizon":3,"confidenceLevel":0.9}}"#,
        values.join(","),
        timestamps.join(",")
    );

    let request = ForecastRequest::from_json(&json).unwrap();
    let report = ForecastEngine::new().run(&request).unwrap();
    assert_eq!(report.model, ModelKind::Double);
    assert_eq!(
        report.forecast_timestamps,
        Some(vec![30 * DAY_MS, 31 * DAY_MS, 32 * DAY_MS])
    );

    let encoded: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(encoded["field"], "load");
    assert_eq!(encoded["model"], "double");
    assert_eq!(encoded["confidenceLevel"], 0.9);
    assert_eq!(encoded["pointForecasts"].as_array().unwrap().len(), 3);
    assert_eq!(encoded["intervals"][0]["point"], encoded["pointForecasts"][0]);
    assert!(encoded["fittedTrain"][0].is_null());
    assert!(encoded["fittedTrain"][1].is_number());
    assert!(encoded["metrics"]["rmse"].is_number());
    assert!(encoded["diagnostics"]["ljung_box_p_value"].is_number());
    assert!(encoded["gamma"].is_null());
}

#[test]
fn test_noisy_trend_forecast_is_sensible() {
    let data = noisy_trend(60, 3);
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("load", data, 5))
        .unwrap();

    // underlying line continues at 50 + 1.5 t
    let expected = 50.0 + 1.5 * 60.0;
    assert!((report.point_forecasts[0] - expected).abs() < 10.0);
    assert!(report.trend.unwrap() > 0.0);
    for interval in &report.intervals {
        assert!(interval.lower < interval.point && interval.point < interval.upper);
    }
    assert!(report.metrics.as_ref().unwrap().r2.unwrap() > 0.8);
}

#[test]
fn test_seasonal_period_is_detected() {
    let pattern = [10.0, -5.0, -5.0, 0.0];
    let data: Vec<f64> = (0..48).map(|t| 100.0 + pattern[t % 4]).collect();
    let config = SmoothingConfig {
        mode: ModelKind::Triple,
        grid: small_grid(),
        ..SmoothingConfig::default()
    };
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("tickets", data, 4).with_config(config))
        .unwrap();

    assert_eq!(report.model, ModelKind::Triple);
    assert_eq!(report.seasonal_period, Some(4));
    assert_eq!(report.seasonal_type, Some(SeasonalType::Additive));
    assert_eq!(report.fallback, None);
    for (p, s) in report.point_forecasts.iter().zip(pattern.iter()) {
        assert!((p - (100.0 + s)).abs() < 1.0, "forecast {p} vs {}", 100.0 + s);
    }
}

#[test]
fn test_short_seasonal_series_falls_back_to_holt() {
    let data: Vec<f64> = (0..10).map(|i| 20.0 + i as f64).collect();
    let config = SmoothingConfig {
        mode: ModelKind::Triple,
        seasonal_period: Some(6),
        grid: small_grid(),
        ..SmoothingConfig::default()
    };
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("x", data.clone(), 2).with_config(config))
        .unwrap();
    assert_eq!(report.model, ModelKind::Double);
    assert!(report.fallback.unwrap().contains("two seasonal cycles"));

    let explicit = SmoothingConfig {
        params: Some(
            SmoothingParameters::triple(0.3, 0.1, 0.1, 6, SeasonalType::Additive, None).unwrap(),
        ),
        ..SmoothingConfig::default()
    };
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("x", data, 2).with_config(explicit))
        .unwrap();
    assert_eq!(report.model, ModelKind::Double);
    assert_eq!(report.alpha, Some(0.3));
    assert!(report.fallback.is_some());
}

#[test]
fn test_two_points_fall_back_to_naive() {
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("x", vec![10.0, 12.0], 3))
        .unwrap();
    assert_eq!(report.model, ModelKind::Naive);
    assert_eq!(report.point_forecasts, vec![12.0, 12.0, 12.0]);
    assert_eq!(report.alpha, None);
    assert_eq!(report.fitted_train, vec![None, Some(10.0)]);
    assert!(report.fallback.is_some());
}

#[test]
fn test_unscorable_grid_falls_back_to_naive() {
    let values: Vec<f64> = (0..10)
        .map(|i| if i % 2 == 0 { 1e160 } else { -1e160 })
        .collect();
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("x", values, 2))
        .unwrap();
    assert_eq!(report.model, ModelKind::Naive);
    assert_eq!(report.point_forecasts, vec![-1e160, -1e160]);
    assert_eq!(report.level, Some(-1e160));
    // squared steps overflow, so no accuracy score is reported
    assert_eq!(report.metrics, None);
    assert!(report.fallback.unwrap().contains("finite score"));
}

#[test]
fn test_extreme_timestamps_skip_forecast_timestamps() {
    let config = SmoothingConfig {
        grid_search: false,
        ..SmoothingConfig::default()
    };
    let request = ForecastRequest::new("x", vec![1.0, 2.0, 3.0], 1)
        .with_config(config)
        .with_timestamps(vec![i64::MIN, 0, i64::MAX]);
    let report = ForecastEngine::new().run(&request).unwrap();
    assert_eq!(report.point_forecasts.len(), 1);
    assert_eq!(report.forecast_timestamps, None);
}

#[test]
fn test_heuristic_parameters_without_search() {
    let config = SmoothingConfig {
        grid_search: false,
        ..SmoothingConfig::default()
    };
    let report = ForecastEngine::new()
        .run(&ForecastRequest::new("x", noisy_trend(40, 5), 2).with_config(config))
        .unwrap();
    let alpha = report.alpha.unwrap();
    assert!((0.1..=0.9).contains(&alpha));
    assert!(report.beta.is_some());
    assert_eq!(report.damping, None);
}

#[test]
fn test_engine_cancellation_and_observer() {
    let token = CancellationToken::new();
    token.cancel();
    let result = ForecastEngine::new()
        .with_cancellation(token)
        .run(&ForecastRequest::new("x", noisy_trend(20, 1), 2));
    assert!(matches!(result, Err(ForecastError::Cancelled(_))));

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let config = SmoothingConfig {
        mode: ModelKind::Simple,
        ..SmoothingConfig::default()
    };
    ForecastEngine::new()
        .with_observer(Arc::new(move |_: &GridEvaluation| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .run(&ForecastRequest::new("x", noisy_trend(20, 1), 2).with_config(config))
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 19);
}

#[test]
fn test_csv_to_report() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "day,count").unwrap();
    for (i, v) in noisy_trend(25, 9).iter().enumerate() {
        writeln!(file, "2024-03-{:02},{}", i + 1, v).unwrap();
    }

    let series = DataLoader::from_csv(file.path(), "day", "count").unwrap();
    let request = ForecastRequest::new(series.field(), series.values().to_vec(), 2)
        .with_timestamps(series.timestamps().unwrap().to_vec());
    let report = ForecastEngine::new().run(&request).unwrap();

    let last = series.timestamps().unwrap()[24];
    assert_eq!(report.field, "count");
    assert_eq!(
        report.forecast_timestamps,
        Some(vec![last + DAY_MS, last + 2 * DAY_MS])
    );
}

#[test]
fn test_invalid_requests_fail_fast() {
    let engine = ForecastEngine::new();
    let bad_params = SmoothingConfig {
        params: Some(SmoothingParameters::Simple { alpha: 0.0 }),
        ..SmoothingConfig::default()
    };
    assert!(matches!(
        engine.run(&ForecastRequest::new("x", vec![1.0, 2.0, 3.0], 1).with_config(bad_params)),
        Err(ForecastError::InvalidParameters(_))
    ));
    assert!(matches!(
        engine.run(&ForecastRequest::new("x", vec![1.0, f64::INFINITY, 3.0], 1)),
        Err(ForecastError::InvalidInput(_))
    ));
    assert!(ForecastRequest::from_json(r#"{"field":"x"}"#).is_err());
}
