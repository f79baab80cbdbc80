use approx::assert_relative_eq;
use smooth_forecast::forecast::point_forecasts;
use smooth_forecast::models::exponential_smoothing::fit;
use smooth_forecast::models::naive::NaiveModel;
use smooth_forecast::models::{
    ForecastModel, SeasonalType, SmoothingParameters, TrainedForecastModel,
};

fn linear_data() -> Vec<f64> {
    (0..12).map(|i| 100.0 + 20.0 * i as f64).collect()
}

fn seasonal_fixture() -> Vec<f64> {
    vec![
        100.0, 120.0, 140.0, 160.0, 180.0, 200.0, 110.0, 130.0, 150.0, 170.0, 190.0, 210.0, 105.0,
        125.0, 145.0, 165.0, 185.0, 205.0,
    ]
}

#[test]
fn test_holt_forecast_and_intervals() {
    let params = SmoothingParameters::double(0.3, 0.1, None).unwrap();
    let state = params.train(&linear_data()).unwrap();
    let forecast = state.forecast(4, 0.95).unwrap();

    let expected_point = [
        334.80352541589895,
        353.26865310398125,
        371.73378079206356,
        390.19890848014586,
    ];
    let expected_lower = [
        308.7141443026839,
        325.51087422180564,
        342.4430818180497,
        359.45736048438476,
    ];
    for h in 0..4 {
        assert_relative_eq!(forecast.point()[h], expected_point[h], epsilon = 1e-6);
        assert_relative_eq!(forecast.lower()[h], expected_lower[h], epsilon = 1e-6);
        // symmetric around the point
        assert_relative_eq!(
            forecast.upper()[h] - forecast.point()[h],
            forecast.point()[h] - forecast.lower()[h],
            epsilon = 1e-9
        );
    }
    assert_relative_eq!(state.residual_variance(), 146.4299927695806, epsilon = 1e-6);
    assert_eq!(forecast.parameters(), Some(&params));
}

#[test]
fn test_intervals_widen_with_horizon() {
    let state = fit(
        &linear_data(),
        &SmoothingParameters::double(0.3, 0.1, None).unwrap(),
    )
    .unwrap();
    let forecast = state.forecast(10, 0.90).unwrap();

    let widths: Vec<f64> = forecast
        .intervals()
        .iter()
        .map(|i| i.upper - i.lower)
        .collect();
    assert!(widths.windows(2).all(|w| w[1] > w[0]));
    assert!(forecast
        .intervals()
        .iter()
        .all(|i| i.lower <= i.point && i.point <= i.upper));
}

#[test]
fn test_higher_confidence_gives_wider_interval() {
    let state = fit(
        &linear_data(),
        &SmoothingParameters::double(0.3, 0.1, None).unwrap(),
    )
    .unwrap();
    let narrow = state.forecast(1, 0.80).unwrap();
    let wide = state.forecast(1, 0.99).unwrap();
    let ratio = (wide.upper()[0] - wide.point()[0]) / (narrow.upper()[0] - narrow.point()[0]);
    assert_relative_eq!(ratio, 2.576 / 1.282, epsilon = 1e-9);
}

#[test]
fn test_constant_series_has_zero_width_intervals() {
    let data = vec![5.0; 10];
    let state = fit(&data, &SmoothingParameters::simple(0.4).unwrap()).unwrap();
    let forecast = state.forecast(3, 0.95).unwrap();

    assert_eq!(forecast.point(), &[5.0, 5.0, 5.0]);
    assert_eq!(forecast.lower(), forecast.upper());
    assert_eq!(state.fitted()[0], None);
    assert!(state.fitted()[1..].iter().all(|f| *f == Some(5.0)));
}

#[test]
fn test_damped_forecast_levels_off() {
    let data: Vec<f64> = (0..30).map(|i| 10.0 + 2.0 * i as f64).collect();
    let phi = 0.8;
    let state = fit(&data, &SmoothingParameters::double(0.5, 0.3, Some(phi)).unwrap()).unwrap();
    let points = point_forecasts(&state, 50).unwrap();

    let level = state.last_level();
    let trend = state.last_trend().unwrap();
    // L + T (1 + φ + φ²)
    assert_relative_eq!(
        points[2],
        level + trend * (1.0 + phi + phi * phi),
        epsilon = 1e-9
    );
    // geometric sum bound L + T / (1 - φ)
    let limit = level + trend / (1.0 - phi);
    assert!((points[49] - limit).abs() < 1e-3);
    assert!(points.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_holt_winters_forecast_repeats_season() {
    let params =
        SmoothingParameters::triple(0.867, 0.003, 0.0001, 6, SeasonalType::Additive, None)
            .unwrap();
    let state = fit(&seasonal_fixture(), &params).unwrap();
    let forecast = state.forecast(6, 0.95).unwrap();

    let expected = [
        127.28768449198202,
        166.60223925038622,
        205.91687497434756,
        245.23152149592102,
        284.5461694533758,
        323.8608175976925,
    ];
    for (p, e) in forecast.point().iter().zip(expected.iter()) {
        assert_relative_eq!(*p, *e, epsilon = 1e-6);
    }
    assert_relative_eq!(forecast.lower()[0], 79.20579142556875, epsilon = 1e-6);
    assert_relative_eq!(forecast.upper()[5], 385.55221961702506, epsilon = 1e-6);
}

#[test]
fn test_multiplicative_forecast_scales_with_season() {
    let pattern = [1.2, 0.8, 0.9, 1.1];
    let data: Vec<f64> = (0..32).map(|t| 200.0 * pattern[t % 4]).collect();
    let params =
        SmoothingParameters::triple(0.2, 0.01, 0.1, 4, SeasonalType::Multiplicative, None)
            .unwrap();
    let state = fit(&data, &params).unwrap();
    let points = point_forecasts(&state, 4).unwrap();

    // next phase is 0 (t = 32), the peak of the cycle
    assert!(points[0] > points[1]);
    assert!(points[3] > points[2]);
    assert!(points[2] > points[1]);
    assert!(points.iter().all(|p| *p > 0.0));
}

#[test]
fn test_forecast_rejects_bad_arguments() {
    let state = fit(&linear_data(), &SmoothingParameters::simple(0.5).unwrap()).unwrap();
    assert!(state.forecast(0, 0.95).is_err());
    assert!(state.forecast(3, 0.0).is_err());
    assert!(state.forecast(3, 1.0).is_err());
    // levels outside the table use the exact quantile
    assert!(state.forecast(3, 0.5).is_ok());
}

#[test]
fn test_model_names() {
    let params = SmoothingParameters::double(0.3, 0.1, Some(0.9)).unwrap();
    assert_eq!(
        ForecastModel::name(&params),
        "Double(alpha=0.3, beta=0.1, phi=0.9)"
    );
    assert_eq!(ForecastModel::name(&NaiveModel), "Naive");
}

#[test]
fn test_naive_model_through_trait() {
    let trained = NaiveModel.train(&[3.0, 5.0, 4.0]).unwrap();
    let forecast = trained.forecast(2, 0.95).unwrap();
    assert_eq!(forecast.point(), &[4.0, 4.0]);
    assert!(forecast.parameters().is_none());
    assert_eq!(trained.fitted(), &[None, Some(3.0), Some(5.0)]);
}
