use smooth_forecast::models::exponential_smoothing::fit;
use smooth_forecast::models::{SmoothingParameters, TrainedForecastModel};
use smooth_forecast::utils::format_timestamp;
use smooth_forecast::{AccuracyReport, ForecastEngine, ForecastRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DAY_MS: i64 = 86_400_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smooth_forecast=info".into()),
        )
        .init();

    println!("Smooth Forecast: Basic Forecasting Example");
    println!("==========================================\n");

    let (timestamps, values) = create_sample_daily_data();
    println!("Sample data created: {} daily points\n", values.len());

    // Fixed Holt parameters
    let params = SmoothingParameters::double(0.3, 0.1, None)?;
    let state = fit(&values, &params)?;
    let forecast = state.forecast(5, 0.95)?;
    println!("{} forecast (5 days): {:.2?}", params, forecast.point());
    print!("{}", AccuracyReport::from_state(&state)?);

    // Grid-searched parameters through the engine
    let request = ForecastRequest::new("daily_sales", values, 5).with_timestamps(timestamps);
    let report = ForecastEngine::new().run(&request)?;

    println!(
        "\nGrid search picked alpha={:?} beta={:?}",
        report.alpha, report.beta
    );
    let future = report.forecast_timestamps.clone().unwrap_or_default();
    for (i, interval) in report.intervals.iter().enumerate() {
        let label = future
            .get(i)
            .and_then(|&ms| format_timestamp(ms))
            .unwrap_or_else(|| format!("t+{}", i + 1));
        println!(
            "  {}: {:.2} [{:.2}, {:.2}]",
            label, interval.point, interval.lower, interval.upper
        );
    }

    if let Some(diagnostics) = &report.diagnostics {
        println!(
            "\nLjung-Box Q={:.3} (dof {}), p={:.3}",
            diagnostics.ljung_box_q, diagnostics.ljung_box_dof, diagnostics.ljung_box_p_value
        );
    }

    Ok(())
}

fn create_sample_daily_data() -> (Vec<i64>, Vec<f64>) {
    let start = 1_704_067_200_000; // 2024-01-01
    let timestamps = (0..60).map(|i| start + i * DAY_MS).collect();
    let values = (0..60)
        .map(|i| {
            let t = i as f64;
            200.0 + 1.8 * t + 6.0 * (t * 0.9).sin()
        })
        .collect();
    (timestamps, values)
}
