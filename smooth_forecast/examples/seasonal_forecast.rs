use smooth_forecast::optimizer::GridEvaluation;
use smooth_forecast::{
    ForecastEngine, ForecastRequest, ModelKind, SeasonalType, SmoothingConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smooth_forecast=info".into()),
        )
        .init();

    println!("Smooth Forecast: Holt-Winters Example");
    println!("=====================================\n");

    // Monthly series with a yearly cycle
    let season = [
        0.85, 0.80, 0.95, 1.00, 1.05, 1.15, 1.25, 1.20, 1.05, 0.95, 0.85, 0.90,
    ];
    let values: Vec<f64> = (0..60)
        .map(|t| (500.0 + 4.0 * t as f64) * season[t % 12])
        .collect();

    for seasonal_type in [SeasonalType::Additive, SeasonalType::Multiplicative] {
        let scored = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&scored);

        let config = SmoothingConfig {
            mode: ModelKind::Triple,
            seasonal_period: Some(12),
            seasonal_type,
            damped: true,
            ..SmoothingConfig::default()
        };
        let request = ForecastRequest::new("passengers", values.clone(), 12).with_config(config);
        let report = ForecastEngine::new()
            .with_observer(Arc::new(move |_: &GridEvaluation| {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .run(&request)?;

        println!(
            "{:?}: period {:?}, alpha={:?} beta={:?} gamma={:?} phi={:?} ({} grid points)",
            seasonal_type,
            report.seasonal_period,
            report.alpha,
            report.beta,
            report.gamma,
            report.damping,
            scored.load(Ordering::Relaxed)
        );
        if let Some(metrics) = &report.metrics {
            println!(
                "  in-sample RMSE {:.2}, MAPE {:?}",
                metrics.rmse, metrics.mape
            );
        }
        println!("  next 12: {:.1?}\n", report.point_forecasts);
    }

    Ok(())
}
