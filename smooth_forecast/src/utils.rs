//! Utility functions for the smooth_forecast crate

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Median spacing between consecutive timestamps.
///
/// `None` for fewer than 2 timestamps or when a spacing does not fit in `i64`.
pub fn median_step(timestamps: &[i64]) -> Option<i64> {
    if timestamps.len() < 2 {
        return None;
    }
    let mut steps = timestamps
        .windows(2)
        .map(|w| w[1].checked_sub(w[0]))
        .collect::<Option<Vec<i64>>>()?;
    steps.sort_unstable();
    let mid = steps.len() / 2;
    if steps.len() % 2 == 0 {
        let (a, b) = (steps[mid - 1], steps[mid]);
        Some(a / 2 + b / 2 + (a % 2 + b % 2) / 2)
    } else {
        Some(steps[mid])
    }
}

/// Create future timestamps for forecasting by repeating the median step
pub fn future_timestamps(timestamps: &[i64], horizon: usize) -> Option<Vec<i64>> {
    let step = median_step(timestamps)?;
    let last = *timestamps.last()?;
    (1..=horizon as i64)
        .map(|h| step.checked_mul(h).and_then(|offset| last.checked_add(offset)))
        .collect()
}

/// Render an epoch-millisecond timestamp as RFC 3339 in UTC
pub fn format_timestamp(ms: i64) -> Option<String> {
    let dt: DateTime<Utc> = Utc.timestamp_millis_opt(ms).single()?;
    Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
