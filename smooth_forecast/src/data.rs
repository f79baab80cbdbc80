//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A named, gap-free univariate series with optional epoch-millisecond timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Name of the measured field
    field: String,
    /// Observation timestamps in epoch milliseconds, if known
    timestamps: Option<Vec<i64>>,
    /// Observed values
    values: Vec<f64>,
}

/// Loader for series stored as CSV with explicitly named columns
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a series from a CSV file
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        time_column: &str,
        value_column: &str,
    ) -> Result<TimeSeries> {
        let file = File::open(path)?;
        Self::from_reader(file, time_column, value_column)
    }

    /// Load a series from any CSV source.
    ///
    /// Time cells may hold epoch milliseconds, RFC 3339 timestamps,
    /// `YYYY-MM-DD` dates or `YYYY-MM-DD HH:MM:SS` datetimes (UTC).
    pub fn from_reader<R: Read>(
        reader: R,
        time_column: &str,
        value_column: &str,
    ) -> Result<TimeSeries> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let time_idx = Self::column_index(&headers, time_column)?;
        let value_idx = Self::column_index(&headers, value_column)?;

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let time_cell = record.get(time_idx).unwrap_or("").trim();
            let value_cell = record.get(value_idx).unwrap_or("").trim();

            timestamps.push(parse_timestamp(time_cell).ok_or_else(|| {
                ForecastError::InvalidInput(format!(
                    "Row {}: cannot parse timestamp '{}'",
                    row + 1,
                    time_cell
                ))
            })?);
            values.push(value_cell.parse::<f64>().map_err(|_| {
                ForecastError::InvalidInput(format!(
                    "Row {}: cannot parse value '{}' in column '{}'",
                    row + 1,
                    value_cell,
                    value_column
                ))
            })?);
        }

        TimeSeries::with_timestamps(value_column, timestamps, values)
    }

    fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ForecastError::InvalidInput(format!("Column '{}' not found", name)))
    }
}

/// Parse a timestamp cell into epoch milliseconds
pub(crate) fn parse_timestamp(cell: &str) -> Option<i64> {
    if let Ok(ms) = cell.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt).timestamp_millis());
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt).timestamp_millis())
}

impl TimeSeries {
    /// Create an unnamed series from raw values
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        Self::validate_values(&values)?;
        Ok(Self {
            field: "value".to_string(),
            timestamps: None,
            values,
        })
    }

    /// Create a series from dates and values
    pub fn new(dates: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        let timestamps = dates.iter().map(|d| d.timestamp_millis()).collect();
        Self::with_timestamps("value", timestamps, values)
    }

    /// Create a named series from epoch-millisecond timestamps and values
    pub fn with_timestamps(field: &str, timestamps: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }
        Self::validate_values(&values)?;
        if let Some(pos) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidInput(format!(
                "Timestamps must be strictly increasing (index {})",
                pos + 1
            )));
        }

        Ok(Self {
            field: field.to_string(),
            timestamps: Some(timestamps),
            values,
        })
    }

    fn validate_values(values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Empty time series data".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "Non-finite observation at index {}",
                pos
            )));
        }
        Ok(())
    }

    /// Rename the series
    pub fn named(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    /// Name of the measured field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Observed values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamps in epoch milliseconds, if the series has them
    pub fn timestamps(&self) -> Option<&[i64]> {
        self.timestamps.as_deref()
    }

    /// Timestamps as UTC datetimes, if the series has them
    pub fn dates(&self) -> Option<Vec<DateTime<Utc>>> {
        self.timestamps.as_ref().map(|ts| {
            ts.iter()
                .filter_map(|&ms| Utc.timestamp_millis_opt(ms).single())
                .collect()
        })
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
