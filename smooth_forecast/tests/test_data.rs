use chrono::{Duration, TimeZone, Utc};
use smooth_forecast::data::{DataLoader, TimeSeries};
use smooth_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_load_csv_with_dates() {
    let file = csv_file(&[
        "date,region,visits",
        "2023-01-01,north,100.0",
        "2023-01-02,north,102.5",
        "2023-01-03,north,101.0",
    ]);

    let series = DataLoader::from_csv(file.path(), "date", "visits").unwrap();
    assert_eq!(series.field(), "visits");
    assert_eq!(series.values(), &[100.0, 102.5, 101.0]);

    let ts = series.timestamps().unwrap();
    assert_eq!(ts[0], 1_672_531_200_000);
    assert_eq!(ts[1] - ts[0], 86_400_000);
    assert_eq!(series.dates().unwrap().len(), 3);
}

#[test]
fn test_load_csv_mixed_timestamp_formats() {
    let file = csv_file(&[
        "time,value",
        "1672531200000,1",
        "2023-01-01T01:00:00Z,2",
        "2023-01-01 02:00:00,3",
    ]);
    let series = DataLoader::from_csv(file.path(), "time", "value").unwrap();
    let ts = series.timestamps().unwrap();
    assert_eq!(ts[1] - ts[0], 3_600_000);
    assert_eq!(ts[2] - ts[1], 3_600_000);
}

#[test]
fn test_missing_column() {
    let file = csv_file(&["date,price", "2023-01-01,1.0"]);
    let result = DataLoader::from_csv(file.path(), "date", "volume");
    assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
}

#[test]
fn test_unparseable_cells() {
    let bad_value = csv_file(&["date,price", "2023-01-01,abc"]);
    assert!(DataLoader::from_csv(bad_value.path(), "date", "price").is_err());

    let bad_time = csv_file(&["date,price", "yesterday,1.0"]);
    assert!(DataLoader::from_csv(bad_time.path(), "date", "price").is_err());
}

#[test]
fn test_unsorted_rows_are_rejected() {
    let file = csv_file(&["date,price", "2023-01-02,1.0", "2023-01-01,2.0"]);
    assert!(matches!(
        DataLoader::from_csv(file.path(), "date", "price"),
        Err(ForecastError::InvalidInput(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = DataLoader::from_csv("/nonexistent/series.csv", "date", "price");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_series_validation() {
    assert!(matches!(
        TimeSeries::from_values(vec![]),
        Err(ForecastError::InsufficientData(_))
    ));
    assert!(TimeSeries::from_values(vec![1.0, f64::NAN]).is_err());
    assert!(TimeSeries::with_timestamps("x", vec![1, 2], vec![1.0]).is_err());
    assert!(TimeSeries::with_timestamps("x", vec![1, 1], vec![1.0, 2.0]).is_err());

    let series = TimeSeries::with_timestamps("x", vec![1, 2, 3], vec![4.0, 5.0, 6.0]).unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.dates().map(|d| d.len()), Some(3));
}

#[test]
fn test_series_from_dates() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let dates: Vec<_> = (0..3).map(|i| start + Duration::days(i)).collect();
    let series = TimeSeries::new(dates.clone(), vec![1.0, 2.0, 3.0]).unwrap();

    assert_eq!(series.field(), "value");
    assert_eq!(series.dates(), Some(dates));
    assert_eq!(series.timestamps().unwrap()[1] - series.timestamps().unwrap()[0], 86_400_000);
    assert!(TimeSeries::new(vec![start, start], vec![1.0, 2.0]).is_err());
    assert_eq!(TimeSeries::from_values(vec![1.0]).unwrap().dates(), None);
}
