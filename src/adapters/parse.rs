//! Helpers shared by the price data adapters.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::PricePoint;
use crate::domain::time_series::TimeSeries;
use crate::ports::data_port::{DataSource, LoadedSeries};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;

/// Epoch values at or above this are milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 1_000_000_000_000;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Read the whole source into memory with one blocking read.
pub fn read_source(source: &DataSource) -> Result<String, SignalError> {
    match source {
        DataSource::File(path) => Ok(std::fs::read_to_string(path)?),
        DataSource::Stdin => {
            let mut buf = String::new();
            std::io::stdin().lock().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parse RFC 3339, a naive date/time (taken as UTC), a bare date, or Unix
/// epoch seconds/milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(epoch) = raw.parse::<i64>() {
        let parsed = if epoch.abs() >= EPOCH_MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return parsed.ok_or_else(|| format!("epoch `{raw}` out of range"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!("unrecognised timestamp `{raw}`"))
}

pub fn parse_number(raw: &str, row: usize, field: &str) -> Result<f64, SignalError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| SignalError::data_format(row, field, format!("`{}`: {e}", raw.trim())))
}

/// Validate rows (tagged with their source row number), build the series and
/// log every gap wider than `gap_threshold`.
pub fn assemble_series(
    symbol: &str,
    rows: Vec<(usize, PricePoint)>,
    gap_threshold: Option<Duration>,
) -> Result<LoadedSeries, SignalError> {
    if rows.is_empty() {
        return Err(SignalError::NoData {
            symbol: symbol.to_string(),
        });
    }

    for (row, point) in &rows {
        point.validate(*row)?;
    }
    for pair in rows.windows(2) {
        let (_, prev) = &pair[0];
        let (row, cur) = &pair[1];
        if cur.timestamp <= prev.timestamp {
            return Err(SignalError::Ordering {
                row: *row,
                previous: prev.timestamp,
                current: cur.timestamp,
            });
        }
    }

    let row_numbers: Vec<usize> = rows.iter().map(|(row, _)| *row).collect();
    let series = TimeSeries::new(symbol, rows.into_iter().map(|(_, p)| p).collect())?;

    let mut gaps = series.detect_gaps(gap_threshold);
    for gap in &mut gaps {
        if let Some(row) = row_numbers.get(gap.row - 1) {
            gap.row = *row;
        }
        tracing::warn!(symbol, "{gap}");
    }

    tracing::info!(symbol, bars = series.len(), gaps = gaps.len(), "loaded series");
    Ok(LoadedSeries { series, gaps })
}
