#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use coinsignal::domain::error::SignalError;
pub use coinsignal::domain::ohlcv::PricePoint;
use coinsignal::domain::time_series::TimeSeries;
use coinsignal::ports::data_port::{DataPort, LoadedSeries};
use std::collections::HashMap;
use std::io::Write;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Hourly bars with open = high = low = close.
pub fn make_bars(symbol: &str, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(symbol, start_time() + Duration::hours(i as i64), close))
        .collect()
}

pub fn make_bar(symbol: &str, timestamp: DateTime<Utc>, close: f64) -> PricePoint {
    PricePoint {
        symbol: symbol.to_string(),
        timestamp,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

pub fn make_series(symbol: &str, closes: &[f64]) -> TimeSeries {
    TimeSeries::new(symbol, make_bars(symbol, closes)).unwrap()
}

/// Falls for ten bars, rallies for ten, then falls again.
///
/// With SMA(3)/SMA(5) this crosses up at bar 11 and down at bar 22.
pub fn swing_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
    closes.extend((0..10).map(|i| 93.0 + 2.0 * i as f64));
    closes.extend((0..10).map(|i| 109.0 - 2.0 * i as f64));
    closes
}

/// CSV text with a header, optionally including a symbol column.
pub fn bars_to_csv(bars: &[PricePoint], with_symbol: bool) -> String {
    let mut out = String::new();
    if with_symbol {
        out.push_str("symbol,");
    }
    out.push_str("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        if with_symbol {
            out.push_str(&bar.symbol);
            out.push(',');
        }
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}

pub fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    path
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub order: Vec<String>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            order: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PricePoint>) -> Self {
        self.order.push(symbol.to_string());
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.order.push(symbol.to_string());
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<LoadedSeries, SignalError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalError::data_format(1, "close", reason.clone()));
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let series = TimeSeries::new(symbol, bars.clone())?;
                let gaps = series.detect_gaps(None);
                Ok(LoadedSeries { series, gaps })
            }
            _ => Err(SignalError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        Ok(self.order.clone())
    }
}
