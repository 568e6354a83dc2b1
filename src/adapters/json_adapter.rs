//! JSON price data adapter.
//!
//! Accepts either an array of bar objects or `{"symbol": ..., "bars": [...]}`.
//! Field names match the CSV headers; numbers may be JSON numbers or strings.

use crate::adapters::parse::{assemble_series, parse_number, parse_timestamp, read_source};
use crate::domain::error::SignalError;
use crate::domain::ohlcv::PricePoint;
use crate::ports::data_port::{DataPort, DataSource, LoadedSeries};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "date", "time", "datetime"];

pub struct JsonAdapter {
    bars: Vec<Value>,
    file_symbol: Option<String>,
    default_symbol: String,
    gap_threshold: Option<Duration>,
}

fn lookup<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    object
        .iter()
        .find(|(k, _)| names.iter().any(|n| k.eq_ignore_ascii_case(n)))
        .map(|(_, v)| v)
}

fn is_empty_cell(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn number(value: &Value, row: usize, field: &str) -> Result<f64, SignalError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| SignalError::data_format(row, field, format!("`{n}` is not representable"))),
        Value::String(s) => parse_number(s, row, field),
        other => Err(SignalError::data_format(row, field, format!("expected a number, got {other}"))),
    }
}

fn timestamp(value: &Value, row: usize) -> Result<DateTime<Utc>, SignalError> {
    let parsed = match value {
        Value::Number(n) => parse_timestamp(&n.to_string()),
        Value::String(s) => parse_timestamp(s),
        other => Err(format!("expected a timestamp, got {other}")),
    };
    parsed.map_err(|reason| SignalError::data_format(row, "timestamp", reason))
}

impl JsonAdapter {
    pub fn open(
        source: &DataSource,
        default_symbol: impl Into<String>,
        gap_threshold: Option<Duration>,
    ) -> Result<Self, SignalError> {
        let content = read_source(source)?;
        Self::from_string(&content, default_symbol, gap_threshold)
    }

    pub fn from_string(
        content: &str,
        default_symbol: impl Into<String>,
        gap_threshold: Option<Duration>,
    ) -> Result<Self, SignalError> {
        let document: Value = serde_json::from_str(content)
            .map_err(|e| SignalError::data_format(e.line(), "document", e.to_string()))?;

        let (bars, file_symbol) = match document {
            Value::Array(bars) => (bars, None),
            Value::Object(mut object) => {
                let bars = match object.remove("bars") {
                    Some(Value::Array(bars)) => bars,
                    _ => {
                        return Err(SignalError::data_format(
                            0,
                            "bars",
                            "expected an array of bars",
                        ))
                    }
                };
                let symbol = object
                    .get("symbol")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (bars, symbol)
            }
            _ => {
                return Err(SignalError::data_format(
                    0,
                    "document",
                    "expected an array or an object with `bars`",
                ))
            }
        };

        Ok(Self {
            bars,
            file_symbol,
            default_symbol: default_symbol.into(),
            gap_threshold,
        })
    }

    fn bar_symbol<'a>(&'a self, object: &'a Map<String, Value>) -> &'a str {
        lookup(object, &["symbol"])
            .and_then(Value::as_str)
            .or(self.file_symbol.as_deref())
            .unwrap_or(self.default_symbol.as_str())
    }

    fn parse_bar(
        object: &Map<String, Value>,
        row: usize,
        symbol: &str,
    ) -> Result<Option<PricePoint>, SignalError> {
        let ts = match lookup(object, &TIMESTAMP_ALIASES) {
            Some(value) if !is_empty_cell(Some(value)) => value,
            _ => return Err(SignalError::data_format(row, "timestamp", "missing timestamp")),
        };
        let fields = ["open", "high", "low", "close", "volume"];
        let values: Vec<Option<&Value>> = fields.iter().map(|f| lookup(object, &[*f])).collect();

        if values.iter().any(|v| is_empty_cell(*v)) {
            tracing::warn!(row, "dropping bar with empty field");
            return Ok(None);
        }

        let mut numbers = [0.0; 5];
        for (i, (field, value)) in fields.iter().zip(&values).enumerate() {
            if let Some(value) = value {
                numbers[i] = number(value, row, field)?;
            }
        }
        let [open, high, low, close, volume] = numbers;
        let timestamp = timestamp(ts, row)?;

        Ok(Some(PricePoint {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }))
    }
}

impl DataPort for JsonAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<LoadedSeries, SignalError> {
        let mut rows = Vec::new();
        for (i, value) in self.bars.iter().enumerate() {
            let row = i + 1;
            let Value::Object(object) = value else {
                return Err(SignalError::data_format(row, "bar", "expected an object"));
            };
            if !self.bar_symbol(object).eq_ignore_ascii_case(symbol) {
                continue;
            }
            if let Some(point) = Self::parse_bar(object, row, symbol)? {
                rows.push((row, point));
            }
        }
        assemble_series(symbol, rows, self.gap_threshold)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let mut symbols: Vec<String> = Vec::new();
        for value in &self.bars {
            if let Value::Object(object) = value {
                let symbol = self.bar_symbol(object);
                if !symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
                    symbols.push(symbol.to_string());
                }
            }
        }
        if symbols.is_empty() {
            symbols.push(
                self.file_symbol
                    .clone()
                    .unwrap_or_else(|| self.default_symbol.clone()),
            );
        }
        Ok(symbols)
    }
}
