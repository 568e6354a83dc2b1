//! CSV price data adapter.
//!
//! Columns are located by header name, case-insensitively. A `symbol` column
//! is optional; without one every row belongs to the adapter's default symbol.

use crate::adapters::parse::{assemble_series, parse_number, parse_timestamp, read_source};
use crate::domain::error::SignalError;
use crate::domain::ohlcv::PricePoint;
use crate::ports::data_port::{DataPort, DataSource, LoadedSeries};
use chrono::Duration;

const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "date", "time", "datetime"];

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    symbol: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, SignalError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |name: &str| {
            find(&[name]).ok_or_else(|| {
                SignalError::data_format(0, name, "header is missing this column")
            })
        };

        Ok(Self {
            timestamp: find(&TIMESTAMP_ALIASES).ok_or_else(|| {
                SignalError::data_format(0, "timestamp", "header is missing this column")
            })?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
            symbol: find(&["symbol"]),
        })
    }
}

pub struct CsvAdapter {
    content: String,
    default_symbol: String,
    gap_threshold: Option<Duration>,
}

impl CsvAdapter {
    pub fn open(
        source: &DataSource,
        default_symbol: impl Into<String>,
        gap_threshold: Option<Duration>,
    ) -> Result<Self, SignalError> {
        let content = read_source(source)?;
        Ok(Self::from_string(content, default_symbol, gap_threshold))
    }

    pub fn from_string(
        content: impl Into<String>,
        default_symbol: impl Into<String>,
        gap_threshold: Option<Duration>,
    ) -> Self {
        Self {
            content: content.into(),
            default_symbol: default_symbol.into(),
            gap_threshold,
        }
    }

    fn reader(&self) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(self.content.as_bytes())
    }

    fn headers(rdr: &mut csv::Reader<&[u8]>) -> Result<csv::StringRecord, SignalError> {
        rdr.headers()
            .cloned()
            .map_err(|e| SignalError::data_format(0, "header", e.to_string()))
    }

    fn parse_row(
        &self,
        record: &csv::StringRecord,
        columns: &Columns,
        row: usize,
        symbol: &str,
    ) -> Result<Option<PricePoint>, SignalError> {
        let cell = |idx: usize| record.get(idx).unwrap_or_default();
        let raw_timestamp = cell(columns.timestamp);
        if raw_timestamp.trim().is_empty() {
            return Err(SignalError::data_format(row, "timestamp", "missing timestamp"));
        }

        let cells = [
            ("open", columns.open),
            ("high", columns.high),
            ("low", columns.low),
            ("close", columns.close),
            ("volume", columns.volume),
        ];
        if let Some((field, _)) = cells
            .iter()
            .find(|(_, idx)| record.get(*idx).is_none_or(|c| c.trim().is_empty()))
        {
            tracing::warn!(row, field, "dropping row with empty cell");
            return Ok(None);
        }

        let timestamp = parse_timestamp(raw_timestamp)
            .map_err(|reason| SignalError::data_format(row, "timestamp", reason))?;

        Ok(Some(PricePoint {
            symbol: symbol.to_string(),
            timestamp,
            open: parse_number(cell(columns.open), row, "open")?,
            high: parse_number(cell(columns.high), row, "high")?,
            low: parse_number(cell(columns.low), row, "low")?,
            close: parse_number(cell(columns.close), row, "close")?,
            volume: parse_number(cell(columns.volume), row, "volume")?,
        }))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<LoadedSeries, SignalError> {
        let mut rdr = self.reader();
        let headers = Self::headers(&mut rdr)?;
        let columns = Columns::locate(&headers)?;

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| SignalError::data_format(row, "record", e.to_string()))?;

            if let Some(idx) = columns.symbol {
                let row_symbol = record.get(idx).unwrap_or_default();
                if !row_symbol.eq_ignore_ascii_case(symbol) {
                    continue;
                }
            }
            if let Some(point) = self.parse_row(&record, &columns, row, symbol)? {
                rows.push((row, point));
            }
        }

        assemble_series(symbol, rows, self.gap_threshold)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let mut rdr = self.reader();
        let headers = Self::headers(&mut rdr)?;
        let columns = Columns::locate(&headers)?;
        let Some(idx) = columns.symbol else {
            return Ok(vec![self.default_symbol.clone()]);
        };

        let mut symbols: Vec<String> = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| SignalError::data_format(i + 1, "record", e.to_string()))?;
            let symbol = record.get(idx).unwrap_or_default();
            if !symbol.is_empty() && !symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
                symbols.push(symbol.to_string());
            }
        }
        Ok(symbols)
    }
}
