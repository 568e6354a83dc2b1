//! Concrete adapter implementations for ports.

pub mod console_report;
pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
pub mod json_adapter;
pub mod json_report;
pub mod parse;

use crate::domain::error::SignalError;
use crate::ports::data_port::{DataPort, DataSource};
use crate::ports::report_port::{OutputFormat, ReportPort};
use chrono::Duration;

/// Open `source` with the adapter for `input_format`, or the one implied by
/// the file extension. Standard input and unknown extensions read as CSV.
pub fn open_data_source(
    source: &DataSource,
    input_format: Option<&str>,
    default_symbol: &str,
    gap_threshold: Option<Duration>,
) -> Result<Box<dyn DataPort>, SignalError> {
    let format = match input_format {
        Some(f) => f.to_ascii_lowercase(),
        None => source.extension().unwrap_or_else(|| "csv".to_string()),
    };
    tracing::debug!(%source, format = %format, "opening data source");
    match format.as_str() {
        "json" => Ok(Box::new(json_adapter::JsonAdapter::open(
            source,
            default_symbol,
            gap_threshold,
        )?)),
        "csv" => Ok(Box::new(csv_adapter::CsvAdapter::open(
            source,
            default_symbol,
            gap_threshold,
        )?)),
        other if input_format.is_some() => Err(SignalError::ConfigInvalid {
            section: "data".to_string(),
            key: "input_format".to_string(),
            reason: format!("unsupported input format `{other}` (expected csv or json)"),
        }),
        _ => Ok(Box::new(csv_adapter::CsvAdapter::open(
            source,
            default_symbol,
            gap_threshold,
        )?)),
    }
}

pub fn reporter(format: OutputFormat) -> Box<dyn ReportPort> {
    match format {
        OutputFormat::Csv => Box::new(csv_report::CsvReport),
        OutputFormat::Json => Box::new(json_report::JsonReport),
        OutputFormat::Console => Box::new(console_report::ConsoleReport),
    }
}
