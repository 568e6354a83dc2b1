//! CSV report writer.
//!
//! Layout: one row per signal, a blank line, then a one-row summary block.
//! A missing win rate is written as `undefined`.

use crate::domain::error::SignalError;
use crate::domain::regime::Regime;
use crate::domain::signal::{Action, Signal};
use crate::ports::report_port::{ReportPort, SignalRun};
use chrono::SecondsFormat;
use std::io::{Read, Write};

const SIGNAL_HEADER: [&str; 5] = ["timestamp", "action", "confidence", "regime", "reason"];
const SUMMARY_HEADER: [&str; 4] = ["total_return", "win_rate", "max_drawdown", "trade_count"];
pub const UNDEFINED: &str = "undefined";

pub struct CsvReport;

fn to_serialization(err: impl std::fmt::Display) -> SignalError {
    SignalError::serialization(err.to_string())
}

impl ReportPort for CsvReport {
    fn write(&self, run: &SignalRun, out: &mut dyn Write) -> Result<(), SignalError> {
        {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record(SIGNAL_HEADER).map_err(to_serialization)?;
            for signal in &run.signals {
                let regime = signal.regime.map(|r| r.to_string()).unwrap_or_default();
                wtr.write_record([
                    signal.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    signal.action.to_string(),
                    format!("{:.6}", signal.confidence),
                    regime,
                    signal.reason.clone(),
                ])
                .map_err(to_serialization)?;
            }
            wtr.flush().map_err(to_serialization)?;
        }

        writeln!(out).map_err(to_serialization)?;

        let report = &run.report;
        let win_rate = report
            .win_rate
            .map(|w| format!("{w:.6}"))
            .unwrap_or_else(|| UNDEFINED.to_string());
        let mut wtr = csv::Writer::from_writer(&mut *out);
        wtr.write_record(SUMMARY_HEADER).map_err(to_serialization)?;
        wtr.write_record([
            format!("{:.6}", report.total_return),
            win_rate,
            format!("{:.6}", report.max_drawdown),
            report.trade_count.to_string(),
        ])
        .map_err(to_serialization)?;
        wtr.flush().map_err(to_serialization)?;
        Ok(())
    }

    fn write_multi(&self, runs: &[SignalRun], out: &mut dyn Write) -> Result<(), SignalError> {
        for (i, run) in runs.iter().enumerate() {
            if i > 0 {
                writeln!(out).map_err(to_serialization)?;
            }
            self.write(run, out)?;
        }
        Ok(())
    }
}

/// Read back the signal rows of a CSV report, stopping at the summary block.
///
/// Contributing indicators are not written, so they come back empty.
pub fn parse_signals<R: Read>(input: R) -> Result<Vec<Signal>, SignalError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut signals = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| SignalError::data_format(row, "record", e.to_string()))?;
        if record.get(0) == Some(SUMMARY_HEADER[0]) {
            break;
        }

        let field = |idx: usize| record.get(idx).unwrap_or_default();
        let timestamp = chrono::DateTime::parse_from_rfc3339(field(0))
            .map_err(|e| SignalError::data_format(row, "timestamp", e.to_string()))?
            .with_timezone(&chrono::Utc);
        let action = field(1)
            .parse::<Action>()
            .map_err(|e| SignalError::data_format(row, "action", e))?;
        let confidence = field(2)
            .parse::<f64>()
            .map_err(|e| SignalError::data_format(row, "confidence", e.to_string()))?;
        let regime = match field(3) {
            "" => None,
            raw => Some(
                raw.parse::<Regime>()
                    .map_err(|e| SignalError::data_format(row, "regime", e))?,
            ),
        };

        let mut signal = Signal::new(timestamp, action, confidence, Vec::new(), field(4));
        signal.regime = regime;
        signals.push(signal);
    }
    Ok(signals)
}
