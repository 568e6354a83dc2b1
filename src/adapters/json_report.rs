//! JSON report writer.

use crate::domain::error::SignalError;
use crate::domain::metrics::EvaluationReport;
use crate::domain::signal::{LatestSignal, Signal};
use crate::ports::report_port::{ReportPort, SignalRun};
use serde::Serialize;
use std::io::Write;

pub struct JsonReport;

#[derive(Serialize)]
struct Document<'a> {
    symbol: &'a str,
    signals: &'a [Signal],
    summary: &'a EvaluationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<&'a LatestSignal>,
}

impl<'a> From<&'a SignalRun> for Document<'a> {
    fn from(run: &'a SignalRun) -> Self {
        Self {
            symbol: &run.symbol,
            signals: &run.signals,
            summary: &run.report,
            latest: run.latest.as_ref(),
        }
    }
}

fn finish(out: &mut dyn Write, result: serde_json::Result<()>) -> Result<(), SignalError> {
    result.map_err(|e| SignalError::serialization(e.to_string()))?;
    writeln!(out).map_err(|e| SignalError::serialization(e.to_string()))
}

impl ReportPort for JsonReport {
    fn write(&self, run: &SignalRun, out: &mut dyn Write) -> Result<(), SignalError> {
        let result = serde_json::to_writer_pretty(&mut *out, &Document::from(run));
        finish(out, result)
    }

    /// Several symbols become one JSON array.
    fn write_multi(&self, runs: &[SignalRun], out: &mut dyn Write) -> Result<(), SignalError> {
        let documents: Vec<Document<'_>> = runs.iter().map(Document::from).collect();
        let result = serde_json::to_writer_pretty(&mut *out, &documents);
        finish(out, result)
    }
}
