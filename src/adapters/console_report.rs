//! Human-readable summary for terminal output.

use crate::domain::error::SignalError;
use crate::domain::signal::{Action, LatestSignal};
use crate::ports::report_port::{ReportPort, SignalRun};
use std::io::Write;

pub struct ConsoleReport;

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "n/a".to_string())
}

/// Print the latest-signal block for one symbol.
pub fn write_latest(latest: &LatestSignal, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{} @ {}", latest.symbol, latest.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "  price:      {:.4}", latest.price)?;
    writeln!(
        out,
        "  signal:     {} (confidence {:.2})",
        latest.action, latest.confidence
    )?;
    writeln!(
        out,
        "  regime:     {}",
        latest.regime.map(|r| r.to_string()).unwrap_or_else(|| "unknown".to_string())
    )?;
    writeln!(out, "  rsi:        {}", optional(latest.rsi, |v| format!("{v:.2}")))?;
    writeln!(out, "  adx:        {}", optional(latest.adx, |v| format!("{v:.2}")))?;
    Ok(())
}

fn write_run(run: &SignalRun, out: &mut dyn Write) -> std::io::Result<()> {
    let count = |action: Action| run.signals.iter().filter(|s| s.action == action).count();
    let report = &run.report;

    writeln!(out, "== {} ==", run.symbol)?;
    writeln!(
        out,
        "Signals: {} bars, {} buy, {} sell, {} hold",
        run.signals.len(),
        count(Action::Buy),
        count(Action::Sell),
        count(Action::Hold)
    )?;
    writeln!(out, "Total return:     {}", pct(report.total_return))?;
    writeln!(out, "Win rate:         {}", optional(report.win_rate, pct))?;
    writeln!(out, "Max drawdown:     {}", pct(report.max_drawdown))?;
    writeln!(out, "Trades:           {}", report.trade_count)?;
    writeln!(out, "Profit factor:    {}", optional(report.profit_factor, |v| format!("{v:.2}")))?;
    writeln!(out, "Exposure:         {}", pct(report.exposure))?;
    writeln!(out, "Final equity:     {:.2}", report.final_equity)?;
    if let Some(open) = report.open_position_return {
        writeln!(out, "Open position:    {}", pct(open))?;
    }
    if let Some(latest) = &run.latest {
        writeln!(out, "Latest:")?;
        write_latest(latest, out)?;
    }
    Ok(())
}

impl ReportPort for ConsoleReport {
    fn write(&self, run: &SignalRun, out: &mut dyn Write) -> Result<(), SignalError> {
        write_run(run, out).map_err(|e| SignalError::serialization(e.to_string()))
    }
}
