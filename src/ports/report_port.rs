//! Report generation port trait.

use crate::domain::error::SignalError;
use crate::domain::metrics::EvaluationReport;
use crate::domain::signal::{LatestSignal, Signal};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Everything produced for one symbol in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRun {
    pub symbol: String,
    pub signals: Vec<Signal>,
    pub report: EvaluationReport,
    pub latest: Option<LatestSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Console,
}

impl OutputFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Result<Self, SignalError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                SignalError::serialization(format!(
                    "cannot infer output format from `{}`",
                    path.display()
                ))
            })?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "txt" => Ok(OutputFormat::Console),
            other => Err(SignalError::serialization(format!(
                "unsupported output extension `.{other}`"
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Console => "txt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "console" | "text" | "txt" => Ok(OutputFormat::Console),
            other => Err(SignalError::serialization(format!(
                "unsupported output format `{other}` (expected csv, json or console)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Console => write!(f, "console"),
        }
    }
}

/// Port for writing signal reports.
pub trait ReportPort {
    fn write(&self, run: &SignalRun, out: &mut dyn Write) -> Result<(), SignalError>;

    /// Default implementation: writes each run in turn.
    fn write_multi(&self, runs: &[SignalRun], out: &mut dyn Write) -> Result<(), SignalError> {
        for run in runs {
            self.write(run, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.CSV")).unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("a/b.json")).unwrap(), OutputFormat::Json);
        assert!(matches!(
            OutputFormat::from_path(Path::new("out.xlsx")),
            Err(SignalError::Serialization { .. })
        ));
        assert!(matches!(
            OutputFormat::from_path(Path::new("out")),
            Err(SignalError::Serialization { .. })
        ));
    }

    #[test]
    fn format_from_name() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("console".parse::<OutputFormat>().unwrap(), OutputFormat::Console);
        assert!(matches!(
            "parquet".parse::<OutputFormat>(),
            Err(SignalError::Serialization { .. })
        ));
    }
}
