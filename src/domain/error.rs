//! Domain error types.

use chrono::{DateTime, Utc};

/// Top-level error type for coinsignal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("malformed input at row {row}, field `{field}`: {reason}")]
    DataFormat {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("timestamps out of order at row {row}: {current} does not follow {previous}")]
    Ordering {
        row: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub fn data_format(row: usize, field: &str, reason: impl Into<String>) -> Self {
        SignalError::DataFormat {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn serialization(reason: impl Into<String>) -> Self {
        SignalError::Serialization {
            reason: reason.into(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataFormat { .. } => 3,
            SignalError::Ordering { .. } => 4,
            SignalError::NoData { .. } => 5,
            SignalError::Serialization { .. } => 6,
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

/// A gap between consecutive bars wider than the configured threshold.
///
/// Gaps are recoverable: the loader logs them and keeps going, so this type is
/// never returned inside a `Result`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("data gap before row {row}: {previous} -> {current} ({missing_bars} missing bars)")]
pub struct DataGapError {
    pub row: usize,
    pub previous: DateTime<Utc>,
    pub current: DateTime<Utc>,
    pub missing_bars: usize,
}
