//! Data access port trait.

use crate::domain::error::{DataGapError, SignalError};
use crate::domain::time_series::TimeSeries;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where raw bars come from: a file, or standard input when given `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Stdin,
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            DataSource::Stdin
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        match self {
            DataSource::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase()),
            DataSource::Stdin => None,
        }
    }

    /// File stem, used as the symbol for files without a symbol column.
    pub fn stem(&self) -> Option<&str> {
        match self {
            DataSource::File(path) => Path::new(path).file_stem().and_then(|s| s.to_str()),
            DataSource::Stdin => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Stdin => write!(f, "<stdin>"),
        }
    }
}

/// A validated series plus the gaps found while loading it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub series: TimeSeries,
    pub gaps: Vec<DataGapError>,
}

pub trait DataPort {
    /// Load every bar for `symbol`. Fails with `NoData` when there are none.
    fn fetch_series(&self, symbol: &str) -> Result<LoadedSeries, SignalError>;

    /// Distinct symbols available from this source, in first-seen order.
    fn list_symbols(&self) -> Result<Vec<String>, SignalError>;
}
