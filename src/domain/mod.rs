//! Core domain types and logic.

pub mod ohlcv;
pub mod time_series;
pub mod indicator;
pub mod indicator_set;
pub mod regime;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
