//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every indicator emits exactly one point per input bar. Points inside the
//! warm-up period carry `valid == false` and must be read through
//! [`IndicatorPoint::get`], which hides the placeholder value.

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume::calculate_volume_ratio;

use crate::domain::ohlcv::PricePoint;
use crate::domain::time_series::TimeSeries;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub fn absent(timestamp: DateTime<Utc>, value: IndicatorValue) -> Self {
        Self {
            timestamp,
            valid: false,
            value,
        }
    }

    pub fn present(timestamp: DateTime<Utc>, value: IndicatorValue) -> Self {
        Self {
            timestamp,
            valid: true,
            value,
        }
    }

    /// The value, or `None` during warm-up.
    pub fn get(&self) -> Option<&IndicatorValue> {
        self.valid.then_some(&self.value)
    }

    /// Shortcut for single-valued indicators.
    pub fn simple(&self) -> Option<f64> {
        match self.get() {
            Some(IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    VolumeRatio(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Single entry point for every indicator kind.
    pub fn compute(&self, series: &TimeSeries) -> IndicatorSeries {
        let bars = series.points();
        match *self {
            IndicatorType::Sma(period) => calculate_sma(bars, period),
            IndicatorType::Ema(period) => calculate_ema(bars, period),
            IndicatorType::Rsi(period) => calculate_rsi(bars, period),
            IndicatorType::Adx(period) => calculate_adx(bars, period),
            IndicatorType::VolumeRatio(period) => calculate_volume_ratio(bars, period),
            IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(bars, period, stddev_mult_x100),
        }
    }

    /// Number of leading bars that are absent for a long enough series.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::VolumeRatio(n)
            | IndicatorType::Bollinger { period: n, .. } => n.saturating_sub(1),
            IndicatorType::Rsi(n) => n,
            IndicatorType::Adx(n) => (2 * n).saturating_sub(1),
            IndicatorType::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// A series with one absent point per bar, used for degenerate parameters.
    pub fn absent(indicator_type: IndicatorType, bars: &[PricePoint], placeholder: IndicatorValue) -> Self {
        Self {
            indicator_type,
            values: bars
                .iter()
                .map(|b| IndicatorPoint::absent(b.timestamp, placeholder.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ohlcv::PricePoint;
    use chrono::{Duration, TimeZone, Utc};

    /// Daily bars with open = high = low = close.
    pub fn make_bars(prices: &[f64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                symbol: "TEST".into(),
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    pub fn make_hlc_bars(hlc: &[(f64, f64, f64)]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        hlc.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PricePoint {
                symbol: "TEST".into(),
                timestamp: start + Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}
