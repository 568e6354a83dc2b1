//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation of the window (divides by
//! N-1), so a one-bar window has zero width.
//! The multiplier is carried as hundredths so the indicator type stays hashable.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_bollinger(
    bars: &[PricePoint],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match window_stats(bars, i, period) {
            Some((middle, stddev)) => IndicatorPoint::present(
                bar.timestamp,
                IndicatorValue::Bollinger {
                    upper: middle + mult * stddev,
                    middle,
                    lower: middle - mult * stddev,
                },
            ),
            None => IndicatorPoint::absent(
                bar.timestamp,
                IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            ),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

/// Mean and sample standard deviation of the `period` closes ending at `i`.
fn window_stats(bars: &[PricePoint], i: usize, period: usize) -> Option<(f64, f64)> {
    if period == 0 || i + 1 < period {
        return None;
    }
    let window = &bars[i + 1 - period..=i];
    let mean: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
    if period == 1 {
        return Some((mean, 0.0));
    }
    let squares: f64 = window
        .iter()
        .map(|b| {
            let diff = b.close - mean;
            diff * diff
        })
        .sum();
    Some((mean, (squares / (period - 1) as f64).sqrt()))
}

/// Convert a multiplier such as `2.0` into the hundredths used by [`IndicatorType::Bollinger`].
pub fn mult_to_x100(mult: f64) -> u32 {
    (mult * 100.0).round().max(0.0) as u32
}
