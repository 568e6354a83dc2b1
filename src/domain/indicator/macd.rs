//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars.

use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[PricePoint],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let placeholder = IndicatorValue::Macd {
        line: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::absent(indicator_type, bars, placeholder);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_of(&closes, fast);
    let ema_slow = ema_of(&closes, slow);

    let line_start = fast.max(slow) - 1;
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .skip(line_start)
        .map(|(f, s)| f.unwrap_or(0.0) - s.unwrap_or(0.0))
        .collect();
    let signal_line = ema_of(&macd_line, signal_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let defined = i
                .checked_sub(line_start)
                .and_then(|j| signal_line[j].map(|sig| (macd_line[j], sig)));
            match defined {
                Some((line, signal)) => IndicatorPoint::present(
                    bar.timestamp,
                    IndicatorValue::Macd {
                        line,
                        signal,
                        histogram: line - signal,
                    },
                ),
                None => IndicatorPoint::absent(bar.timestamp, placeholder.clone()),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[PricePoint]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_ema;
    use crate::domain::indicator::test_support::make_bars;

    fn rising(n: usize) -> Vec<PricePoint> {
        let prices: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&prices)
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd_default(&rising(40));

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        for i in 0..warmup {
            assert!(!series.values[i].valid, "Index {} should not be valid", i);
        }
        assert!(series.values[warmup].valid, "Index {} should be valid", warmup);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd_default(&rising(40));

        for point in &series.values {
            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = point.get()
            {
                assert!((histogram - (line - signal)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_signal_seed_is_mean_of_first_lines() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]);
        let series = calculate_macd(&bars, 3, 5, 2);

        let fast = calculate_ema(&bars, 3);
        let slow = calculate_ema(&bars, 5);
        let line = |i: usize| fast.values[i].simple().unwrap() - slow.values[i].simple().unwrap();

        // First line at index 4, signal seeds at index 5.
        assert!(!series.values[4].valid);
        match series.values[5].get() {
            Some(IndicatorValue::Macd { line: l, signal, .. }) => {
                assert!((l - line(5)).abs() < 1e-12);
                assert!((signal - (line(4) + line(5)) / 2.0).abs() < 1e-12);
            }
            other => panic!("expected MACD value, got {:?}", other),
        }
    }

    #[test]
    fn macd_rising_series_has_positive_line() {
        let series = calculate_macd(&rising(30), 3, 6, 3);
        for point in series.values.iter().filter(|p| p.valid) {
            if let Some(IndicatorValue::Macd { line, .. }) = point.get() {
                assert!(*line > 0.0);
            }
        }
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&make_bars(&[100.0, 101.0, 102.0]), 5, 10, 3);

        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
        assert_eq!(series.values.len(), 3);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn macd_empty_bars() {
        let series = calculate_macd_default(&[]);
        assert!(series.values.is_empty());
    }

    #[test]
    fn macd_zero_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);

        assert_eq!(calculate_macd(&bars, 0, 26, 9).valid_count(), 0);
        assert_eq!(calculate_macd(&bars, 12, 0, 9).valid_count(), 0);
        assert_eq!(calculate_macd(&bars, 12, 26, 0).valid_count(), 0);
    }

    #[test]
    fn macd_custom_parameters() {
        let series = calculate_macd(&rising(20), 5, 10, 3);

        let warmup = 10 - 1 + 3 - 1;
        assert!(!series.values[warmup - 1].valid);
        assert!(series.values[warmup].valid);
    }
}
