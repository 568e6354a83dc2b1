//! Simple Moving Average indicator.
//!
//! O(n) sliding window: add the newest close, drop the one leaving the window.
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_sma(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::absent(IndicatorType::Sma(period), bars, IndicatorValue::Simple(0.0));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if i >= period {
            window_sum -= bars[i - period].close;
        }

        if i + 1 >= period {
            // Re-sum periodically so long series do not accumulate drift.
            if i % 1024 == 0 {
                window_sum = bars[i + 1 - period..=i].iter().map(|b| b.close).sum();
            }
            values.push(IndicatorPoint::present(
                bar.timestamp,
                IndicatorValue::Simple(window_sum / period as f64),
            ));
        } else {
            values.push(IndicatorPoint::absent(bar.timestamp, IndicatorValue::Simple(0.0)));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn sma_values() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert_eq!(series.values[2].simple(), Some(20.0));
        assert_eq!(series.values[3].simple(), Some(30.0));
        assert_eq!(series.values[4].simple(), Some(40.0));
    }

    #[test]
    fn sma_period_1_is_close() {
        let bars = make_bars(&[7.0, 8.0, 9.0]);
        let series = calculate_sma(&bars, 1);
        let got: Vec<_> = series.values.iter().map(|p| p.simple()).collect();
        assert_eq!(got, vec![Some(7.0), Some(8.0), Some(9.0)]);
    }

    #[test]
    fn sma_shorter_than_window_is_all_absent() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 5);
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn sma_period_0_is_all_absent() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 0);
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn sma_empty_bars() {
        let series = calculate_sma(&[], 3);
        assert!(series.values.is_empty());
        assert_eq!(series.indicator_type, IndicatorType::Sma(3));
    }

    #[test]
    fn sma_long_series_matches_naive_sum() {
        let prices: Vec<f64> = (0..3000).map(|i| 100.0 + (i as f64 * 0.013).cos()).collect();
        let bars = make_bars(&prices);
        let series = calculate_sma(&bars, 20);
        for i in [19, 1024, 2047, 2999] {
            let naive: f64 = prices[i + 1 - 20..=i].iter().sum::<f64>() / 20.0;
            let got = series.values[i].simple().unwrap();
            assert!((got - naive).abs() < 1e-9, "index {i}: {got} vs {naive}");
        }
    }
}
