//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_ema(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_of(&closes, period);

    let values = bars
        .iter()
        .zip(raw)
        .map(|(bar, v)| match v {
            Some(ema) => IndicatorPoint::present(bar.timestamp, IndicatorValue::Simple(ema)),
            None => IndicatorPoint::absent(bar.timestamp, IndicatorValue::Simple(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary sequence, `None` for warm-up entries.
///
/// Shared by MACD, which smooths its own line rather than closes.
pub(crate) fn ema_of(inputs: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; inputs.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(inputs.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in inputs.iter().enumerate() {
        if i < period - 1 {
            sum += x;
            out.push(None);
        } else if i == period - 1 {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = x * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);

        assert_eq!(series.values[0].simple(), Some(10.0));
        assert_eq!(series.values[1].simple(), Some(20.0));
        assert_eq!(series.values[2].simple(), Some(30.0));
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);

        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        let v = series.values[2].simple().unwrap();
        assert!((v - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((series.values[3].simple().unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((series.values[4].simple().unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let series = calculate_ema(&bars, 3);

        for point in &series.values[2..] {
            assert!((point.simple().unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_indicator_type() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 5);

        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn ema_empty_bars() {
        let series = calculate_ema(&[], 3);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_period_0() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_ema(&bars, 0);
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }
}
