//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n bars
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_rsi(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::absent(IndicatorType::Rsi(period), bars, IndicatorValue::Simple(0.0));
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::absent(bars[0].timestamp, IndicatorValue::Simple(0.0)));

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change = bar.close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let changes_seen = i;

        if changes_seen < period {
            gain_sum += gain;
            loss_sum += loss;
            values.push(IndicatorPoint::absent(bar.timestamp, IndicatorValue::Simple(0.0)));
            continue;
        }

        if changes_seen == period {
            avg_gain = (gain_sum + gain) / period as f64;
            avg_loss = (loss_sum + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        values.push(IndicatorPoint::present(
            bar.timestamp,
            IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)),
        ));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
