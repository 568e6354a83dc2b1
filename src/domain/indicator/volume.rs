//! Volume ratio indicator.
//!
//! VOLUME_RATIO(n)[i] = V[i] / (V[i-n+1] + ... + V[i]) / n
//!
//! Values above 1 mark bars traded more heavily than the recent average.
//! Warmup: first (n-1) bars are invalid. Bars whose average volume is zero
//! are also invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_volume_ratio(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::VolumeRatio(period);
    if period == 0 {
        return IndicatorSeries::absent(indicator_type, bars, IndicatorValue::Simple(0.0));
    }

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint::absent(bar.timestamp, IndicatorValue::Simple(0.0)));
            continue;
        }
        let avg = bars[i + 1 - period..=i].iter().map(|b| b.volume).sum::<f64>() / period as f64;
        if avg > 0.0 {
            values.push(IndicatorPoint::present(
                bar.timestamp,
                IndicatorValue::Simple(bar.volume / avg),
            ));
        } else {
            values.push(IndicatorPoint::absent(bar.timestamp, IndicatorValue::Simple(0.0)));
        }
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
