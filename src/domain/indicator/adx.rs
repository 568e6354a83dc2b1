//! Average Directional Index indicator.
//!
//! Measures trend strength on a 0-100 scale, independent of direction.
//!
//! For each bar after the first:
//! - +DM = H[i]-H[i-1] when it exceeds L[i-1]-L[i] and is positive, else 0
//! - -DM = L[i-1]-L[i] when it exceeds H[i]-H[i-1] and is positive, else 0
//! - TR = max(H-L, |H-C[i-1]|, |L-C[i-1]|)
//!
//! TR, +DM and -DM are Wilder-smoothed over n changes, giving
//! +DI = 100 * +DM/TR, -DI = 100 * -DM/TR and DX = 100 * |+DI - -DI| / (+DI + -DI).
//! ADX seeds with the mean of the first n DX values and is Wilder-smoothed after.
//!
//! Warmup: first (2n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

const PLACEHOLDER: IndicatorValue = IndicatorValue::Adx {
    adx: 0.0,
    plus_di: 0.0,
    minus_di: 0.0,
};

pub fn calculate_adx(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::absent(IndicatorType::Adx(period), bars, PLACEHOLDER);
    }

    let n = period as f64;
    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::absent(bars[0].timestamp, PLACEHOLDER));

    let (mut tr_avg, mut plus_avg, mut minus_avg) = (0.0, 0.0, 0.0);
    let mut dx_sum = 0.0;
    let mut adx = 0.0;

    for i in 1..bars.len() {
        let bar = &bars[i];
        let prev = &bars[i - 1];

        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
        let tr = bar.true_range(prev.close);

        // `i` changes have been seen so far.
        if i <= period {
            tr_avg += tr / n;
            plus_avg += plus_dm / n;
            minus_avg += minus_dm / n;
            if i < period {
                values.push(IndicatorPoint::absent(bar.timestamp, PLACEHOLDER));
                continue;
            }
        } else {
            tr_avg = (tr_avg * (n - 1.0) + tr) / n;
            plus_avg = (plus_avg * (n - 1.0) + plus_dm) / n;
            minus_avg = (minus_avg * (n - 1.0) + minus_dm) / n;
        }

        let (plus_di, minus_di) = if tr_avg > 0.0 {
            (100.0 * plus_avg / tr_avg, 100.0 * minus_avg / tr_avg)
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            100.0 * (plus_di - minus_di).abs() / di_sum
        } else {
            0.0
        };

        // DX values exist from index `period`; ADX needs `period` of them.
        let dx_count = i + 1 - period;
        if dx_count < period {
            dx_sum += dx;
            values.push(IndicatorPoint::absent(bar.timestamp, PLACEHOLDER));
            continue;
        }
        adx = if dx_count == period {
            (dx_sum + dx) / n
        } else {
            (adx * (n - 1.0) + dx) / n
        };

        values.push(IndicatorPoint::present(
            bar.timestamp,
            IndicatorValue::Adx {
                adx,
                plus_di,
                minus_di,
            },
        ));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}
