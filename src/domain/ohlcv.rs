//! OHLCV bar representation.

use crate::domain::error::SignalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Check the bar invariant `high >= max(open, close) >= min(open, close) >= low >= 0`.
    ///
    /// `row` is the 1-based data row used in the error message.
    pub fn validate(&self, row: usize) -> Result<(), SignalError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SignalError::data_format(row, field, "value is not finite"));
            }
            if value < 0.0 {
                return Err(SignalError::data_format(
                    row,
                    field,
                    format!("negative value {value}"),
                ));
            }
        }

        let body_high = self.open.max(self.close);
        let body_low = self.open.min(self.close);
        if self.high < body_high {
            return Err(SignalError::data_format(
                row,
                "high",
                format!("high {} is below max(open, close) {}", self.high, body_high),
            ));
        }
        if self.low > body_low {
            return Err(SignalError::data_format(
                row,
                "low",
                format!("low {} is above min(open, close) {}", self.low, body_low),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> PricePoint {
        PricePoint {
            symbol: "BTC-USD".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate(1).is_ok());
    }

    #[test]
    fn flat_bar_passes() {
        let bar = PricePoint {
            open: 5.0,
            high: 5.0,
            low: 5.0,
            close: 5.0,
            volume: 0.0,
            ..sample_bar()
        };
        assert!(bar.validate(1).is_ok());
    }

    #[test]
    fn high_below_close_fails() {
        let bar = PricePoint {
            high: 104.0,
            ..sample_bar()
        };
        let err = bar.validate(4).unwrap_err();
        assert!(matches!(err, SignalError::DataFormat { row: 4, ref field, .. } if field == "high"));
    }

    #[test]
    fn low_above_open_fails() {
        let bar = PricePoint {
            low: 101.0,
            ..sample_bar()
        };
        let err = bar.validate(2).unwrap_err();
        assert!(matches!(err, SignalError::DataFormat { ref field, .. } if field == "low"));
    }

    #[test]
    fn negative_volume_fails() {
        let bar = PricePoint {
            volume: -1.0,
            ..sample_bar()
        };
        let err = bar.validate(9).unwrap_err();
        assert!(matches!(err, SignalError::DataFormat { ref field, .. } if field == "volume"));
    }

    #[test]
    fn nan_close_fails() {
        let bar = PricePoint {
            close: f64::NAN,
            ..sample_bar()
        };
        assert!(bar.validate(1).is_err());
    }
}
