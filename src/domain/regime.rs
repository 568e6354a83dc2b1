//! Market regime classification from trend strength.

use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::indicator_set::IndicatorSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Trend,
    Range,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Trend => write!(f, "trend"),
            Regime::Range => write!(f, "range"),
        }
    }
}

impl std::str::FromStr for Regime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trend" => Ok(Regime::Trend),
            "range" => Ok(Regime::Range),
            other => Err(format!("unknown regime `{other}`")),
        }
    }
}

/// ADX strictly above the threshold is a trending market, anything else ranges.
pub fn classify(adx: f64, threshold: f64) -> Regime {
    if adx > threshold {
        Regime::Trend
    } else {
        Regime::Range
    }
}

/// Regime of every bar, `None` while ADX is still warming up.
pub fn detect_regimes(
    indicators: &IndicatorSet,
    adx: &IndicatorType,
    threshold: f64,
    len: usize,
) -> Vec<Option<Regime>> {
    (0..len)
        .map(|i| match indicators.value_at(adx, i) {
            Some(IndicatorValue::Adx { adx, .. }) => Some(classify(*adx, threshold)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_hlc_bars;
    use crate::domain::time_series::TimeSeries;

    #[test]
    fn classify_uses_strict_threshold() {
        assert_eq!(classify(30.0, 25.0), Regime::Trend);
        assert_eq!(classify(25.0, 25.0), Regime::Range);
        assert_eq!(classify(5.0, 25.0), Regime::Range);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("Trend".parse::<Regime>().unwrap(), Regime::Trend);
        assert_eq!(Regime::Range.to_string(), "range");
        assert!("sideways".parse::<Regime>().is_err());
    }

    #[test]
    fn detect_regimes_marks_warmup_unknown() {
        let hlc: Vec<_> = (0..20)
            .map(|i| {
                let c = 100.0 + 3.0 * i as f64;
                (c + 1.0, c - 1.0, c)
            })
            .collect();
        let series = TimeSeries::new("TEST", make_hlc_bars(&hlc)).unwrap();
        let adx = IndicatorType::Adx(3);
        let set = IndicatorSet::compute(&series, &[adx]);

        let regimes = detect_regimes(&set, &adx, 25.0, series.len());
        assert_eq!(regimes.len(), 20);
        assert!(regimes[..5].iter().all(Option::is_none));
        assert!(regimes[5..].iter().all(|r| *r == Some(Regime::Trend)));
    }

    #[test]
    fn flat_market_is_range() {
        let series = TimeSeries::new("TEST", make_hlc_bars(&[(101.0, 99.0, 100.0); 12])).unwrap();
        let adx = IndicatorType::Adx(3);
        let set = IndicatorSet::compute(&series, &[adx]);
        let regimes = detect_regimes(&set, &adx, 25.0, series.len());
        assert_eq!(regimes.last().copied().flatten(), Some(Regime::Range));
    }
}
