//! Validated, ordered price series for a single symbol.

use crate::domain::error::{DataGapError, SignalError};
use crate::domain::ohlcv::PricePoint;
use chrono::Duration;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Gaps wider than this multiple of the median bar spacing are reported when
/// no explicit threshold is configured.
pub const DEFAULT_GAP_FACTOR: f64 = 1.5;

/// Ordered sequence of bars with strictly increasing timestamps.
///
/// There is no mutable access: a series is built once by [`TimeSeries::new`]
/// and shared read-only by every later stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TimeSeries {
    /// Validate every bar and the timestamp ordering.
    ///
    /// Row numbers in errors are 1-based positions in `points`.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SignalError> {
        for (i, point) in points.iter().enumerate() {
            point.validate(i + 1)?;
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SignalError::Ordering {
                    row: i + 2,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Median spacing between consecutive bars, `None` for fewer than two bars.
    pub fn median_spacing(&self) -> Option<Duration> {
        if self.points.len() < 2 {
            return None;
        }
        let mut spacings: Vec<i64> = self
            .points
            .windows(2)
            .map(|w| (w[1].timestamp - w[0].timestamp).num_milliseconds())
            .collect();
        spacings.sort_unstable();
        Some(Duration::milliseconds(spacings[spacings.len() / 2]))
    }

    /// Report every gap between consecutive bars wider than `threshold`.
    ///
    /// Without a threshold, gaps are measured against
    /// `DEFAULT_GAP_FACTOR` x the median spacing.
    pub fn detect_gaps(&self, threshold: Option<Duration>) -> Vec<DataGapError> {
        let Some(spacing) = self.median_spacing() else {
            return Vec::new();
        };
        let spacing_ms = spacing.num_milliseconds();
        if spacing_ms <= 0 {
            return Vec::new();
        }
        let threshold_ms = match threshold {
            Some(t) => t.num_milliseconds(),
            None => (spacing_ms as f64 * DEFAULT_GAP_FACTOR) as i64,
        };

        self.points
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| {
                let delta_ms = (w[1].timestamp - w[0].timestamp).num_milliseconds();
                if delta_ms <= threshold_ms {
                    return None;
                }
                let steps = (delta_ms as f64 / spacing_ms as f64).round() as usize;
                Some(DataGapError {
                    row: i + 2,
                    previous: w[0].timestamp,
                    current: w[1].timestamp,
                    missing_bars: steps.saturating_sub(1).max(1),
                })
            })
            .collect()
    }

    /// Stable content hash, used to key cached indicator values.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.symbol.hash(&mut hasher);
        self.points.len().hash(&mut hasher);
        for p in &self.points {
            p.timestamp.timestamp_millis().hash(&mut hasher);
            for v in [p.open, p.high, p.low, p.close, p.volume] {
                v.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
