//! Indicator results for one series, plus an in-run cache.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::time_series::TimeSeries;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// All requested indicators for a single [`TimeSeries`], keyed by type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: BTreeMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorSet {
    /// Compute each distinct indicator once.
    ///
    /// Indicators only read the series, so with the `parallel` feature they
    /// are spread across the rayon pool; the resulting map is identical.
    pub fn compute(series: &TimeSeries, types: &[IndicatorType]) -> Self {
        let distinct: BTreeSet<IndicatorType> = types.iter().copied().collect();

        #[cfg(feature = "parallel")]
        let computed: Vec<(IndicatorType, IndicatorSeries)> = distinct
            .into_par_iter()
            .map(|t| (t, t.compute(series)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let computed: Vec<(IndicatorType, IndicatorSeries)> = distinct
            .into_iter()
            .map(|t| (t, t.compute(series)))
            .collect();

        tracing::debug!(
            symbol = series.symbol(),
            count = computed.len(),
            "computed indicators"
        );
        Self {
            series: computed.into_iter().collect(),
        }
    }

    fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.indicator_type, series);
    }

    pub fn get(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Value of `indicator` at bar `index`, `None` when absent or not computed.
    pub fn value_at(&self, indicator: &IndicatorType, index: usize) -> Option<&IndicatorValue> {
        self.series
            .get(indicator)
            .and_then(|s| s.values.get(index))
            .and_then(|p| p.get())
    }

    pub fn simple_at(&self, indicator: &IndicatorType, index: usize) -> Option<f64> {
        match self.value_at(indicator, index) {
            Some(IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Memoises indicator series within a single run.
///
/// Entries are keyed by the series fingerprint together with the indicator
/// type, so a changed series can never be served a stale result.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    entries: HashMap<(u64, IndicatorType), IndicatorSeries>,
    hits: usize,
    misses: usize,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, series: &TimeSeries, indicator: IndicatorType) -> &IndicatorSeries {
        let key = (series.fingerprint(), indicator);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries
            .entry(key)
            .or_insert_with(|| indicator.compute(series))
    }

    /// Build an [`IndicatorSet`], computing only the entries not cached yet.
    pub fn compute_set(&mut self, series: &TimeSeries, types: &[IndicatorType]) -> IndicatorSet {
        let fingerprint = series.fingerprint();
        let missing: Vec<IndicatorType> = types
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|t| !self.entries.contains_key(&(fingerprint, *t)))
            .collect();

        self.misses += missing.len();
        self.hits += types.iter().collect::<BTreeSet<_>>().len() - missing.len();

        let fresh = IndicatorSet::compute(series, &missing);
        for (ty, computed) in fresh.series {
            self.entries.insert((fingerprint, ty), computed);
        }

        let mut set = IndicatorSet::default();
        for ty in types {
            if let Some(cached) = self.entries.get(&(fingerprint, *ty)) {
                set.insert(cached.clone());
            }
        }
        tracing::debug!(hits = self.hits, misses = self.misses, "indicator cache");
        set
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
