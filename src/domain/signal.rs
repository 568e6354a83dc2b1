//! Buy/sell/hold signal generation.
//!
//! Two policies are available, both driven by an immutable [`SignalConfig`]:
//! - `Crossover`: fast/slow moving-average crossovers filtered by RSI and,
//!   optionally, confirmed by the MACD histogram.
//! - `Adaptive`: picks a trend-following or mean-reversion rule per bar from
//!   the ADX market regime, then drops repeated signals.
//!
//! Exactly one [`Signal`] is produced per bar. Bars whose required indicators
//! are still warming up get `HOLD` with confidence 0.

use crate::domain::indicator::bollinger::mult_to_x100;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::indicator_set::IndicatorSet;
use crate::domain::regime::{classify, detect_regimes, Regime};
use crate::domain::time_series::TimeSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const REASON_WARMUP: &str = "warm-up";

/// Closes within this fraction of a Bollinger band count as touching it.
const BAND_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            other => Err(format!("unknown action `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Crossover,
    Adaptive,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Crossover => write!(f, "crossover"),
            StrategyKind::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crossover" => Ok(StrategyKind::Crossover),
            "adaptive" => Ok(StrategyKind::Adaptive),
            other => Err(format!("unknown strategy `{other}` (expected crossover or adaptive)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    Sma,
    Ema,
}

impl FromStr for MaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(MaType::Sma),
            "ema" => Ok(MaType::Ema),
            other => Err(format!("unknown moving average `{other}` (expected sma or ema)")),
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::Sma => write!(f, "sma"),
            MaType::Ema => write!(f, "ema"),
        }
    }
}

/// Signal rule parameters. Built once per run and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub strategy: StrategyKind,
    pub ma_type: MaType,
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_confirm: bool,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Relative fast/slow spread that maps to full confidence.
    pub confidence_spread: f64,
    pub bb_period: usize,
    pub bb_stddev: f64,
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub volume_period: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Crossover,
            ma_type: MaType::Sma,
            fast_ma: 5,
            slow_ma: 20,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_confirm: false,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            confidence_spread: 0.02,
            bb_period: 20,
            bb_stddev: 2.0,
            adx_period: 14,
            adx_threshold: 25.0,
            volume_period: 20,
        }
    }
}

impl SignalConfig {
    fn moving_average(&self, period: usize) -> IndicatorType {
        match self.ma_type {
            MaType::Sma => IndicatorType::Sma(period),
            MaType::Ema => IndicatorType::Ema(period),
        }
    }

    pub fn fast_indicator(&self) -> IndicatorType {
        self.moving_average(self.fast_ma)
    }

    pub fn slow_indicator(&self) -> IndicatorType {
        self.moving_average(self.slow_ma)
    }

    pub fn rsi_indicator(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    pub fn macd_indicator(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn bollinger_indicator(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bb_period,
            stddev_mult_x100: mult_to_x100(self.bb_stddev),
        }
    }

    pub fn adx_indicator(&self) -> IndicatorType {
        IndicatorType::Adx(self.adx_period)
    }

    pub fn volume_indicator(&self) -> IndicatorType {
        IndicatorType::VolumeRatio(self.volume_period)
    }

    /// Indicators the configured policy reads.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        let mut types = vec![
            self.fast_indicator(),
            self.slow_indicator(),
            self.rsi_indicator(),
        ];
        match self.strategy {
            StrategyKind::Crossover => {
                if self.macd_confirm {
                    types.push(self.macd_indicator());
                }
            }
            StrategyKind::Adaptive => {
                types.push(self.adx_indicator());
                types.push(self.bollinger_indicator());
                types.push(self.volume_indicator());
            }
        }
        types
    }

    /// Required indicators plus the ones shown in the latest-signal summary.
    pub fn report_indicators(&self) -> Vec<IndicatorType> {
        let mut types = self.required_indicators();
        let adx = self.adx_indicator();
        if !types.contains(&adx) {
            types.push(adx);
        }
        types
    }

    /// Bars needed before every required indicator is defined.
    pub fn largest_window(&self) -> usize {
        self.required_indicators()
            .iter()
            .map(|t| t.warmup() + 1)
            .max()
            .unwrap_or(0)
    }

    fn is_overbought(&self, rsi: f64) -> bool {
        rsi > self.rsi_overbought
    }

    fn is_oversold(&self, rsi: f64) -> bool {
        rsi < self.rsi_oversold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub confidence: f64,
    #[serde(default)]
    pub contributing: Vec<String>,
    #[serde(default)]
    pub regime: Option<Regime>,
    #[serde(default)]
    pub reason: String,
}

impl Signal {
    /// Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn new(
        timestamp: DateTime<Utc>,
        action: Action,
        confidence: f64,
        contributing: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            timestamp,
            action,
            confidence,
            contributing,
            regime: None,
            reason: reason.into(),
        }
    }

    pub fn hold(timestamp: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(timestamp, Action::Hold, 0.0, Vec::new(), reason)
    }

    fn with_regime(mut self, regime: Option<Regime>) -> Self {
        self.regime = regime;
        self
    }
}

/// Compact summary of the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSignal {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub action: Action,
    pub confidence: f64,
    pub regime: Option<Regime>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
}

/// Produce one signal per bar of `series`.
pub fn generate_signals(
    series: &TimeSeries,
    indicators: &IndicatorSet,
    config: &SignalConfig,
) -> Vec<Signal> {
    let signals = match config.strategy {
        StrategyKind::Crossover => crossover_signals(series, indicators, config),
        StrategyKind::Adaptive => adaptive_signals(series, indicators, config),
    };
    let buys = signals.iter().filter(|s| s.action == Action::Buy).count();
    let sells = signals.iter().filter(|s| s.action == Action::Sell).count();
    tracing::info!(
        symbol = series.symbol(),
        strategy = %config.strategy,
        bars = signals.len(),
        buys,
        sells,
        "generated signals"
    );
    signals
}

/// Summary of the final bar, `None` for an empty series.
pub fn latest_signal(
    series: &TimeSeries,
    signals: &[Signal],
    indicators: &IndicatorSet,
    config: &SignalConfig,
) -> Option<LatestSignal> {
    let index = series.len().checked_sub(1)?;
    let bar = series.last()?;
    let signal = signals.get(index)?;
    let adx = match indicators.value_at(&config.adx_indicator(), index) {
        Some(IndicatorValue::Adx { adx, .. }) => Some(*adx),
        _ => None,
    };
    let regime = signal
        .regime
        .or_else(|| adx.map(|a| classify(a, config.adx_threshold)));
    Some(LatestSignal {
        symbol: series.symbol().to_string(),
        timestamp: bar.timestamp,
        price: bar.close,
        action: signal.action,
        confidence: signal.confidence,
        regime,
        rsi: indicators.simple_at(&config.rsi_indicator(), index),
        adx,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Unknown,
    Above,
    Below,
}

fn spread_confidence(fast: f64, slow: f64, full_spread: f64) -> f64 {
    if slow == 0.0 || full_spread <= 0.0 {
        return 0.0;
    }
    ((fast - slow).abs() / slow.abs() / full_spread).clamp(0.0, 1.0)
}

fn overbought_confidence(rsi: f64, threshold: f64) -> f64 {
    let room = 100.0 - threshold;
    if room <= 0.0 {
        return 0.0;
    }
    ((rsi - threshold) / room).clamp(0.0, 1.0)
}

fn oversold_confidence(rsi: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    ((threshold - rsi) / threshold).clamp(0.0, 1.0)
}

fn crossover_signals(
    series: &TimeSeries,
    indicators: &IndicatorSet,
    config: &SignalConfig,
) -> Vec<Signal> {
    let fast_ty = config.fast_indicator();
    let slow_ty = config.slow_indicator();
    let rsi_ty = config.rsi_indicator();
    let macd_ty = config.macd_indicator();

    let mut relation = Relation::Unknown;
    let mut signals = Vec::with_capacity(series.len());

    for (i, bar) in series.points().iter().enumerate() {
        let ts = bar.timestamp;
        let (Some(fast), Some(slow), Some(rsi_now)) = (
            indicators.simple_at(&fast_ty, i),
            indicators.simple_at(&slow_ty, i),
            indicators.simple_at(&rsi_ty, i),
        ) else {
            signals.push(Signal::hold(ts, REASON_WARMUP));
            continue;
        };

        let histogram = if config.macd_confirm {
            match indicators.value_at(&macd_ty, i) {
                Some(IndicatorValue::Macd { histogram, .. }) => Some(*histogram),
                _ => {
                    signals.push(Signal::hold(ts, REASON_WARMUP));
                    continue;
                }
            }
        } else {
            None
        };

        let diff = fast - slow;
        let bullish = diff > 0.0 && relation != Relation::Above;
        let bearish = diff < 0.0 && relation != Relation::Below;
        if diff > 0.0 {
            relation = Relation::Above;
        } else if diff < 0.0 {
            relation = Relation::Below;
        }

        let overbought = config.is_overbought(rsi_now);

        let macd_up = histogram.is_none_or(|h| h > 0.0);
        let macd_down = histogram.is_none_or(|h| h < 0.0);

        let mut contributing = vec![fast_ty.to_string(), slow_ty.to_string()];
        if histogram.is_some() {
            contributing.push(macd_ty.to_string());
        }

        if bullish && !overbought && macd_up {
            contributing.push(rsi_ty.to_string());
            signals.push(Signal::new(
                ts,
                Action::Buy,
                spread_confidence(fast, slow, config.confidence_spread),
                contributing,
                format!("{fast_ty} crossed above {slow_ty}"),
            ));
            continue;
        }

        let cross_sell = bearish && macd_down;
        if cross_sell || overbought {
            let mut confidence: f64 = 0.0;
            let mut reasons = Vec::new();
            if cross_sell {
                confidence = confidence.max(spread_confidence(fast, slow, config.confidence_spread));
                reasons.push(format!("{fast_ty} crossed below {slow_ty}"));
            } else {
                contributing.clear();
            }
            if overbought {
                confidence = confidence.max(overbought_confidence(rsi_now, config.rsi_overbought));
                reasons.push(format!("{rsi_ty} above {}", config.rsi_overbought));
                contributing.push(rsi_ty.to_string());
            }
            signals.push(Signal::new(
                ts,
                Action::Sell,
                confidence,
                contributing,
                reasons.join("; "),
            ));
            continue;
        }

        let reason = if diff == 0.0 {
            "moving averages tied"
        } else if bullish {
            "crossover filtered"
        } else {
            "no crossover"
        };
        signals.push(Signal::hold(ts, reason));
    }

    signals
}

fn adaptive_signals(
    series: &TimeSeries,
    indicators: &IndicatorSet,
    config: &SignalConfig,
) -> Vec<Signal> {
    let fast_ty = config.fast_indicator();
    let slow_ty = config.slow_indicator();
    let rsi_ty = config.rsi_indicator();
    let bb_ty = config.bollinger_indicator();
    let vol_ty = config.volume_indicator();
    let adx_ty = config.adx_indicator();

    let regimes = detect_regimes(indicators, &adx_ty, config.adx_threshold, series.len());
    let mut prev_raw = Action::Hold;
    let mut signals = Vec::with_capacity(series.len());

    for (i, bar) in series.points().iter().enumerate() {
        let ts = bar.timestamp;
        let regime = regimes[i];

        let raw = match regime {
            Some(Regime::Trend) => trend_rule(indicators, config, i, fast_ty, slow_ty, vol_ty, adx_ty),
            Some(Regime::Range) => range_rule(indicators, config, i, bar.close, rsi_ty, bb_ty, adx_ty),
            None => None,
        };

        let Some(candidate) = raw else {
            prev_raw = Action::Hold;
            signals.push(Signal::hold(ts, REASON_WARMUP).with_regime(regime));
            continue;
        };

        let repeated = candidate.action != Action::Hold && candidate.action == prev_raw;
        prev_raw = candidate.action;
        let signal = if repeated {
            Signal::hold(ts, format!("repeated {} filtered", candidate.action))
        } else if candidate.action == Action::Hold {
            Signal::hold(ts, candidate.reason)
        } else {
            Signal::new(ts, candidate.action, candidate.confidence, candidate.contributing, candidate.reason)
        };
        signals.push(signal.with_regime(regime));
    }

    signals
}

struct Candidate {
    action: Action,
    confidence: f64,
    contributing: Vec<String>,
    reason: String,
}

fn trend_rule(
    indicators: &IndicatorSet,
    config: &SignalConfig,
    i: usize,
    fast_ty: IndicatorType,
    slow_ty: IndicatorType,
    vol_ty: IndicatorType,
    adx_ty: IndicatorType,
) -> Option<Candidate> {
    let fast = indicators.simple_at(&fast_ty, i)?;
    let slow = indicators.simple_at(&slow_ty, i)?;
    let volume_ratio = indicators.simple_at(&vol_ty, i)?;

    let contributing = vec![
        adx_ty.to_string(),
        fast_ty.to_string(),
        slow_ty.to_string(),
        vol_ty.to_string(),
    ];
    let confidence = spread_confidence(fast, slow, config.confidence_spread);
    let heavy = volume_ratio > 1.0;

    let (action, reason) = if heavy && fast > slow {
        (Action::Buy, format!("trend: {fast_ty} above {slow_ty} on heavy volume"))
    } else if heavy && fast < slow {
        (Action::Sell, format!("trend: {fast_ty} below {slow_ty} on heavy volume"))
    } else {
        (Action::Hold, "trend: no confirmed direction".to_string())
    };
    Some(Candidate {
        action,
        confidence,
        contributing,
        reason,
    })
}

fn range_rule(
    indicators: &IndicatorSet,
    config: &SignalConfig,
    i: usize,
    close: f64,
    rsi_ty: IndicatorType,
    bb_ty: IndicatorType,
    adx_ty: IndicatorType,
) -> Option<Candidate> {
    let rsi = indicators.simple_at(&rsi_ty, i)?;
    let (upper, lower) = match indicators.value_at(&bb_ty, i)? {
        IndicatorValue::Bollinger { upper, lower, .. } => (*upper, *lower),
        _ => return None,
    };

    let contributing = vec![adx_ty.to_string(), rsi_ty.to_string(), bb_ty.to_string()];
    let candidate = if config.is_oversold(rsi) && close < lower * (1.0 + BAND_TOLERANCE) {
        Candidate {
            action: Action::Buy,
            confidence: oversold_confidence(rsi, config.rsi_oversold),
            contributing,
            reason: format!("range: {rsi_ty} oversold near lower band"),
        }
    } else if config.is_overbought(rsi) && close > upper * (1.0 - BAND_TOLERANCE) {
        Candidate {
            action: Action::Sell,
            confidence: overbought_confidence(rsi, config.rsi_overbought),
            contributing,
            reason: format!("range: {rsi_ty} overbought near upper band"),
        }
    } else {
        Candidate {
            action: Action::Hold,
            confidence: 0.0,
            contributing,
            reason: "range: inside bands".to_string(),
        }
    };
    Some(candidate)
}
