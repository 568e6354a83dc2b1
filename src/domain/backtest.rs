//! Long-only replay of a signal series.
//!
//! A signal on bar `i` is filled at the open of bar `i + 1`, so a signal on
//! the final bar is never acted on. Equity is marked to market at every close.

use crate::domain::metrics::{EquityPoint, EvaluationReport};
use crate::domain::signal::{Action, Signal};
use crate::domain::time_series::TimeSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of notional charged on each fill.
    pub commission_pct: f64,
    /// Fraction by which fills are worsened.
    pub slippage_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            commission_pct: 0.0,
            slippage_pct: 0.0,
        }
    }
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Net of commission.
    pub return_pct: f64,
}

#[derive(Debug, Clone, Copy)]
struct Position {
    entry_time: DateTime<Utc>,
    entry_price: f64,
    units: f64,
    cost: f64,
}

/// Full backtest output: the report plus the trades and curve behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub report: EvaluationReport,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

pub fn evaluate(series: &TimeSeries, signals: &[Signal], config: &BacktestConfig) -> EvaluationReport {
    run_backtest(series, signals, config).report
}

pub fn run_backtest(series: &TimeSeries, signals: &[Signal], config: &BacktestConfig) -> BacktestResult {
    if signals.len() != series.len() {
        tracing::warn!(
            bars = series.len(),
            signals = signals.len(),
            "signal count does not match bar count; replaying the overlap"
        );
    }

    let bars = series.points();
    let mut cash = config.initial_capital;
    let mut position: Option<Position> = None;
    let mut pending: Option<Action> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut bars_long = 0usize;

    let steps = bars.len().min(signals.len());
    for (bar, signal) in bars.iter().zip(signals).take(steps) {
        match (pending.take(), position) {
            (Some(Action::Buy), None) => {
                let fill = bar.open * (1.0 + config.slippage_pct);
                if fill > 0.0 {
                    let units = cash / (fill * (1.0 + config.commission_pct));
                    position = Some(Position {
                        entry_time: bar.timestamp,
                        entry_price: fill,
                        units,
                        cost: cash,
                    });
                    cash = 0.0;
                }
            }
            (Some(Action::Sell), Some(open)) => {
                let fill = bar.open * (1.0 - config.slippage_pct);
                let proceeds = open.units * fill * (1.0 - config.commission_pct);
                let return_pct = if open.cost > 0.0 {
                    proceeds / open.cost - 1.0
                } else {
                    0.0
                };
                trades.push(Trade {
                    entry_time: open.entry_time,
                    exit_time: bar.timestamp,
                    entry_price: open.entry_price,
                    exit_price: fill,
                    return_pct,
                });
                cash = proceeds;
                position = None;
            }
            _ => {}
        }

        let equity = match position {
            Some(open) => {
                bars_long += 1;
                open.units * bar.close
            }
            None => cash,
        };
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
        });

        pending = match signal.action {
            Action::Hold => None,
            action => Some(action),
        };
    }

    let open_position_return = position.and_then(|open| {
        let last = bars.get(steps.checked_sub(1)?)?;
        (open.cost > 0.0).then(|| open.units * last.close / open.cost - 1.0)
    });

    let report = EvaluationReport::compute(
        config.initial_capital,
        &equity_curve,
        &trades,
        bars_long,
        open_position_return,
    );
    tracing::info!(
        symbol = series.symbol(),
        trades = report.trade_count,
        total_return = report.total_return,
        max_drawdown = report.max_drawdown,
        "backtest complete"
    );

    BacktestResult {
        report,
        trades,
        equity_curve,
    }
}
