//! Evaluation metrics for a replayed signal series.

use crate::domain::backtest::Trade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Outcome of a backtest.
///
/// `win_rate` is `None` when no trade was closed. Returns are fractions
/// (0.05 is +5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total_return: f64,
    pub win_rate: Option<f64>,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub max_drawdown_duration: usize,
    pub profit_factor: Option<f64>,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub final_equity: f64,
    pub exposure: f64,
    pub open_position_return: Option<f64>,
}

impl EvaluationReport {
    pub fn compute(
        initial_capital: f64,
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        bars_long: usize,
        open_position_return: Option<f64>,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let r = trade.return_pct;
            if r > 0.0 {
                wins += 1;
                total_wins += r;
                largest_win = largest_win.max(r);
            } else if r < 0.0 {
                losses += 1;
                total_losses += r.abs();
                largest_loss = largest_loss.max(r.abs());
            }
        }

        let trade_count = trades.len();
        let win_rate = (trade_count > 0).then(|| wins as f64 / trade_count as f64);

        let profit_factor = (total_losses > 0.0).then(|| total_wins / total_losses);

        let avg_win = if wins > 0 {
            total_wins / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        let exposure = if equity_curve.is_empty() {
            0.0
        } else {
            bars_long as f64 / equity_curve.len() as f64
        };

        EvaluationReport {
            total_return,
            win_rate,
            max_drawdown,
            trade_count,
            max_drawdown_duration,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            final_equity,
            exposure,
            open_position_return,
        }
    }

    /// Report for a run with no bars at all.
    pub fn empty(initial_capital: f64) -> Self {
        Self::compute(initial_capital, &[], &[], 0, None)
    }
}

/// Largest peak-to-trough decline as a fraction, and the longest run of bars
/// spent below a prior peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i)
    }

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                timestamp: ts(i as i64),
                equity: v,
            })
            .collect()
    }

    fn make_trade(return_pct: f64) -> Trade {
        Trade {
            entry_time: ts(0),
            exit_time: ts(1),
            entry_price: 100.0,
            exit_price: 100.0 * (1.0 + return_pct),
            return_pct,
        }
    }

    #[test]
    fn empty_report_has_no_trades() {
        let report = EvaluationReport::empty(10_000.0);
        assert_eq!(report.total_return, 0.0);
        assert_eq!(report.win_rate, None);
        assert_eq!(report.trade_count, 0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.final_equity, 10_000.0);
        assert_eq!(report.exposure, 0.0);
    }

    #[test]
    fn total_return_from_final_equity() {
        let curve = make_equity_curve(&[10_000.0, 11_000.0]);
        let report = EvaluationReport::compute(10_000.0, &curve, &[], 0, None);
        assert_relative_eq!(report.total_return, 0.10, epsilon = 1e-12);

        let curve = make_equity_curve(&[10_000.0, 9_000.0]);
        let report = EvaluationReport::compute(10_000.0, &curve, &[], 0, None);
        assert_relative_eq!(report.total_return, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn no_trades_win_rate_is_none() {
        let curve = make_equity_curve(&[10_000.0, 10_000.0]);
        let report = EvaluationReport::compute(10_000.0, &curve, &[], 0, None);
        assert_eq!(report.win_rate, None);
        assert_eq!(report.profit_factor, None);
        assert_eq!(report.avg_win, 0.0);
        assert_eq!(report.largest_loss, 0.0);
    }

    #[test]
    fn trade_stats_wins_and_losses() {
        let trades = vec![
            make_trade(0.10),
            make_trade(-0.05),
            make_trade(0.20),
            make_trade(0.0),
        ];
        let curve = make_equity_curve(&[10_000.0, 12_500.0]);
        let report = EvaluationReport::compute(10_000.0, &curve, &trades, 1, None);

        assert_eq!(report.trade_count, 4);
        assert_eq!(report.win_rate, Some(0.5));
        assert_relative_eq!(report.profit_factor.unwrap(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(report.avg_win, 0.15, epsilon = 1e-12);
        assert_relative_eq!(report.avg_loss, 0.05, epsilon = 1e-12);
        assert_relative_eq!(report.largest_win, 0.20, epsilon = 1e-12);
        assert_relative_eq!(report.largest_loss, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn profit_factor_none_without_losers() {
        let trades = vec![make_trade(0.10)];
        let curve = make_equity_curve(&[10_000.0, 11_000.0]);
        let report = EvaluationReport::compute(10_000.0, &curve, &trades, 1, None);
        assert_eq!(report.profit_factor, None);
        assert_eq!(report.win_rate, Some(1.0));
    }

    #[test]
    fn exposure_is_fraction_of_bars_long() {
        let curve = make_equity_curve(&[1.0, 1.0, 1.0, 1.0]);
        let report = EvaluationReport::compute(1.0, &curve, &[], 1, None);
        assert_eq!(report.exposure, 0.25);
    }

    #[test]
    fn max_drawdown() {
        let curve = make_equity_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        let (dd, _) = compute_drawdown(&curve);
        assert_relative_eq!(dd, (110.0 - 80.0) / 110.0, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_duration() {
        let curve = make_equity_curve(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]);
        let (_, duration) = compute_drawdown(&curve);
        assert_eq!(duration, 4);
    }

    #[test]
    fn drawdown_zero_when_never_declining() {
        let curve = make_equity_curve(&[100.0, 100.0, 101.0, 105.0]);
        assert_eq!(compute_drawdown(&curve), (0.0, 0));
        assert_eq!(compute_drawdown(&[]), (0.0, 0));
    }

    #[test]
    fn report_serializes_null_win_rate() {
        let report = EvaluationReport::empty(10_000.0);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["win_rate"].is_null());
        assert_eq!(json["trade_count"], 0);
    }
}
