//! Configuration loading and validation.
//!
//! Values are read through [`ConfigPort`] with the documented defaults, then
//! checked as typed structs so command-line overrides go through the same
//! rules as INI values.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SignalError;
use crate::domain::signal::{MaType, SignalConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;
use chrono::Duration;

/// `[data]` settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSettings {
    /// `None` infers the threshold from the median bar spacing.
    pub gap_threshold: Option<Duration>,
    pub input_format: Option<String>,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<i64>().is_err() {
            return Err(invalid(section, key, format!("`{raw}` is not an integer")));
        }
    }
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn read_f64(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<f64>().is_err() {
            return Err(invalid(section, key, format!("`{raw}` is not a number")));
        }
    }
    Ok(config.get_double(section, key, default))
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        let known = ["true", "yes", "on", "1", "false", "no", "off", "0"];
        if !known.contains(&raw.trim().to_ascii_lowercase().as_str()) {
            return Err(invalid(section, key, format!("`{raw}` is not a boolean")));
        }
    }
    Ok(config.get_bool(section, key, default))
}

pub fn read_signal_config(config: &dyn ConfigPort) -> Result<SignalConfig, SignalError> {
    let d = SignalConfig::default();
    let strategy = match config.get_string("signal", "strategy") {
        Some(s) => s
            .parse::<StrategyKind>()
            .map_err(|e| invalid("signal", "strategy", e))?,
        None => d.strategy,
    };
    let ma_type = match config.get_string("signal", "ma_type") {
        Some(s) => s.parse::<MaType>().map_err(|e| invalid("signal", "ma_type", e))?,
        None => d.ma_type,
    };

    Ok(SignalConfig {
        strategy,
        ma_type,
        fast_ma: read_usize(config, "signal", "fast_ma", d.fast_ma)?,
        slow_ma: read_usize(config, "signal", "slow_ma", d.slow_ma)?,
        rsi_period: read_usize(config, "signal", "rsi_period", d.rsi_period)?,
        rsi_overbought: read_f64(config, "signal", "rsi_overbought", d.rsi_overbought)?,
        rsi_oversold: read_f64(config, "signal", "rsi_oversold", d.rsi_oversold)?,
        macd_confirm: read_bool(config, "signal", "macd_confirm", d.macd_confirm)?,
        macd_fast: read_usize(config, "signal", "macd_fast", d.macd_fast)?,
        macd_slow: read_usize(config, "signal", "macd_slow", d.macd_slow)?,
        macd_signal: read_usize(config, "signal", "macd_signal", d.macd_signal)?,
        confidence_spread: read_f64(config, "signal", "confidence_spread", d.confidence_spread)?,
        bb_period: read_usize(config, "signal", "bb_period", d.bb_period)?,
        bb_stddev: read_f64(config, "signal", "bb_stddev", d.bb_stddev)?,
        adx_period: read_usize(config, "signal", "adx_period", d.adx_period)?,
        adx_threshold: read_f64(config, "signal", "adx_threshold", d.adx_threshold)?,
        volume_period: read_usize(config, "signal", "volume_period", d.volume_period)?,
    })
}

pub fn read_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SignalError> {
    let d = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: read_f64(config, "backtest", "initial_capital", d.initial_capital)?,
        commission_pct: read_f64(config, "backtest", "commission_pct", d.commission_pct)?,
        slippage_pct: read_f64(config, "backtest", "slippage_pct", d.slippage_pct)?,
    })
}

pub fn read_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, SignalError> {
    let gap_threshold = match config.get_string("data", "gap_threshold_secs") {
        Some(_) => {
            let secs = read_usize(config, "data", "gap_threshold_secs", 0)?;
            Some(gap_threshold_from_secs(secs as i64)?)
        }
        None => None,
    };
    let input_format = config
        .get_string("data", "input_format")
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty());
    Ok(DataSettings {
        gap_threshold,
        input_format,
    })
}

pub fn gap_threshold_from_secs(secs: i64) -> Result<Duration, SignalError> {
    if secs <= 0 {
        return Err(invalid("data", "gap_threshold_secs", "gap_threshold_secs must be positive"));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| invalid("data", "gap_threshold_secs", format!("{secs} seconds is out of range")))
}

pub fn validate_signal_config(config: &SignalConfig) -> Result<(), SignalError> {
    let positive = [
        ("fast_ma", config.fast_ma),
        ("slow_ma", config.slow_ma),
        ("rsi_period", config.rsi_period),
        ("macd_fast", config.macd_fast),
        ("macd_slow", config.macd_slow),
        ("macd_signal", config.macd_signal),
        ("bb_period", config.bb_period),
        ("adx_period", config.adx_period),
        ("volume_period", config.volume_period),
    ];
    for (key, value) in positive {
        if value == 0 {
            return Err(invalid("signal", key, format!("{key} must be at least 1")));
        }
    }

    if config.slow_ma <= config.fast_ma {
        return Err(invalid("signal", "slow_ma", "slow_ma must be greater than fast_ma"));
    }
    if config.macd_slow <= config.macd_fast {
        return Err(invalid("signal", "macd_slow", "macd_slow must be greater than macd_fast"));
    }

    for (key, value) in [
        ("rsi_overbought", config.rsi_overbought),
        ("rsi_oversold", config.rsi_oversold),
        ("adx_threshold", config.adx_threshold),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("signal", key, format!("{key} must be between 0 and 100")));
        }
    }
    if config.rsi_oversold >= config.rsi_overbought {
        return Err(invalid(
            "signal",
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }

    if !(config.confidence_spread > 0.0 && config.confidence_spread.is_finite()) {
        return Err(invalid("signal", "confidence_spread", "confidence_spread must be positive"));
    }
    if !(config.bb_stddev > 0.0 && config.bb_stddev.is_finite()) {
        return Err(invalid("signal", "bb_stddev", "bb_stddev must be positive"));
    }
    Ok(())
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), SignalError> {
    if !(config.initial_capital > 0.0 && config.initial_capital.is_finite()) {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    if !(0.0..1.0).contains(&config.commission_pct) {
        return Err(invalid(
            "backtest",
            "commission_pct",
            "commission_pct must be in [0, 1)",
        ));
    }
    if !(0.0..1.0).contains(&config.slippage_pct) {
        return Err(invalid("backtest", "slippage_pct", "slippage_pct must be in [0, 1)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(err: SignalError) -> String {
        match err {
            SignalError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_gives_defaults() {
        let config = make_config("");
        assert_eq!(read_signal_config(&config).unwrap(), SignalConfig::default());
        assert_eq!(read_backtest_config(&config).unwrap(), BacktestConfig::default());
        assert_eq!(read_data_settings(&config).unwrap(), DataSettings::default());
    }

    #[test]
    fn reads_full_signal_section() {
        let config = make_config(
            r#"
[signal]
strategy = adaptive
ma_type = ema
fast_ma = 9
slow_ma = 21
rsi_period = 10
rsi_overbought = 80
rsi_oversold = 20
macd_confirm = yes
confidence_spread = 0.05
adx_threshold = 30
"#,
        );
        let signal = read_signal_config(&config).unwrap();
        assert_eq!(signal.strategy, StrategyKind::Adaptive);
        assert_eq!(signal.ma_type, MaType::Ema);
        assert_eq!(signal.fast_ma, 9);
        assert_eq!(signal.slow_ma, 21);
        assert_eq!(signal.rsi_period, 10);
        assert_eq!(signal.rsi_overbought, 80.0);
        assert_eq!(signal.rsi_oversold, 20.0);
        assert!(signal.macd_confirm);
        assert_eq!(signal.confidence_spread, 0.05);
        assert_eq!(signal.adx_threshold, 30.0);
        assert_eq!(signal.macd_fast, 12);
        assert!(validate_signal_config(&signal).is_ok());
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = make_config("[signal]\nstrategy = martingale\n");
        assert_eq!(invalid_key(read_signal_config(&config).unwrap_err()), "strategy");
    }

    #[test]
    fn non_numeric_window_fails() {
        let config = make_config("[signal]\nfast_ma = five\n");
        assert_eq!(invalid_key(read_signal_config(&config).unwrap_err()), "fast_ma");
    }

    #[test]
    fn negative_window_fails() {
        let config = make_config("[signal]\nslow_ma = -3\n");
        assert_eq!(invalid_key(read_signal_config(&config).unwrap_err()), "slow_ma");
    }

    #[test]
    fn slow_must_exceed_fast() {
        let signal = SignalConfig {
            fast_ma: 20,
            slow_ma: 20,
            ..SignalConfig::default()
        };
        assert_eq!(invalid_key(validate_signal_config(&signal).unwrap_err()), "slow_ma");
    }

    #[test]
    fn zero_window_fails() {
        let signal = SignalConfig {
            rsi_period: 0,
            ..SignalConfig::default()
        };
        assert_eq!(invalid_key(validate_signal_config(&signal).unwrap_err()), "rsi_period");
    }

    #[test]
    fn rsi_thresholds_must_be_ordered() {
        let signal = SignalConfig {
            rsi_oversold: 75.0,
            ..SignalConfig::default()
        };
        assert_eq!(invalid_key(validate_signal_config(&signal).unwrap_err()), "rsi_oversold");

        let signal = SignalConfig {
            rsi_overbought: 120.0,
            ..SignalConfig::default()
        };
        assert_eq!(invalid_key(validate_signal_config(&signal).unwrap_err()), "rsi_overbought");
    }

    #[test]
    fn overbought_of_100_is_allowed() {
        let signal = SignalConfig {
            rsi_overbought: 100.0,
            ..SignalConfig::default()
        };
        assert!(validate_signal_config(&signal).is_ok());
    }

    #[test]
    fn confidence_spread_must_be_positive() {
        let signal = SignalConfig {
            confidence_spread: 0.0,
            ..SignalConfig::default()
        };
        assert_eq!(
            invalid_key(validate_signal_config(&signal).unwrap_err()),
            "confidence_spread"
        );
    }

    #[test]
    fn reads_backtest_section() {
        let config = make_config(
            "[backtest]\ninitial_capital = 5000\ncommission_pct = 0.001\nslippage_pct = 0.0005\n",
        );
        let backtest = read_backtest_config(&config).unwrap();
        assert_eq!(backtest.initial_capital, 5000.0);
        assert_eq!(backtest.commission_pct, 0.001);
        assert_eq!(backtest.slippage_pct, 0.0005);
        assert!(validate_backtest_config(&backtest).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let backtest = BacktestConfig {
            initial_capital: 0.0,
            ..BacktestConfig::default()
        };
        assert_eq!(
            invalid_key(validate_backtest_config(&backtest).unwrap_err()),
            "initial_capital"
        );
    }

    #[test]
    fn commission_negative_fails() {
        let backtest = BacktestConfig {
            commission_pct: -0.1,
            ..BacktestConfig::default()
        };
        assert_eq!(
            invalid_key(validate_backtest_config(&backtest).unwrap_err()),
            "commission_pct"
        );
    }

    #[test]
    fn slippage_of_one_fails() {
        let backtest = BacktestConfig {
            slippage_pct: 1.0,
            ..BacktestConfig::default()
        };
        assert_eq!(invalid_key(validate_backtest_config(&backtest).unwrap_err()), "slippage_pct");
    }

    #[test]
    fn reads_data_section() {
        let config = make_config("[data]\ngap_threshold_secs = 7200\ninput_format = JSON\n");
        let data = read_data_settings(&config).unwrap();
        assert_eq!(data.gap_threshold, Some(Duration::hours(2)));
        assert_eq!(data.input_format.as_deref(), Some("json"));
    }

    #[test]
    fn zero_gap_threshold_fails() {
        let config = make_config("[data]\ngap_threshold_secs = 0\n");
        assert_eq!(
            invalid_key(read_data_settings(&config).unwrap_err()),
            "gap_threshold_secs"
        );
    }

    #[test]
    fn gap_threshold_rejects_huge_values() {
        assert_eq!(invalid_key(gap_threshold_from_secs(i64::MAX).unwrap_err()), "gap_threshold_secs");
        let config = make_config("[data]\ngap_threshold_secs = 9223372036854775807\n");
        assert_eq!(
            invalid_key(read_data_settings(&config).unwrap_err()),
            "gap_threshold_secs"
        );
    }

    #[test]
    fn unrecognised_bool_fails() {
        let config = make_config("[signal]\nmacd_confirm = maybe\n");
        assert_eq!(invalid_key(read_signal_config(&config).unwrap_err()), "macd_confirm");
    }

    #[test]
    fn bool_accepts_off() {
        let config = make_config("[signal]\nmacd_confirm = Off\n");
        assert!(!read_signal_config(&config).unwrap().macd_confirm);
    }
}
