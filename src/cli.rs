//! CLI definition and dispatch.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::console_report::write_latest;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::{open_data_source, reporter};
use crate::domain::backtest::{evaluate, BacktestConfig};
use crate::domain::config_validation::{
    gap_threshold_from_secs, read_backtest_config, read_data_settings, read_signal_config,
    validate_backtest_config, validate_signal_config, DataSettings,
};
use crate::domain::error::SignalError;
use crate::domain::indicator_set::IndicatorCache;
use crate::domain::signal::{generate_signals, latest_signal, LatestSignal, SignalConfig, StrategyKind};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, DataSource};
use crate::ports::report_port::{OutputFormat, SignalRun};

#[derive(Parser, Debug)]
#[command(name = "coinsignal", version, about = "Cryptocurrency buy/sell signal generator")]
pub struct Cli {
    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Less log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(8) as i8) - (self.quiet.min(8) as i8)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate signals, backtest them and write a report
    Run(RunArgs),
    /// Print the most recent signal for each symbol
    Latest(LatestArgs),
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the symbols in a data file
    Symbols {
        #[arg(short, long)]
        input: String,
        #[arg(long)]
        input_format: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Price data file, or `-` for standard input
    #[arg(short, long)]
    pub input: String,
    /// Only process this symbol
    #[arg(short, long)]
    pub symbol: Option<String>,
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Force the input format (csv or json)
    #[arg(long)]
    pub input_format: Option<String>,
    #[arg(long)]
    pub gap_threshold_secs: Option<i64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SignalOverrides {
    #[arg(long)]
    pub strategy: Option<StrategyKind>,
    #[arg(long)]
    pub fast_ma: Option<usize>,
    #[arg(long)]
    pub slow_ma: Option<usize>,
    #[arg(long)]
    pub rsi_overbought: Option<f64>,
    #[arg(long)]
    pub rsi_oversold: Option<f64>,
    /// Require MACD histogram agreement for crossovers
    #[arg(long, overrides_with = "no_macd_confirm")]
    pub macd_confirm: bool,
    /// Ignore the MACD histogram even if the config enables it
    #[arg(long, overrides_with = "macd_confirm")]
    pub no_macd_confirm: bool,
}

impl SignalOverrides {
    /// `None` when neither flag was given, so the config value stands.
    pub fn macd_confirm_override(&self) -> Option<bool> {
        match (self.macd_confirm, self.no_macd_confirm) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub overrides: SignalOverrides,
    /// Report file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Report format: csv, json or console
    #[arg(short, long)]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LatestArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub overrides: SignalOverrides,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub signal: SignalConfig,
    pub backtest: BacktestConfig,
    pub data: DataSettings,
    pub report_format: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init(cli.verbosity());
    let result = match cli.command {
        Command::Run(args) => run_signals(&args),
        Command::Latest(args) => run_latest(&args),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols {
            input,
            input_format,
        } => run_symbols(&input, input_format.as_deref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, SignalError> {
    match path {
        Some(path) => {
            tracing::info!("loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Read settings from `config`, apply command-line overrides, then validate.
pub fn resolve_settings(
    config: &dyn ConfigPort,
    input: Option<&InputArgs>,
    overrides: &SignalOverrides,
) -> Result<Settings, SignalError> {
    let mut signal = read_signal_config(config)?;
    let backtest = read_backtest_config(config)?;
    let mut data = read_data_settings(config)?;

    if let Some(strategy) = overrides.strategy {
        signal.strategy = strategy;
    }
    if let Some(n) = overrides.fast_ma {
        signal.fast_ma = n;
    }
    if let Some(n) = overrides.slow_ma {
        signal.slow_ma = n;
    }
    if let Some(x) = overrides.rsi_overbought {
        signal.rsi_overbought = x;
    }
    if let Some(x) = overrides.rsi_oversold {
        signal.rsi_oversold = x;
    }
    if let Some(flag) = overrides.macd_confirm_override() {
        signal.macd_confirm = flag;
    }
    if let Some(input) = input {
        if let Some(secs) = input.gap_threshold_secs {
            data.gap_threshold = Some(gap_threshold_from_secs(secs)?);
        }
        if let Some(format) = &input.input_format {
            data.input_format = Some(format.to_ascii_lowercase());
        }
    }

    validate_signal_config(&signal)?;
    validate_backtest_config(&backtest)?;

    Ok(Settings {
        signal,
        backtest,
        data,
        report_format: config.get_string("report", "format"),
    })
}

fn open_input(input: &InputArgs, data: &DataSettings) -> Result<Box<dyn DataPort>, SignalError> {
    let source = DataSource::parse(&input.input);
    let default_symbol = input
        .symbol
        .clone()
        .or_else(|| source.stem().map(str::to_string))
        .unwrap_or_else(|| "STDIN".to_string());
    open_data_source(
        &source,
        data.input_format.as_deref(),
        &default_symbol,
        data.gap_threshold,
    )
}

fn selected_symbols(input: &InputArgs, data: &dyn DataPort) -> Result<Vec<String>, SignalError> {
    match &input.symbol {
        Some(symbol) => Ok(vec![symbol.clone()]),
        None => data.list_symbols(),
    }
}

/// Load, compute, signal and evaluate one symbol.
pub fn process_symbol(
    data: &dyn DataPort,
    symbol: &str,
    settings: &Settings,
    cache: &mut IndicatorCache,
) -> Result<SignalRun, SignalError> {
    let loaded = data.fetch_series(symbol)?;
    let series = &loaded.series;
    if series.len() < settings.signal.largest_window() {
        tracing::warn!(
            symbol,
            bars = series.len(),
            needed = settings.signal.largest_window(),
            "series shorter than the largest indicator window; every signal will be HOLD"
        );
    }

    let indicators = cache.compute_set(series, &settings.signal.report_indicators());
    let signals = generate_signals(series, &indicators, &settings.signal);
    let report = evaluate(series, &signals, &settings.backtest);
    let latest = latest_signal(series, &signals, &indicators, &settings.signal);

    Ok(SignalRun {
        symbol: series.symbol().to_string(),
        signals,
        report,
        latest,
    })
}

fn process_all(input: &InputArgs, settings: &Settings) -> Result<Vec<SignalRun>, SignalError> {
    let data = open_input(input, &settings.data)?;
    let symbols = selected_symbols(input, data.as_ref())?;
    tracing::info!(count = symbols.len(), "processing symbols");

    let mut cache = IndicatorCache::new();
    symbols
        .iter()
        .map(|symbol| process_symbol(data.as_ref(), symbol, settings, &mut cache))
        .collect()
}

/// Symbol made safe for a file name: separators and reserved characters become `-`.
fn file_safe_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// `<stem>_<SYMBOL>.<ext>` next to `path`.
pub fn symbol_output_path(path: &Path, symbol: &str, format: OutputFormat) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("signals");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(format.extension());
    let symbol = file_safe_symbol(symbol);
    path.with_file_name(format!("{stem}_{symbol}.{ext}"))
}

fn resolve_format(args: &RunArgs, settings: &Settings) -> Result<OutputFormat, SignalError> {
    if let Some(format) = &args.format {
        return format.parse();
    }
    if let Some(path) = &args.output {
        return OutputFormat::from_path(path);
    }
    match &settings.report_format {
        Some(format) => format.parse(),
        None => Ok(OutputFormat::Console),
    }
}

fn write_file(path: &Path, write: impl FnOnce(&mut dyn Write) -> Result<(), SignalError>) -> Result<(), SignalError> {
    let file = File::create(path).map_err(|e| {
        SignalError::serialization(format!("cannot create {}: {e}", path.display()))
    })?;
    let mut out = BufWriter::new(file);
    write(&mut out)?;
    out.flush()
        .map_err(|e| SignalError::serialization(format!("cannot write {}: {e}", path.display())))?;
    tracing::info!("wrote {}", path.display());
    Ok(())
}

fn run_signals(args: &RunArgs) -> Result<(), SignalError> {
    let config = load_config(args.input.config.as_deref())?;
    let settings = resolve_settings(&config, Some(&args.input), &args.overrides)?;
    let format = resolve_format(args, &settings)?;
    let report = reporter(format);

    let runs = process_all(&args.input, &settings)?;

    match &args.output {
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            report.write_multi(&runs, &mut out)?;
            out.flush().map_err(|e| SignalError::serialization(e.to_string()))?;
        }
        Some(path) if runs.len() == 1 => {
            write_file(path, |out| report.write(&runs[0], out))?;
        }
        Some(path) => {
            for run in &runs {
                let target = symbol_output_path(path, &run.symbol, format);
                write_file(&target, |out| report.write(run, out))?;
            }
        }
    }
    Ok(())
}

fn run_latest(args: &LatestArgs) -> Result<(), SignalError> {
    let config = load_config(args.input.config.as_deref())?;
    let settings = resolve_settings(&config, Some(&args.input), &args.overrides)?;
    let runs = process_all(&args.input, &settings)?;
    let latest: Vec<&LatestSignal> = runs.iter().filter_map(|r| r.latest.as_ref()).collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &latest)
            .map_err(|e| SignalError::serialization(e.to_string()))?;
        writeln!(out).map_err(|e| SignalError::serialization(e.to_string()))?;
    } else {
        for entry in latest {
            write_latest(entry, &mut out).map_err(|e| SignalError::serialization(e.to_string()))?;
        }
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<(), SignalError> {
    let config = load_config(Some(path))?;
    let settings = resolve_settings(&config, None, &SignalOverrides::default())?;
    if let Some(format) = &settings.report_format {
        format.parse::<OutputFormat>()?;
    }
    println!("Config valid: {}", path.display());
    println!("{}", describe_settings(&settings));
    Ok(())
}

fn run_symbols(input: &str, input_format: Option<&str>) -> Result<(), SignalError> {
    let source = DataSource::parse(input);
    let default_symbol = source.stem().unwrap_or("STDIN").to_string();
    let data = open_data_source(&source, input_format, &default_symbol, None)?;
    for symbol in data.list_symbols()? {
        println!("{symbol}");
    }
    Ok(())
}

pub fn describe_settings(settings: &Settings) -> String {
    let s = &settings.signal;
    let b = &settings.backtest;
    let gap = settings
        .data
        .gap_threshold
        .map(|d| format!("{}s", d.num_seconds()))
        .unwrap_or_else(|| "auto".to_string());
    format!(
        "[signal] strategy={} ma_type={} fast_ma={} slow_ma={} rsi_period={} \
         rsi_overbought={} rsi_oversold={} macd_confirm={} macd={}/{}/{} \
         confidence_spread={} bb={}/{} adx={}/{} volume_period={}\n\
         [backtest] initial_capital={} commission_pct={} slippage_pct={}\n\
         [data] gap_threshold={} input_format={}",
        s.strategy,
        s.ma_type,
        s.fast_ma,
        s.slow_ma,
        s.rsi_period,
        s.rsi_overbought,
        s.rsi_oversold,
        s.macd_confirm,
        s.macd_fast,
        s.macd_slow,
        s.macd_signal,
        s.confidence_spread,
        s.bb_period,
        s.bb_stddev,
        s.adx_period,
        s.adx_threshold,
        s.volume_period,
        b.initial_capital,
        b.commission_pct,
        b.slippage_pct,
        gap,
        settings.data.input_format.as_deref().unwrap_or("auto"),
    )
}
