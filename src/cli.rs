//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{render_report, JsonReportAdapter};
use crate::adapters::kline_file_adapter::KlineFileAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::candle::Candle;
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::PhoenixError;
use crate::domain::fetch::FetchRequest;
use crate::domain::indicator::{compute_indicator_rows, IndicatorRow};
use crate::domain::rule::{Rule, RuleSet};
use crate::domain::rule_eval::can_fire;
use crate::domain::rule_parser::extract_rule_set;
use crate::domain::simulation::STARTING_EQUITY;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "phoenix", about = "Rule-driven candle backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Rule source: JSON, possibly fenced or wrapped in prose
        #[arg(short, long)]
        rules: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Normalize a rule source and report rules that can never fire
    Validate {
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// Export indicator rows as CSV
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        range: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            rules,
            output,
            asset,
            interval,
            range,
            dry_run,
        } => {
            let overrides = CommandLineOverrides::new(asset, interval, range);
            if dry_run {
                run_dry_run(&config, &rules, &overrides)
            } else {
                run_backtest(&config, &rules, output.as_deref(), &overrides)
            }
        }
        Command::Validate { rules } => run_validate(&rules),
        Command::Indicators {
            config,
            output,
            asset,
            interval,
            range,
        } => run_indicators(
            &config,
            &output,
            &CommandLineOverrides::new(asset, interval, range),
        ),
    }
}

fn fail(err: PhoenixError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(PhoenixError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// `[backtest]` values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CommandLineOverrides {
    values: HashMap<&'static str, String>,
}

impl CommandLineOverrides {
    pub fn new(asset: Option<String>, interval: Option<String>, range: Option<String>) -> Self {
        let values = [("asset", asset), ("interval", interval), ("range", range)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        Self { values }
    }

    pub fn over<'a>(&'a self, base: &'a dyn ConfigPort) -> LayeredConfig<'a> {
        LayeredConfig {
            base,
            overrides: self,
        }
    }
}

/// A config view where command-line values shadow `[backtest]` keys.
pub struct LayeredConfig<'a> {
    base: &'a dyn ConfigPort,
    overrides: &'a CommandLineOverrides,
}

impl ConfigPort for LayeredConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        if section == "backtest" {
            if let Some(value) = self.overrides.values.get(key) {
                return Some(value.clone());
            }
        }
        self.base.get_string(section, key)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.base.get_double(section, key, default)
    }
}

pub fn build_fetch_request(config: &dyn ConfigPort) -> Result<FetchRequest, PhoenixError> {
    let get = |key: &str| {
        config
            .get_string("backtest", key)
            .ok_or_else(|| PhoenixError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
    };
    FetchRequest::new(&get("asset")?, &get("interval")?, &get("range")?)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    BacktestConfig {
        starting_equity: config.get_double("backtest", "initial_equity", STARTING_EQUITY),
    }
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, PhoenixError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| PhoenixError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => Ok(Box::new(CsvAdapter::new(PathBuf::from(path)))),
        "klines" => Ok(Box::new(KlineFileAdapter::new(PathBuf::from(path)))),
        other => Err(PhoenixError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown data source '{}'", other),
        }),
    }
}

pub fn load_rules(path: &Path) -> Result<RuleSet, PhoenixError> {
    let text = fs::read_to_string(path).map_err(|e| PhoenixError::RuleSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    extract_rule_set(&text)
}

/// Fetch candles; an empty series is reported as missing data.
pub fn fetch_candles(
    data_port: &dyn DataPort,
    request: &FetchRequest,
) -> Result<Vec<Candle>, PhoenixError> {
    let candles = data_port.fetch_candles(request)?;
    if candles.is_empty() {
        return Err(PhoenixError::NoData {
            asset: request.asset.clone(),
            interval: request.interval.to_string(),
        });
    }
    Ok(candles)
}

fn run_backtest(
    config_path: &Path,
    rules_path: &Path,
    output_path: Option<&Path>,
    overrides: &CommandLineOverrides,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = overrides.over(&adapter);
    if let Err(e) = validate_backtest_config(&config) {
        return fail(e);
    }

    // Stage 2: Rules
    eprintln!("Loading rules from {}", rules_path.display());
    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 3: Request, data source, report destination
    let request = match build_fetch_request(&config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let bt_config = build_backtest_config(&config);
    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    run_backtest_pipeline(
        data_port.as_ref(),
        &request,
        &rules,
        &bt_config,
        output.as_deref(),
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    request: &FetchRequest,
    rules: &RuleSet,
    bt_config: &BacktestConfig,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 4: Fetch candles
    eprintln!(
        "Fetching {} {} candles (up to {})",
        request.symbol(),
        request.interval,
        request.limit()
    );
    let candles = match fetch_candles(data_port, request) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    // Stage 5: Run
    eprintln!("Running backtest: {} candles", candles.len());
    let result = backtest_engine::run_backtest(&candles, rules, bt_config);

    // Stage 6: Console summary
    print_summary(&result, bt_config);

    // Stage 7: Report
    match output_path {
        Some(path) => {
            let adapter = JsonReportAdapter::new();
            if let Err(e) = adapter.write(&result, rules, &path.to_string_lossy()) {
                return fail(e);
            }
            eprintln!("\nReport written to: {}", path.display());
        }
        None => match render_report(&result, rules) {
            Ok(json) => println!("{json}"),
            Err(e) => return fail(e),
        },
    }
    ExitCode::SUCCESS
}

fn print_summary(result: &BacktestResult, bt_config: &BacktestConfig) {
    let total_return = if bt_config.starting_equity > 0.0 {
        (result.final_equity - bt_config.starting_equity) / bt_config.starting_equity
    } else {
        0.0
    };
    eprintln!("\n=== Results ===");
    eprintln!("Total Return:     {:.2}%", total_return * 100.0);
    eprintln!("Final Equity:     {:.2}", result.final_equity);
    eprintln!("Total Trades:     {}", result.total_trades);
    eprintln!("Win Ratio:        {:.1}%", result.win_ratio * 100.0);
    eprintln!("Loss Ratio:       {:.1}%", result.loss_ratio * 100.0);
    eprintln!("Profit Factor:    {:.3}", result.profit_factor);

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &result.trades {
            let sign = if trade.pl_usd >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {} @ {:.2} -> {} @ {:.2}  {}{:.2}%  {}${:.2}",
                trade.entry_time,
                trade.entry_price,
                trade.exit_time,
                trade.exit_price,
                sign,
                trade.pl_pct * 100.0,
                sign,
                trade.pl_usd,
            );
        }
    }
}

pub fn run_dry_run(
    config_path: &Path,
    rules_path: &Path,
    overrides: &CommandLineOverrides,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = overrides.over(&adapter);
    if let Err(e) = validate_backtest_config(&config) {
        return fail(e);
    }
    eprintln!("Config validated successfully");

    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let request = match build_fetch_request(&config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Request: {} {} over {} ({} candles)",
        request.symbol(),
        request.interval,
        request.range,
        request.limit()
    );
    print_rules(&rules);
    eprintln!("Dry run complete, no data fetched");
    ExitCode::SUCCESS
}

fn print_rules(rules: &RuleSet) {
    let sides: [(&str, &Rule); 2] = [("buy", &rules.buy), ("sell", &rules.sell)];
    for (side, rule) in sides {
        eprintln!("  {:<5} {}", format!("{side}:"), rule);
        if !can_fire(rule) {
            eprintln!("warning: {side} rule can never fire");
        }
    }
}

fn run_validate(rules_path: &Path) -> ExitCode {
    eprintln!("Loading rules from {}", rules_path.display());
    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    print_rules(&rules);
    match serde_json::to_string_pretty(&rules) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            return fail(PhoenixError::Report {
                reason: e.to_string(),
            })
        }
    }
    ExitCode::SUCCESS
}

pub fn write_indicator_csv(rows: &[IndicatorRow], path: &Path) -> Result<(), PhoenixError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let to_report_err = |e: csv::Error| PhoenixError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_report_err)?;
    for row in rows {
        writer.serialize(row).map_err(to_report_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_indicators(config_path: &Path, output_path: &Path, overrides: &CommandLineOverrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = overrides.over(&adapter);
    if let Err(e) = validate_backtest_config(&config) {
        return fail(e);
    }

    let result = build_fetch_request(&config).and_then(|request| {
        let data_port = build_data_port(&config)?;
        let candles = fetch_candles(data_port.as_ref(), &request)?;
        let rows = compute_indicator_rows(&candles);
        write_indicator_csv(&rows, output_path)?;
        Ok((candles.len(), rows.len()))
    });

    match result {
        Ok((candles, rows)) => {
            eprintln!(
                "Wrote {} indicator rows ({} candles) to {}",
                rows,
                candles,
                output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
