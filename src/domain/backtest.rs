//! Backtest orchestration.
//!
//! candles → indicator rows → simulation → trade statistics → result.

use serde::{Deserialize, Serialize};

use crate::domain::candle::Candle;
use crate::domain::indicator::{compute_indicator_rows, IndicatorRow};
use crate::domain::metrics::{round_to, TradeStats, CURRENCY_DECIMALS};
use crate::domain::rule::RuleSet;
use crate::domain::simulation::{simulate, TradeRecord, STARTING_EQUITY};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_equity: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_equity: STARTING_EQUITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub win_ratio: f64,
    pub loss_ratio: f64,
    pub total_trades: usize,
    pub profit_factor: f64,
    pub equity_curve: Vec<f64>,
    pub final_equity: f64,
    pub trades: Vec<TradeRecord>,
}

pub fn run_backtest(candles: &[Candle], rules: &RuleSet, config: &BacktestConfig) -> BacktestResult {
    let rows = compute_indicator_rows(candles);
    if rows.len() < 2 {
        tracing::warn!(
            candles = candles.len(),
            rows = rows.len(),
            "not enough candles past indicator warm-up; nothing to simulate"
        );
    }
    run_backtest_on_rows(&rows, rules, config)
}

/// Run on pre-computed indicator rows.
pub fn run_backtest_on_rows(
    rows: &[IndicatorRow],
    rules: &RuleSet,
    config: &BacktestConfig,
) -> BacktestResult {
    let output = simulate(rows, rules, config.starting_equity);
    let stats = TradeStats::compute(&output.returns);

    tracing::info!(
        rows = rows.len(),
        trades = stats.total_trades,
        final_equity = output.final_equity,
        "backtest complete"
    );

    BacktestResult {
        win_ratio: stats.win_ratio,
        loss_ratio: stats.loss_ratio,
        total_trades: stats.total_trades,
        profit_factor: stats.profit_factor,
        equity_curve: output
            .equity_curve
            .iter()
            .map(|&e| round_to(e, CURRENCY_DECIMALS))
            .collect(),
        final_equity: round_to(output.final_equity, CURRENCY_DECIMALS),
        trades: output.trades,
    }
}
