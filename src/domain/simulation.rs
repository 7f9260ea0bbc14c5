//! Single-position trade simulator.
//!
//! Walks indicator rows from index 1, consulting the buy rule while flat and
//! the sell rule while in position. Entries and exits happen at the row's
//! close with the full equity; every exit compounds equity by the trade's
//! return. A position still open after the last row is not closed.

use serde::{Deserialize, Serialize};

use crate::domain::candle::format_timestamp;
use crate::domain::indicator::IndicatorRow;
use crate::domain::metrics::{round_to, CURRENCY_DECIMALS, PCT_DECIMALS};
use crate::domain::rule::RuleSet;
use crate::domain::rule_eval::evaluate;

pub const STARTING_EQUITY: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    InPosition { entry_price: f64, entry_index: usize },
}

/// A completed round trip. Created only at exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: String,
    pub entry_price: f64,
    pub exit_time: String,
    pub exit_price: f64,
    pub pl_pct: f64,
    pub pl_usd: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Held,
    Entered,
    /// `pl_pct` is the unrounded return; the record carries the rounded one.
    Exited { trade: TradeRecord, pl_pct: f64 },
}

/// Mutable state of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationContext {
    pub state: PositionState,
    pub equity: f64,
}

impl SimulationContext {
    pub fn new(starting_equity: f64) -> Self {
        SimulationContext {
            state: PositionState::Flat,
            equity: starting_equity,
        }
    }

    /// Advance the state machine by one row. `index` must be a valid row
    /// index of at least 1; the caller owns the iteration.
    pub fn step(&mut self, rows: &[IndicatorRow], index: usize, rules: &RuleSet) -> StepOutcome {
        match self.state {
            PositionState::Flat => {
                if evaluate(rows, index, &rules.buy) {
                    let entry_price = rows[index].close;
                    tracing::debug!(index, entry_price, "entered position");
                    self.state = PositionState::InPosition {
                        entry_price,
                        entry_index: index,
                    };
                    StepOutcome::Entered
                } else {
                    StepOutcome::Held
                }
            }
            PositionState::InPosition {
                entry_price,
                entry_index,
            } => {
                if !evaluate(rows, index, &rules.sell) {
                    return StepOutcome::Held;
                }
                let exit_price = rows[index].close;
                let pl_pct = (exit_price - entry_price) / entry_price;
                let pl_usd = self.equity * pl_pct;

                let trade = TradeRecord {
                    entry_time: format_timestamp(rows[entry_index].timestamp),
                    entry_price,
                    exit_time: format_timestamp(rows[index].timestamp),
                    exit_price,
                    pl_pct: round_to(pl_pct, PCT_DECIMALS),
                    pl_usd: round_to(pl_usd, CURRENCY_DECIMALS),
                };

                self.equity *= 1.0 + pl_pct;
                self.state = PositionState::Flat;
                tracing::debug!(index, exit_price, pl_pct, equity = self.equity, "exited position");
                StepOutcome::Exited { trade, pl_pct }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub trades: Vec<TradeRecord>,
    /// Unrounded return of each trade, parallel to `trades`.
    pub returns: Vec<f64>,
    /// One value per simulated row (rows 1..len), unrounded.
    pub equity_curve: Vec<f64>,
    pub final_equity: f64,
    /// State after the last row; an open position here was never closed.
    pub final_state: PositionState,
}

/// Run the state machine over every row from index 1.
pub fn simulate(rows: &[IndicatorRow], rules: &RuleSet, starting_equity: f64) -> SimulationOutput {
    let mut ctx = SimulationContext::new(starting_equity);
    let mut trades = Vec::new();
    let mut returns = Vec::new();
    let mut equity_curve = Vec::with_capacity(rows.len().saturating_sub(1));

    for index in 1..rows.len() {
        if let StepOutcome::Exited { trade, pl_pct } = ctx.step(rows, index, rules) {
            trades.push(trade);
            returns.push(pl_pct);
        }
        equity_curve.push(ctx.equity);
    }

    if let PositionState::InPosition { entry_index, .. } = ctx.state {
        tracing::info!(entry_index, "position still open at end of series; not included in trades");
    }

    SimulationOutput {
        trades,
        returns,
        equity_curve,
        final_equity: ctx.equity,
        final_state: ctx.state,
    }
}
