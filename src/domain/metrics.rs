//! Trade statistics.
//!
//! A zero-return trade counts as a loss. Profit factor is summed winning
//! returns over absolute summed losing returns; with no (nonzero) losses it
//! falls back to the raw sum of winning returns, or 1 when that is zero too.
//! The fallback is a finite stand-in for "unbounded", kept because callers
//! read it as a plain number.

/// Decimal places for percentage returns and ratios.
pub const PCT_DECIMALS: i32 = 6;
/// Decimal places for currency amounts.
pub const CURRENCY_DECIMALS: i32 = 2;
pub const PROFIT_FACTOR_DECIMALS: i32 = 3;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_ratio: f64,
    pub loss_ratio: f64,
    pub profit_factor: f64,
}

impl TradeStats {
    /// Statistics over unrounded per-trade returns.
    pub fn compute(returns: &[f64]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_gains = 0.0_f64;
        let mut total_losses = 0.0_f64;

        for &pl_pct in returns {
            if pl_pct > 0.0 {
                wins += 1;
                total_gains += pl_pct;
            } else {
                losses += 1;
                total_losses += pl_pct;
            }
        }

        let total_trades = returns.len();
        let ratio = |count: usize| {
            if total_trades > 0 {
                round_to(count as f64 / total_trades as f64, PCT_DECIMALS)
            } else {
                0.0
            }
        };

        let profit_factor = if losses > 0 && total_losses != 0.0 {
            total_gains / total_losses.abs()
        } else if total_gains != 0.0 {
            total_gains
        } else {
            1.0
        };

        TradeStats {
            total_trades,
            wins,
            losses,
            win_ratio: ratio(wins),
            loss_ratio: ratio(losses),
            profit_factor: round_to(profit_factor, PROFIT_FACTOR_DECIMALS),
        }
    }
}
