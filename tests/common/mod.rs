#![allow(dead_code)]

use phoenix::domain::candle::Candle;
use phoenix::domain::error::PhoenixError;
use phoenix::domain::fetch::FetchRequest;
use phoenix::domain::indicator::IndicatorRow;
use phoenix::domain::rule::{Condition, Indicator, Rule, RuleSet};
use phoenix::ports::data_port::DataPort;
use std::cell::Cell;
use std::collections::HashMap;

pub const HOUR_MS: i64 = 3_600_000;
pub const START_MS: i64 = 1_704_067_200_000; // 2024-01-01 00:00:00 UTC

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_candles(mut self, asset: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(asset.to_string(), candles);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self, request: &FetchRequest) -> Result<Vec<Candle>, PhoenixError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = self.errors.get(&request.asset) {
            return Err(PhoenixError::Upstream {
                reason: reason.clone(),
            });
        }
        let candles = self.data.get(&request.asset).cloned().unwrap_or_default();
        let skip = candles.len().saturating_sub(request.limit());
        Ok(candles.into_iter().skip(skip).collect())
    }
}

pub fn make_candle(index: usize, close: f64) -> Candle {
    Candle {
        timestamp: START_MS + index as i64 * HOUR_MS,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i, close))
        .collect()
}

/// Hourly candles climbing by `step` per bar from `start_price`.
pub fn generate_candles(count: usize, start_price: f64, step: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| make_candle(i, start_price + i as f64 * step))
        .collect()
}

/// Closes that rise for `up` bars then fall for `down` bars, with a small
/// zig-zag so RSI never saturates.
pub fn up_then_down_closes(up: usize, down: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(up + down);
    let mut price = 100.0;
    for i in 0..up + down {
        let wiggle = if i % 2 == 0 { 0.3 } else { -0.3 };
        let trend = if i < up { 1.0 } else { -1.0 };
        price += trend + wiggle;
        closes.push(price);
    }
    closes
}

/// An indicator row whose every column equals `close`.
pub fn make_row(index: usize, close: f64) -> IndicatorRow {
    IndicatorRow {
        timestamp: START_MS + index as i64 * HOUR_MS,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
        rsi: 50.0,
        ema20: close,
        ema50: close,
        ema100: close,
        ema200: close,
        sma10: close,
        sma20: close,
        sma50: close,
        sma100: close,
        sma200: close,
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
    }
}

pub fn rsi_rows(points: &[(f64, f64)]) -> Vec<IndicatorRow> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(close, rsi))| IndicatorRow {
            rsi,
            ..make_row(i, close)
        })
        .collect()
}

pub fn threshold_rule(indicator: Indicator, condition: Condition, value: f64) -> Rule {
    Rule {
        indicator: Some(indicator),
        condition: Some(condition),
        value: Some(value),
        ..Rule::default()
    }
}

pub fn rsi_rules(buy_below: f64, sell_above: f64) -> RuleSet {
    RuleSet {
        buy: threshold_rule(Indicator::Rsi, Condition::Lt, buy_below),
        sell: threshold_rule(Indicator::Rsi, Condition::Gt, sell_above),
    }
}

pub fn ema_cross_rules() -> RuleSet {
    RuleSet {
        buy: Rule {
            indicator: Some(Indicator::Ema20),
            condition: Some(Condition::CrossesAbove),
            compare_to: Some(Indicator::Ema50),
            ..Rule::default()
        },
        sell: Rule {
            indicator: Some(Indicator::Ema20),
            condition: Some(Condition::CrossesBelow),
            compare_to: Some(Indicator::Ema50),
            ..Rule::default()
        },
    }
}

/// `ExitCode` has no stable equality; compare through its debug form.
pub fn assert_exit(code: std::process::ExitCode, expected: u8) {
    assert_eq!(
        format!("{code:?}"),
        format!("{:?}", std::process::ExitCode::from(expected)),
        "unexpected exit code"
    );
}
