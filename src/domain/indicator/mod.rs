//! Technical indicator engine.
//!
//! Each indicator is computed over the full close series as a
//! `Vec<Option<f64>>`, where `None` marks a warm-up (undefined) position.
//! [`compute_indicator_rows`] then joins the columns onto the candles, drops
//! every row that still has an undefined field, and returns the survivors
//! as a contiguous zero-based sequence.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::candle::Candle;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RSI_PERIOD: usize = 14;
pub const EMA_PERIODS: [usize; 4] = [20, 50, 100, 200];
pub const SMA_PERIODS: [usize; 5] = [10, 20, 50, 100, 200];

/// Index of the first row at which every indicator is defined.
pub const LONGEST_LOOKBACK: usize = 200;

/// An indicator output aligned with its input; `None` during warm-up.
pub type Series = Vec<Option<f64>>;

/// A candle augmented with every computed indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub ema200: f64,
    pub sma10: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma100: f64,
    pub sma200: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// A readable column of an [`IndicatorRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Close,
    Rsi,
    Ema(u32),
    Sma(u32),
    Macd,
    Signal,
    Histogram,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Close => write!(f, "close"),
            Column::Rsi => write!(f, "rsi"),
            Column::Ema(period) => write!(f, "ema{}", period),
            Column::Sma(period) => write!(f, "sma{}", period),
            Column::Macd => write!(f, "macd"),
            Column::Signal => write!(f, "signal"),
            Column::Histogram => write!(f, "histogram"),
        }
    }
}

impl IndicatorRow {
    /// Read a column. Periods the engine does not compute, and non-finite
    /// values, read as `None`.
    pub fn get(&self, column: Column) -> Option<f64> {
        let value = match column {
            Column::Close => self.close,
            Column::Rsi => self.rsi,
            Column::Ema(20) => self.ema20,
            Column::Ema(50) => self.ema50,
            Column::Ema(100) => self.ema100,
            Column::Ema(200) => self.ema200,
            Column::Sma(10) => self.sma10,
            Column::Sma(20) => self.sma20,
            Column::Sma(50) => self.sma50,
            Column::Sma(100) => self.sma100,
            Column::Sma(200) => self.sma200,
            Column::Macd => self.macd,
            Column::Signal => self.signal,
            Column::Histogram => self.histogram,
            Column::Ema(_) | Column::Sma(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn fields(&self) -> [f64; 19] {
        [
            self.timestamp as f64,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.rsi,
            self.ema20,
            self.ema50,
            self.ema100,
            self.ema200,
            self.sma10,
            self.sma20,
            self.sma50,
            self.sma100,
            self.sma200,
            self.macd,
            self.signal,
            self.histogram,
        ]
    }

    /// True when every field holds a finite value.
    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|v| v.is_finite())
    }
}

/// Compute the indicator catalogue and return only fully-defined rows,
/// reindexed from zero. The input candles are not modified.
pub fn compute_indicator_rows(candles: &[Candle]) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let rsi = calculate_rsi(&closes, RSI_PERIOD);
    let [ema20, ema50, ema100, ema200] = EMA_PERIODS.map(|p| calculate_ema(&closes, p));
    let [sma10, sma20, sma50, sma100, sma200] = SMA_PERIODS.map(|p| calculate_sma(&closes, p));
    let macd = calculate_macd(&closes);

    let nan = |series: &Series, i: usize| series[i].unwrap_or(f64::NAN);

    let rows: Vec<IndicatorRow> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| IndicatorRow {
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            rsi: nan(&rsi, i),
            ema20: nan(&ema20, i),
            ema50: nan(&ema50, i),
            ema100: nan(&ema100, i),
            ema200: nan(&ema200, i),
            sma10: nan(&sma10, i),
            sma20: nan(&sma20, i),
            sma50: nan(&sma50, i),
            sma100: nan(&sma100, i),
            sma200: nan(&sma200, i),
            macd: nan(&macd.line, i),
            signal: nan(&macd.signal, i),
            histogram: nan(&macd.histogram, i),
        })
        .filter(IndicatorRow::is_complete)
        .collect();

    tracing::debug!(
        candles = candles.len(),
        rows = rows.len(),
        "indicator rows computed"
    );
    rows
}
