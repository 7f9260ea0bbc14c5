//! Candle fetch requests.
//!
//! An `(asset, interval, range)` triple is validated here, before any data
//! source is touched. The range determines how many candles to ask for,
//! capped at the exchange's per-request maximum.

use crate::domain::error::PhoenixError;
use std::fmt;
use std::str::FromStr;

/// Most candles a single request may return.
pub const MAX_CANDLES: usize = 1000;

const MINUTES_PER_DAY: u64 = 24 * 60;
const DAYS_PER_MONTH: u64 = 30;
const DAYS_PER_YEAR: u64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    pub fn minutes(self) -> u64 {
        match self {
            Interval::OneMinute => 1,
            Interval::FiveMinutes => 5,
            Interval::FifteenMinutes => 15,
            Interval::OneHour => 60,
            Interval::FourHours => 240,
            Interval::OneDay => 1440,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }
}

impl FromStr for Interval {
    type Err = PhoenixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            other => Err(PhoenixError::InvalidInterval {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Days,
    Months,
    Years,
}

/// A lookback such as `30d`, `6m` (months) or `1y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub amount: u64,
    pub unit: RangeUnit,
}

impl HistoryRange {
    /// Months count as 30 days, years as 365.
    pub fn days(self) -> u64 {
        match self.unit {
            RangeUnit::Days => self.amount,
            RangeUnit::Months => self.amount.saturating_mul(DAYS_PER_MONTH),
            RangeUnit::Years => self.amount.saturating_mul(DAYS_PER_YEAR),
        }
    }

    pub fn minutes(self) -> u64 {
        self.days().saturating_mul(MINUTES_PER_DAY)
    }
}

impl FromStr for HistoryRange {
    type Err = PhoenixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PhoenixError::InvalidRange {
            value: s.to_string(),
        };
        let s = s.trim();
        let unit = match s.chars().last() {
            Some('d') => RangeUnit::Days,
            Some('m') => RangeUnit::Months,
            Some('y') => RangeUnit::Years,
            _ => return Err(invalid()),
        };
        // the unit is a single ASCII byte here
        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount = digits.parse::<u64>().map_err(|_| invalid())?;
        Ok(HistoryRange { amount, unit })
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            RangeUnit::Days => 'd',
            RangeUnit::Months => 'm',
            RangeUnit::Years => 'y',
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

/// Number of candles covering `range` at `interval`, capped at [`MAX_CANDLES`].
pub fn candle_limit(range: HistoryRange, interval: Interval) -> usize {
    let candles = range.minutes() / interval.minutes();
    usize::try_from(candles).unwrap_or(usize::MAX).min(MAX_CANDLES)
}

/// A validated request for historical candles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub asset: String,
    pub interval: Interval,
    pub range: HistoryRange,
}

impl FetchRequest {
    pub fn new(asset: &str, interval: &str, range: &str) -> Result<Self, PhoenixError> {
        let asset = asset.trim().to_uppercase();
        if asset.is_empty() || !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PhoenixError::ConfigInvalid {
                section: "backtest".into(),
                key: "asset".into(),
                reason: format!("asset must be a non-empty alphanumeric symbol, got '{}'", asset),
            });
        }
        Ok(FetchRequest {
            asset,
            interval: interval.parse()?,
            range: range.parse()?,
        })
    }

    pub fn limit(&self) -> usize {
        candle_limit(self.range, self.interval)
    }

    /// Exchange pair symbol, quoted in USDT.
    pub fn symbol(&self) -> String {
        format!("{}USDT", self.asset)
    }
}
