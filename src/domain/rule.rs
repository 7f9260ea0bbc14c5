//! Rule data structures.
//!
//! - `Indicator`: which indicator a rule is about
//! - `Condition`: canonical comparison (aliases are collapsed on read)
//! - `Rule`: one buy or sell condition
//! - `RuleSet`: the buy/sell pair a backtest runs
//!
//! Rules arrive from an untrusted interpreter. Deserialization never fails
//! on rule content: unknown names are dropped from the rule, which then
//! never fires. See [`crate::domain::rule_parser`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "EMA20")]
    Ema20,
    #[serde(rename = "EMA50")]
    Ema50,
    #[serde(rename = "EMA100")]
    Ema100,
    #[serde(rename = "EMA200")]
    Ema200,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "PRICE")]
    Price,
}

impl Indicator {
    /// Period of an EMA indicator, `None` for the others.
    pub fn ema_period(self) -> Option<u32> {
        match self {
            Indicator::Ema20 => Some(20),
            Indicator::Ema50 => Some(50),
            Indicator::Ema100 => Some(100),
            Indicator::Ema200 => Some(200),
            Indicator::Rsi | Indicator::Macd | Indicator::Price => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Indicator::Rsi => "RSI",
            Indicator::Ema20 => "EMA20",
            Indicator::Ema50 => "EMA50",
            Indicator::Ema100 => "EMA100",
            Indicator::Ema200 => "EMA200",
            Indicator::Macd => "MACD",
            Indicator::Price => "PRICE",
        }
    }
}

impl FromStr for Indicator {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RSI" => Ok(Indicator::Rsi),
            "EMA20" => Ok(Indicator::Ema20),
            "EMA50" => Ok(Indicator::Ema50),
            "EMA100" => Ok(Indicator::Ema100),
            "EMA200" => Ok(Indicator::Ema200),
            "MACD" => Ok(Indicator::Macd),
            "PRICE" => Ok(Indicator::Price),
            other => Err(format!("unknown indicator '{}'", other)),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Lt,
    Gt,
    CrossesAbove,
    CrossesBelow,
}

impl Condition {
    pub fn name(self) -> &'static str {
        match self {
            Condition::Lt => "lt",
            Condition::Gt => "gt",
            Condition::CrossesAbove => "crosses_above",
            Condition::CrossesBelow => "crosses_below",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    /// Collapses aliases: `<`, `less_than`, `below` → `lt`;
    /// `>`, `greater_than`, `above` → `gt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lt" | "<" | "less_than" | "below" => Ok(Condition::Lt),
            "gt" | ">" | "greater_than" | "above" => Ok(Condition::Gt),
            "crosses_above" => Ok(Condition::CrossesAbove),
            "crosses_below" => Ok(Condition::CrossesBelow),
            other => Err(format!("unknown condition '{}'", other)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub period: u32,
}

/// One buy or sell condition. The default rule is empty and never fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct Rule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_to: Option<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_average: Option<MovingAverage>,
}

impl Rule {
    pub fn is_empty(&self) -> bool {
        self.indicator.is_none()
            && self.condition.is_none()
            && self.value.is_none()
            && self.compare_to.is_none()
            && self.moving_average.is_none()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<empty>");
        }
        match self.indicator {
            Some(ind) => write!(f, "{}", ind)?,
            None => write!(f, "?")?,
        }
        match self.condition {
            Some(cond) => write!(f, " {}", cond)?,
            None => write!(f, " ?")?,
        }
        if let Some(other) = self.compare_to {
            write!(f, " {}", other)?;
        } else if let Some(ma) = self.moving_average {
            write!(f, " SMA({})", ma.period)?;
        } else if let Some(value) = self.value {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// The buy/sell pair. A side that is missing (or `null`) is an empty rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub buy: Rule,
    #[serde(default)]
    pub sell: Rule,
}
