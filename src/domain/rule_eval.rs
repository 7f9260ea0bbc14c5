//! Rule evaluation engine.
//!
//! Evaluates a [`Rule`] against indicator rows at a given row index.
//!
//! # Evaluation Semantics
//!
//! - A rule is classified into a [`Shape`], which fixes the two operands
//!   being compared (e.g. `close` vs `ema20`, `rsi` vs a threshold).
//! - `(shape, condition)` pairs are looked up in [`RULE_TABLE`]; pairs not in
//!   the table never fire.
//! - `lt`/`gt` compare the operands at the current row.
//! - `crosses_above`: `prev_a < prev_b && a > b`; `crosses_below` mirrored.
//!   Equality never counts as a cross.
//! - Index 0, out-of-range indices, empty rules, and missing or non-finite
//!   columns all evaluate to `false`.

use crate::domain::indicator::{Column, IndicatorRow, SMA_PERIODS};
use crate::domain::rule::{Condition, Indicator, Rule};

/// What a rule compares, independent of the comparison used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `rsi` vs the rule's literal `value`.
    Rsi,
    /// `close` vs one EMA line.
    PriceVsEma,
    /// One EMA line vs another (`compare_to`).
    EmaVsEma,
    /// `close` vs `sma{moving_average.period}`.
    PriceVsSma,
    /// MACD line vs its signal line.
    Macd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Column(Column),
    Constant(f64),
}

impl Operand {
    fn read(self, row: &IndicatorRow) -> Option<f64> {
        match self {
            Operand::Column(column) => row.get(column),
            Operand::Constant(v) => v.is_finite().then_some(v),
        }
    }
}

pub type EvalFn = fn(&[IndicatorRow], usize, Operand, Operand) -> Option<bool>;

/// Every supported `(shape, condition)` pair and its evaluation function.
pub static RULE_TABLE: [(Shape, Condition, EvalFn); 16] = [
    (Shape::Rsi, Condition::Lt, is_below),
    (Shape::Rsi, Condition::Gt, is_above),
    (Shape::Rsi, Condition::CrossesAbove, crosses_above),
    (Shape::Rsi, Condition::CrossesBelow, crosses_below),
    (Shape::PriceVsEma, Condition::Lt, is_below),
    (Shape::PriceVsEma, Condition::Gt, is_above),
    (Shape::PriceVsEma, Condition::CrossesAbove, crosses_above),
    (Shape::PriceVsEma, Condition::CrossesBelow, crosses_below),
    (Shape::EmaVsEma, Condition::CrossesAbove, crosses_above),
    (Shape::EmaVsEma, Condition::CrossesBelow, crosses_below),
    (Shape::PriceVsSma, Condition::CrossesAbove, crosses_above),
    (Shape::PriceVsSma, Condition::CrossesBelow, crosses_below),
    (Shape::Macd, Condition::Lt, is_below),
    (Shape::Macd, Condition::Gt, is_above),
    (Shape::Macd, Condition::CrossesAbove, crosses_above),
    (Shape::Macd, Condition::CrossesBelow, crosses_below),
];

impl Shape {
    pub fn classify(rule: &Rule) -> Option<Shape> {
        let indicator = rule.indicator?;
        if indicator.ema_period().is_some() {
            return match rule.compare_to {
                None => Some(Shape::PriceVsEma),
                Some(other) if other.ema_period().is_some() => Some(Shape::EmaVsEma),
                Some(_) => None,
            };
        }
        match indicator {
            Indicator::Rsi => Some(Shape::Rsi),
            Indicator::Macd => Some(Shape::Macd),
            Indicator::Price => rule.moving_average.map(|_| Shape::PriceVsSma),
            _ => None,
        }
    }

    /// The `(left, right)` operands for `rule`, or `None` if a required field
    /// is missing.
    pub fn operands(self, rule: &Rule) -> Option<(Operand, Operand)> {
        let ema = |indicator: Option<Indicator>| {
            Some(Operand::Column(Column::Ema(indicator?.ema_period()?)))
        };
        match self {
            Shape::Rsi => Some((Operand::Column(Column::Rsi), Operand::Constant(rule.value?))),
            Shape::PriceVsEma => Some((Operand::Column(Column::Close), ema(rule.indicator)?)),
            Shape::EmaVsEma => Some((ema(rule.indicator)?, ema(rule.compare_to)?)),
            Shape::PriceVsSma => Some((
                Operand::Column(Column::Close),
                Operand::Column(Column::Sma(rule.moving_average?.period)),
            )),
            Shape::Macd => Some((Operand::Column(Column::Macd), Operand::Column(Column::Signal))),
        }
    }
}

fn lookup(shape: Shape, condition: Condition) -> Option<EvalFn> {
    RULE_TABLE
        .iter()
        .find(|(s, c, _)| *s == shape && *c == condition)
        .map(|(_, _, f)| *f)
}

/// Resolve the rule to its evaluation function and operands.
fn resolve(rule: &Rule) -> Option<(EvalFn, Operand, Operand)> {
    let shape = Shape::classify(rule)?;
    let eval = lookup(shape, rule.condition?)?;
    let (left, right) = shape.operands(rule)?;
    Some((eval, left, right))
}

/// Does `rule` hold at row `index`? Never panics; fails closed.
pub fn evaluate(rows: &[IndicatorRow], index: usize, rule: &Rule) -> bool {
    if index < 1 || index >= rows.len() {
        return false;
    }
    match resolve(rule) {
        Some((eval, left, right)) => eval(rows, index, left, right).unwrap_or(false),
        None => false,
    }
}

/// True when `rule` is well-formed enough to ever fire on some data.
pub fn can_fire(rule: &Rule) -> bool {
    let Some((_, _, right)) = resolve(rule) else {
        return false;
    };
    match right {
        Operand::Column(Column::Sma(period)) => SMA_PERIODS.contains(&(period as usize)),
        Operand::Constant(v) => v.is_finite(),
        Operand::Column(_) => true,
    }
}

fn current(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<(f64, f64)> {
    let row = &rows[index];
    Some((left.read(row)?, right.read(row)?))
}

fn previous(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<(f64, f64)> {
    current(rows, index.checked_sub(1)?, left, right)
}

fn is_below(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<bool> {
    let (a, b) = current(rows, index, left, right)?;
    Some(a < b)
}

fn is_above(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<bool> {
    let (a, b) = current(rows, index, left, right)?;
    Some(a > b)
}

fn crosses_above(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<bool> {
    let (prev_a, prev_b) = previous(rows, index, left, right)?;
    let (a, b) = current(rows, index, left, right)?;
    Some(prev_a < prev_b && a > b)
}

fn crosses_below(rows: &[IndicatorRow], index: usize, left: Operand, right: Operand) -> Option<bool> {
    let (prev_a, prev_b) = previous(rows, index, left, right)?;
    let (a, b) = current(rows, index, left, right)?;
    Some(prev_a > prev_b && a < b)
}
