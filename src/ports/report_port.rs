//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PhoenixError;
use crate::domain::rule::RuleSet;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        rules: &RuleSet,
        output_path: &str,
    ) -> Result<(), PhoenixError>;
}
