//! JSON report adapter implementing ReportPort.
//!
//! The report is the response envelope clients already consume:
//! `{"status": "success", "rules": {...}, "result": {...}}`.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PhoenixError;
use crate::domain::rule::RuleSet;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub status: &'static str,
    pub rules: &'a RuleSet,
    pub result: &'a BacktestResult,
}

impl<'a> ReportEnvelope<'a> {
    pub fn success(result: &'a BacktestResult, rules: &'a RuleSet) -> Self {
        ReportEnvelope {
            status: "success",
            rules,
            result,
        }
    }
}

pub fn render_report(result: &BacktestResult, rules: &RuleSet) -> Result<String, PhoenixError> {
    serde_json::to_string_pretty(&ReportEnvelope::success(result, rules)).map_err(|e| {
        PhoenixError::Report {
            reason: e.to_string(),
        }
    })
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        rules: &RuleSet,
        output_path: &str,
    ) -> Result<(), PhoenixError> {
        let json = render_report(result, rules)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        tracing::info!(path = output_path, "report written");

        Ok(())
    }
}
