//! Configuration validation.
//!
//! Validates all config fields before any candles are fetched.

use crate::domain::error::PhoenixError;
use crate::domain::fetch::{HistoryRange, Interval};
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "klines"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    validate_asset(config)?;
    validate_interval(config)?;
    validate_range(config)?;
    validate_initial_equity(config)?;
    validate_data_source(config)?;
    Ok(())
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, PhoenixError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(PhoenixError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_asset(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    let asset = required(config, "backtest", "asset")?;
    if !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PhoenixError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "asset".to_string(),
            reason: "asset must be alphanumeric, e.g. BTC".to_string(),
        });
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    required(config, "backtest", "interval")?.parse::<Interval>()?;
    Ok(())
}

fn validate_range(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    required(config, "backtest", "range")?.parse::<HistoryRange>()?;
    Ok(())
}

fn validate_initial_equity(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    let invalid = |reason: String| PhoenixError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "initial_equity".to_string(),
        reason,
    };
    let Some(raw) = config.get_string("backtest", "initial_equity") else {
        return Ok(());
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("'{}' is not a number", raw.trim())))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("initial_equity must be positive".to_string()));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), PhoenixError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(PhoenixError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown data source '{}', expected csv or klines", source),
        });
    }
    required(config, "data", "path")?;
    Ok(())
}
