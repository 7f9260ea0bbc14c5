//! Exchange kline dump adapter.
//!
//! Reads `<base>/<ASSET>USDT_<interval>.json`, a saved response of the
//! exchange klines endpoint: an array of arrays shaped
//! `[open_time, "open", "high", "low", "close", "volume", close_time, ...]`.
//! Prices and volume arrive as decimal strings; plain numbers are accepted too.
//! Non-finite values (`"NaN"`, `"inf"`) are rejected.

use crate::domain::candle::{is_strictly_ascending, Candle};
use crate::domain::error::PhoenixError;
use crate::domain::fetch::FetchRequest;
use crate::ports::data_port::DataPort;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub struct KlineFileAdapter {
    base_path: PathBuf,
}

impl KlineFileAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn kline_path(&self, request: &FetchRequest) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.json", request.symbol(), request.interval))
    }
}

fn field(kline: &[Value], index: usize, name: &str) -> Result<f64, PhoenixError> {
    let value = kline.get(index).ok_or_else(|| PhoenixError::Upstream {
        reason: format!("kline missing {} field", name),
    })?;
    let number = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    number.filter(|v| v.is_finite()).ok_or_else(|| PhoenixError::Upstream {
        reason: format!("kline has invalid {} value: {}", name, value),
    })
}

pub fn parse_kline(kline: &Value) -> Result<Candle, PhoenixError> {
    let kline = kline.as_array().ok_or_else(|| PhoenixError::Upstream {
        reason: format!("kline is not an array: {}", kline),
    })?;
    let timestamp = kline
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| PhoenixError::Upstream {
            reason: "kline missing integer open time".into(),
        })?;

    Ok(Candle {
        timestamp,
        open: field(kline, 1, "open")?,
        high: field(kline, 2, "high")?,
        low: field(kline, 3, "low")?,
        close: field(kline, 4, "close")?,
        volume: field(kline, 5, "volume")?,
    })
}

impl DataPort for KlineFileAdapter {
    fn fetch_candles(&self, request: &FetchRequest) -> Result<Vec<Candle>, PhoenixError> {
        let path = self.kline_path(request);
        let content = fs::read_to_string(&path).map_err(|e| PhoenixError::Upstream {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let raw: Vec<Value> = serde_json::from_str(&content).map_err(|e| PhoenixError::Upstream {
            reason: format!("{}: {}", path.display(), e),
        })?;

        let mut candles = raw.iter().map(parse_kline).collect::<Result<Vec<_>, _>>()?;
        if !is_strictly_ascending(&candles) {
            return Err(PhoenixError::Upstream {
                reason: format!("{}: open times are not strictly ascending", path.display()),
            });
        }

        let limit = request.limit();
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        tracing::debug!(path = %path.display(), candles = candles.len(), "loaded klines");
        Ok(candles)
    }
}
