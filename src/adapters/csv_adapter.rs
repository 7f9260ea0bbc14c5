//! CSV file candle adapter.
//!
//! One file per asset and interval: `<base>/<ASSET>_<interval>.csv` with a
//! `timestamp,open,high,low,close,volume` header. Timestamps are epoch
//! milliseconds and must be strictly ascending. Non-finite values such as
//! `NaN` or `inf` are rejected.

use crate::domain::candle::{is_strictly_ascending, Candle};
use crate::domain::error::PhoenixError;
use crate::domain::fetch::FetchRequest;
use crate::ports::data_port::DataPort;
use std::fs::File;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, request: &FetchRequest) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", request.asset, request.interval))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self, request: &FetchRequest) -> Result<Vec<Candle>, PhoenixError> {
        let path = self.csv_path(request);
        let file = File::open(&path).map_err(|e| PhoenixError::Upstream {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(file);
        let mut candles = Vec::new();
        for (line, result) in rdr.deserialize::<Candle>().enumerate() {
            let candle = result.map_err(|e| PhoenixError::Upstream {
                reason: format!("{} row {}: {}", path.display(), line + 1, e),
            })?;
            if !candle.is_finite() {
                return Err(PhoenixError::Upstream {
                    reason: format!("{} row {}: non-finite value", path.display(), line + 1),
                });
            }
            candles.push(candle);
        }

        if !is_strictly_ascending(&candles) {
            return Err(PhoenixError::Upstream {
                reason: format!("{}: timestamps are not strictly ascending", path.display()),
            });
        }

        let limit = request.limit();
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        tracing::debug!(path = %path.display(), candles = candles.len(), "loaded candles");
        Ok(candles)
    }
}
