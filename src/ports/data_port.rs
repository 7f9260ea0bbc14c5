//! Candle source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::PhoenixError;
use crate::domain::fetch::FetchRequest;

/// A source of historical candles.
///
/// Implementations return at most `request.limit()` candles, the most recent
/// ones, in strictly ascending timestamp order.
pub trait DataPort {
    fn fetch_candles(&self, request: &FetchRequest) -> Result<Vec<Candle>, PhoenixError>;
}
