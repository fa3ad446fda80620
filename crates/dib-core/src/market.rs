//! Market data port: OHLCV candles for a symbol.

use async_trait::async_trait;

use crate::Result;

/// One OHLCV bar. Timestamps are unix seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Provider of historical candles.
///
/// Implementations return bars in ascending time order and drop rows that
/// have any missing value.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>>;
}

/// Column views over a candle series.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}

pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}
