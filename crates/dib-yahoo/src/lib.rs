//! Yahoo Finance adapter (historical candles).
//!
//! Uses the public `v8/finance/chart` endpoint and implements the
//! `dib-core` [`MarketDataPort`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use dib_core::{
    config::Config,
    errors::Error,
    market::{Candle, MarketDataPort},
    Result,
};

const USER_AGENT: &str = concat!("dib/", env!("CARGO_PKG_VERSION"));
const SECONDS_PER_DAY: i64 = 86_400;
const ERROR_BODY_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct YahooFinanceClient {
    base_url: String,
    http: reqwest::Client,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::External(format!("yahoo client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.market_api_base.clone(), cfg.market_timeout)
    }

    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid market api base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("market api base url cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataPort for YahooFinanceClient {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>> {
        let (period1, period2) = period_range(Utc::now().timestamp(), lookback_days);
        let url = self.chart_url(symbol)?;
        debug!(%url, interval, period1, period2, "fetching candles");

        let resp = self
            .http
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("yahoo request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("yahoo body error: {e}")))?;

        ensure_success(symbol, status, &body)?;

        let chart: ChartResponse = serde_json::from_str(&body)?;
        let candles = chart.into_candles()?;
        debug!(symbol, candles = candles.len(), "candles parsed");
        Ok(candles)
    }
}

/// Map a non-2xx response to an error carrying the start of the body.
fn ensure_success(symbol: &str, status: reqwest::StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(Error::External(format!(
        "yahoo chart request failed for {symbol}: {status} {}",
        body.chars().take(ERROR_BODY_CHARS).collect::<String>()
    )))
}

/// `(period1, period2)` unix seconds covering the last `lookback_days` days.
fn period_range(now: i64, lookback_days: u32) -> (i64, i64) {
    (now - i64::from(lookback_days) * SECONDS_PER_DAY, now)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Zip the column arrays into candles, dropping rows with any gap.
    fn into_candles(self) -> Result<Vec<Candle>> {
        if let Some(err) = self.chart.error {
            return Err(Error::External(format!(
                "yahoo chart error: {} {}",
                err.code, err.description
            )));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(Error::External("yahoo chart returned no result".to_string()));
        };
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();
        let mut candles: Vec<Candle> = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &timestamp)| {
                Some(Candle {
                    timestamp,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: at(&quote.volume, i)?,
                })
            })
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Candle>> {
        serde_json::from_str::<ChartResponse>(json)?.into_candles()
    }

    #[test]
    fn drops_rows_with_missing_values() {
        let json = r#"{"chart":{"result":[{
            "meta":{"symbol":"ETH-USD"},
            "timestamp":[1700000000,1700003600,1700007200],
            "indicators":{"quote":[{
                "open":[1.0,2.0,3.0],
                "high":[1.5,null,3.5],
                "low":[0.5,1.5,2.5],
                "close":[1.2,2.2,3.2],
                "volume":[10,20,30]
            }]}
        }],"error":null}}"#;

        let candles = parse(json).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000);
        assert_eq!(candles[1].close, 3.2);
        assert_eq!(candles[1].volume, 30.0);
    }

    #[test]
    fn chart_error_is_reported() {
        let json = r#"{"chart":{"result":null,"error":{
            "code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn empty_result_is_an_error() {
        assert!(parse(r#"{"chart":{"result":[],"error":null}}"#).is_err());
    }

    #[test]
    fn missing_quote_yields_no_candles() {
        let json = r#"{"chart":{"result":[{"timestamp":[1,2],"indicators":{"quote":[]}}]}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn error_status_is_external_with_truncated_body() {
        assert!(ensure_success("ETH-USD", reqwest::StatusCode::OK, "{}").is_ok());

        let body = "ü".repeat(500);
        let err = ensure_success("ETH-USD", reqwest::StatusCode::NOT_FOUND, &body).unwrap_err();
        assert!(matches!(err, Error::External(_)));
        let msg = err.to_string();
        assert!(msg.contains("failed for ETH-USD: 404 Not Found"));
        assert_eq!(msg.matches('ü').count(), ERROR_BODY_CHARS);
    }

    #[test]
    fn period_covers_lookback_days() {
        assert_eq!(period_range(1_000_000, 2), (1_000_000 - 172_800, 1_000_000));
        assert_eq!(period_range(500, 0), (500, 500));
    }

    #[test]
    fn chart_url_escapes_symbol() {
        let client =
            YahooFinanceClient::new("https://example.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.chart_url("ETH-USD").unwrap().as_str(),
            "https://example.com/v8/finance/chart/ETH-USD"
        );
        assert_eq!(
            client.chart_url("A/B").unwrap().as_str(),
            "https://example.com/v8/finance/chart/A%2FB"
        );
    }
}
