//! Snapshot client for the venue REST API
//!
//! Covers the bootstrap fetches the streaming transport cannot serve:
//! 24h ticker snapshots, an order book snapshot, and historical candles.
//! Figures arrive as decimal-as-text and are normalized with the same
//! loose parsing as the streaming path.

use serde::Deserialize;
use tracing::debug;

use crate::error::{MarketDataError, Result};
use crate::message::{parse_loose, Candle, Ticker};

/// Historical candles live on the venue's legacy API host
const KLINE_ENDPOINT: &str = "https://api.lbkex.com/v1";

/// Map a display interval to the venue's kline type
///
/// Unknown intervals fall back to hourly; 3m is served from the 5m
/// series because the venue has no 3m granularity.
pub fn interval_to_wire(interval: &str) -> &'static str {
    match interval {
        "1m" => "minute1",
        "3m" | "5m" => "minute5",
        "15m" => "minute15",
        "30m" => "minute30",
        "1h" => "hour1",
        "4h" => "hour4",
        "1d" => "day1",
        "1w" => "week1",
        _ => "hour1",
    }
}

fn interval_seconds(wire: &str) -> i64 {
    match wire {
        "minute1" => 60,
        "minute5" => 300,
        "minute15" => 900,
        "minute30" => 1800,
        "hour1" => 3600,
        "hour4" => 14400,
        "day1" => 86400,
        "week1" => 604_800,
        _ => 3600,
    }
}

/// 24h ticker snapshot entry
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTicker {
    pub symbol: String,
    pub ticker: SnapshotTickerFigures,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Decimal-as-text figures inside a ticker snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTickerFigures {
    pub high: String,
    pub low: String,
    pub vol: String,
    pub change: String,
    pub turnover: String,
    pub latest: String,
}

impl SnapshotTicker {
    /// Normalized numeric view, matching the streaming ticker
    pub fn normalize(&self) -> Ticker {
        let last_price = parse_loose(&self.ticker.latest);
        let price_change = parse_loose(&self.ticker.change);
        Ticker {
            instrument: self.symbol.clone(),
            last_price,
            price_change,
            price_change_percent: price_change / (last_price - price_change) * 100.0,
            high: parse_loose(&self.ticker.high),
            low: parse_loose(&self.ticker.low),
            volume: parse_loose(&self.ticker.vol),
            quote_volume: parse_loose(&self.ticker.turnover),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerEnvelope {
    #[serde(default)]
    data: Vec<SnapshotTicker>,
}

/// Order book snapshot, raw (price, amount) text pairs per side
#[derive(Debug, Clone, Deserialize)]
pub struct DepthSnapshot {
    #[serde(default)]
    pub bids: Vec<[String; 2]>,
    #[serde(default)]
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
struct DepthEnvelope {
    data: Option<DepthSnapshot>,
}

/// `[time, open, high, low, close, volume]` rows from the kline endpoint
type RawKline = (u64, f64, f64, f64, f64, f64);

/// REST client for snapshot fetches
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: String,
}

impl SnapshotClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// 24h ticker snapshot for one instrument
    pub async fn ticker(&self, symbol: &str) -> Result<SnapshotTicker> {
        let url = format!(
            "{}/ticker/24hr.do?symbol={}",
            self.base_url,
            symbol.to_lowercase()
        );
        debug!(url = %url, "Fetching ticker snapshot");

        let envelope: TickerEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::RestApi(format!("No ticker data for {}", symbol)))
    }

    /// 24h ticker snapshots for every listed instrument
    pub async fn all_tickers(&self) -> Result<Vec<SnapshotTicker>> {
        let url = format!("{}/ticker/24hr.do?symbol=all", self.base_url);
        debug!(url = %url, "Fetching all ticker snapshots");

        let envelope: TickerEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelope.data)
    }

    /// Order book snapshot with up to `size` levels per side
    pub async fn depth(&self, symbol: &str, size: usize) -> Result<DepthSnapshot> {
        let url = format!(
            "{}/depth.do?symbol={}&size={}",
            self.base_url,
            symbol.to_lowercase(),
            size
        );
        debug!(url = %url, "Fetching depth snapshot");

        let envelope: DepthEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        envelope
            .data
            .ok_or_else(|| MarketDataError::RestApi(format!("No depth data for {}", symbol)))
    }

    /// Historical candles, most recent `limit` periods
    pub async fn klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let wire = interval_to_wire(interval);
        let start = chrono::Utc::now().timestamp() - limit as i64 * interval_seconds(wire);
        let url = format!(
            "{}/kline.do?symbol={}&size={}&type={}&time={}",
            KLINE_ENDPOINT,
            symbol.to_lowercase(),
            limit,
            wire,
            start
        );
        debug!(url = %url, "Fetching klines");

        let rows: Vec<RawKline> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(rows
            .into_iter()
            .map(|(time, open, high, low, close, volume)| Candle {
                instrument: symbol.to_lowercase(),
                time,
                open,
                high,
                low,
                close,
                volume,
            })
            .collect())
    }
}
