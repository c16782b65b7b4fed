//! Wire messages for the streaming transport
//!
//! Handles deserialization of ticker, depth, trade and kline frames, the
//! normalized numeric views consumed by the rest of the pipeline, and the
//! outbound subscribe/unsubscribe frames.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelKey, ChannelKind};

/// Parse decimal-as-text the way the feed delivers it
///
/// Failures become NaN rather than an error: the pipeline never filters
/// unusable values, consumers guard on finiteness instead.
pub fn parse_loose(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Inbound frame, discriminated by the `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    #[serde(rename = "tick")]
    Ticker(TickerUpdate),
    #[serde(rename = "depth")]
    Depth(DepthUpdate),
    #[serde(rename = "trade")]
    Trade(TradeUpdate),
    #[serde(rename = "kline")]
    Kline(KlineUpdate),
}

impl StreamMessage {
    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Channel the frame belongs to
    pub fn channel_key(&self) -> ChannelKey {
        match self {
            StreamMessage::Ticker(m) => ChannelKey::new(ChannelKind::Ticker, &m.pair),
            StreamMessage::Depth(m) => ChannelKey::new(ChannelKind::Depth, &m.pair),
            StreamMessage::Trade(m) => ChannelKey::new(ChannelKind::Trade, &m.pair),
            StreamMessage::Kline(m) => ChannelKey::new(ChannelKind::Kline, &m.pair),
        }
    }
}

/// Ticker frame, all figures decimal-as-text
#[derive(Debug, Clone, Deserialize)]
pub struct TickerUpdate {
    pub pair: String,
    pub latest: String,
    pub change: String,
    pub high: String,
    pub low: String,
    pub vol: String,
    pub turnover: String,
}

impl TickerUpdate {
    /// Normalized numeric view
    pub fn normalize(&self) -> Ticker {
        let last_price = parse_loose(&self.latest);
        let price_change = parse_loose(&self.change);
        Ticker {
            instrument: self.pair.clone(),
            last_price,
            price_change,
            price_change_percent: price_change / (last_price - price_change) * 100.0,
            high: parse_loose(&self.high),
            low: parse_loose(&self.low),
            volume: parse_loose(&self.vol),
            quote_volume: parse_loose(&self.turnover),
        }
    }
}

/// Normalized ticker
#[derive(Debug, Clone, Serialize)]
pub struct Ticker {
    pub instrument: String,
    pub last_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub quote_volume: f64,
}

/// Depth frame carrying raw (price, amount) text pairs
///
/// Levels stay as text here; normalization into sorted cumulative levels
/// happens in the orderbook aggregator.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthUpdate {
    pub pair: String,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Trade frame
#[derive(Debug, Clone, Deserialize)]
pub struct TradeUpdate {
    pub pair: String,
    pub price: String,
    pub amount: String,
    pub direction: TradeDirection,
    pub ts: u64,
}

impl TradeUpdate {
    pub fn normalize(&self) -> TradeTick {
        TradeTick {
            instrument: self.pair.clone(),
            price: parse_loose(&self.price),
            amount: parse_loose(&self.amount),
            direction: self.direction,
            timestamp: self.ts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Normalized trade
#[derive(Debug, Clone, Serialize)]
pub struct TradeTick {
    pub instrument: String,
    pub price: f64,
    pub amount: f64,
    pub direction: TradeDirection,
    pub timestamp: u64,
}

/// Kline frame
#[derive(Debug, Clone, Deserialize)]
pub struct KlineUpdate {
    pub pair: String,
    pub time: u64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub vol: String,
}

impl KlineUpdate {
    pub fn normalize(&self) -> Candle {
        Candle {
            instrument: self.pair.clone(),
            time: self.time,
            open: parse_loose(&self.open),
            high: parse_loose(&self.high),
            low: parse_loose(&self.low),
            close: parse_loose(&self.close),
            volume: parse_loose(&self.vol),
        }
    }
}

/// Normalized candle
#[derive(Debug, Clone, Serialize)]
pub struct Candle {
    pub instrument: String,
    pub time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Outbound subscribe frame
///
/// The `depth` field is present only for depth channels.
pub fn subscribe_frame(key: &ChannelKey, depth: &str) -> String {
    let mut frame = serde_json::json!({
        "action": "subscribe",
        "subscribe": key.kind.as_wire(),
        "pair": key.instrument,
    });
    if key.kind == ChannelKind::Depth {
        frame["depth"] = serde_json::Value::from(depth);
    }
    frame.to_string()
}

/// Outbound unsubscribe frame, mirroring the subscribe shape
pub fn unsubscribe_frame(key: &ChannelKey) -> String {
    serde_json::json!({
        "action": "unsubscribe",
        "unsubscribe": key.kind.as_wire(),
        "pair": key.instrument,
    })
    .to_string()
}
