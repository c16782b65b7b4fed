//! Logical subscription channels
//!
//! A channel is a (message kind, instrument) pair. The exchange multiplexes
//! every subscription over one websocket connection, so these keys are what
//! the registry and router use to tell streams apart.

use std::fmt;

/// Kind of market data carried on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Ticker,
    Depth,
    Trade,
    Kline,
}

impl ChannelKind {
    /// Wire name used in subscribe frames and the inbound `type` field
    pub fn as_wire(&self) -> &'static str {
        match self {
            ChannelKind::Ticker => "tick",
            ChannelKind::Depth => "depth",
            ChannelKind::Trade => "trade",
            ChannelKind::Kline => "kline",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "tick" => Some(ChannelKind::Ticker),
            "depth" => Some(ChannelKind::Depth),
            "trade" => Some(ChannelKind::Trade),
            "kline" => Some(ChannelKind::Kline),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Identifies one logical subscription on the shared connection
///
/// Instruments are stored lower-cased in the `base_quote` form the
/// transport expects (e.g. `btc_usdt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub kind: ChannelKind,
    pub instrument: String,
}

impl ChannelKey {
    pub fn new(kind: ChannelKind, instrument: &str) -> Self {
        Self {
            kind,
            instrument: instrument.to_lowercase(),
        }
    }

    pub fn ticker(instrument: &str) -> Self {
        Self::new(ChannelKind::Ticker, instrument)
    }

    pub fn depth(instrument: &str) -> Self {
        Self::new(ChannelKind::Depth, instrument)
    }

    pub fn trade(instrument: &str) -> Self {
        Self::new(ChannelKind::Trade, instrument)
    }

    pub fn kline(instrument: &str) -> Self {
        Self::new(ChannelKind::Kline, instrument)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.instrument)
    }
}

/// Convert a dashboard symbol (`BTCUSDT`) to the wire form (`btc_usdt`)
///
/// The delimiter is inserted before the first recognized quote asset.
/// Symbols already containing an underscore pass through lower-cased.
pub fn to_wire_symbol(symbol: &str) -> String {
    let normalized = symbol.to_lowercase();
    if normalized.contains('_') {
        return normalized;
    }
    for quote in ["usdt", "usdc", "eth"] {
        if let Some(base) = normalized.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{}_{}", base, quote);
            }
        }
    }
    normalized
}

/// Convert a wire symbol (`btc_usdt`) back to the dashboard form (`BTCUSDT`)
pub fn from_wire_symbol(symbol: &str) -> String {
    symbol.replace('_', "").to_uppercase()
}
