//! perp-feed - Perpetual Futures Market Data Pipeline
//!
//! This crate provides market data handling for connecting to the LBank
//! streaming API, maintaining normalized order book state, and deriving
//! the trading figures a dashboard displays: P&L, liquidation price,
//! funding rate and funding countdown. A simulated position book covers
//! order placement without touching a venue account.

pub mod channel;
pub mod config;
pub mod error;
pub mod message;
pub mod orderbook;
pub mod position;
pub mod registry;
pub mod rest;
pub mod risk;
pub mod router;
pub mod ws;

pub use channel::{ChannelKey, ChannelKind};
pub use config::Config;
pub use error::{MarketDataError, Result};
pub use message::{Candle, DepthUpdate, StreamMessage, Ticker, TradeTick};
pub use orderbook::{Orderbook, PriceLevel};
pub use position::{Position, PositionBook};
pub use registry::{HandlerId, SubscriptionRegistry};
pub use rest::SnapshotClient;
pub use risk::Side;
pub use ws::{ConnectionManager, ConnectionState, Transport, WsTransport};
