//! Configuration module for the market data pipeline

use serde::Deserialize;
use std::env;

use crate::channel::to_wire_symbol;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Instruments to subscribe to, in wire form (e.g. ["btc_usdt", "eth_usdt"])
    pub instruments: Vec<String>,

    /// WebSocket endpoint for the streaming transport
    pub ws_endpoint: String,

    /// REST API endpoint for snapshots
    pub rest_endpoint: String,

    /// Display limit for normalized order book levels per side
    pub depth_limit: usize,

    /// Depth requested in subscribe frames (sent as text on the wire)
    pub depth_subscription: String,

    /// Reconnection settings
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // Accepts both dashboard symbols (BTCUSDT) and wire form (btc_usdt)
        let instruments: Vec<String> = env::var("INSTRUMENTS")
            .unwrap_or_else(|_| "btc_usdt".to_string())
            .split(',')
            .map(|s| to_wire_symbol(s.trim()))
            .collect();

        Ok(Self {
            instruments,
            ws_endpoint: env::var("WS_ENDPOINT")
                .unwrap_or_else(|_| "wss://www.lbkex.net/ws/V2/".to_string()),
            rest_endpoint: env::var("REST_ENDPOINT")
                .unwrap_or_else(|_| "https://www.lbkex.net/v2".to_string()),
            depth_limit: env::var("DEPTH_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            depth_subscription: env::var("DEPTH_SUBSCRIPTION")
                .unwrap_or_else(|_| "60".to_string()),
            reconnect_delay_ms: env::var("RECONNECT_DELAY_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            max_reconnect_attempts: env::var("MAX_RECONNECT_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instruments: vec!["btc_usdt".to_string()],
            ws_endpoint: "wss://www.lbkex.net/ws/V2/".to_string(),
            rest_endpoint: "https://www.lbkex.net/v2".to_string(),
            depth_limit: 20,
            depth_subscription: "60".to_string(),
            reconnect_delay_ms: 3000,
            max_reconnect_attempts: 5,
        }
    }
}
