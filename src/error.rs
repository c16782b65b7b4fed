//! Error types for the market data pipeline

use thiserror::Error;

/// Market data pipeline errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("WebSocket connection error: {0}")]
    Connection(String),

    #[error("WebSocket message error: {0}")]
    Message(String),

    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("Snapshot API error: {0}")]
    RestApi(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Max reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}

impl From<tokio_tungstenite::tungstenite::Error> for MarketDataError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MarketDataError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        MarketDataError::RestApi(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
