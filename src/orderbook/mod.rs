//! Order book module
//!
//! Normalizes raw depth frames into sorted display levels. Each frame is a
//! full replacement of up to `limit` levels per side; there is no
//! incremental patching and no sequence reconciliation, the latest frame
//! always wins.

mod aggregate;

pub use aggregate::normalize;

use serde::Serialize;

use crate::message::DepthUpdate;

/// A single normalized price level
///
/// `total = price * amount`. Levels built from unparseable text carry NaN
/// and are deliberately not filtered; renderers must treat non-finite
/// values as unusable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: f64,
    pub amount: f64,
    pub total: f64,
}

/// Normalized order book for a single instrument
#[derive(Debug, Clone, Serialize)]
pub struct Orderbook {
    pub instrument: String,
    /// Best-first (descending price), trusted from the source
    pub bids: Vec<PriceLevel>,
    /// Ascending price, re-sorted locally
    pub asks: Vec<PriceLevel>,
    /// Monotonically non-decreasing, observability only
    pub update_marker: u64,
}

impl Orderbook {
    pub fn new(instrument: &str) -> Self {
        Self {
            instrument: instrument.to_string(),
            bids: Vec::new(),
            asks: Vec::new(),
            update_marker: 0,
        }
    }

    /// Replace both sides from a depth frame
    pub fn apply(&mut self, update: &DepthUpdate, limit: usize) {
        let (bids, asks) = normalize(&update.bids, &update.asks, limit);
        self.bids = bids;
        self.asks = asks;
        if let Some(ts) = update.timestamp {
            self.update_marker = self.update_marker.max(ts);
        }
    }

    /// Best bid price, skipping non-finite levels
    pub fn best_bid(&self) -> Option<f64> {
        self.bids
            .iter()
            .map(|l| l.price)
            .find(|p| p.is_finite())
    }

    /// Best ask price, skipping non-finite levels
    pub fn best_ask(&self) -> Option<f64> {
        self.asks
            .iter()
            .map(|l| l.price)
            .find(|p| p.is_finite())
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DepthUpdate, StreamMessage};

    fn depth_update(raw: &str) -> DepthUpdate {
        match StreamMessage::parse(raw).unwrap() {
            StreamMessage::Depth(update) => update,
            _ => panic!("Expected depth"),
        }
    }

    #[test]
    fn test_apply_replaces_whole_book() {
        let mut book = Orderbook::new("btc_usdt");
        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt", "timestamp": 10,
                    "bids": [["100", "1"], ["99", "2"]], "asks": [["101", "1"]]}"#,
            ),
            20,
        );
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.update_marker, 10);

        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt", "timestamp": 11,
                    "bids": [["98", "5"]], "asks": []}"#,
            ),
            20,
        );
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].price, 98.0);
        assert!(book.asks.is_empty());
        assert_eq!(book.update_marker, 11);
    }

    #[test]
    fn test_update_marker_never_decreases() {
        let mut book = Orderbook::new("btc_usdt");
        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt", "timestamp": 20,
                    "bids": [["100", "1"]], "asks": [["101", "1"]]}"#,
            ),
            20,
        );
        // Late frame still replaces content but cannot roll the marker back.
        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt", "timestamp": 15,
                    "bids": [["100", "2"]], "asks": [["101", "2"]]}"#,
            ),
            20,
        );
        assert_eq!(book.update_marker, 20);
        assert_eq!(book.bids[0].amount, 2.0);
    }

    #[test]
    fn test_best_prices_and_mid() {
        let mut book = Orderbook::new("btc_usdt");
        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt",
                    "bids": [["100", "1"], ["99", "2"]],
                    "asks": [["102", "1"], ["101", "2"]]}"#,
            ),
            20,
        );
        assert_eq!(book.best_bid(), Some(100.0));
        assert_eq!(book.best_ask(), Some(101.0));
        assert_eq!(book.mid_price(), Some(100.5));
    }

    #[test]
    fn test_best_prices_skip_nan_levels() {
        let mut book = Orderbook::new("btc_usdt");
        book.apply(
            &depth_update(
                r#"{"type": "depth", "pair": "btc_usdt",
                    "bids": [["oops", "1"], ["99", "2"]],
                    "asks": [["101", "2"], ["bad", "1"]]}"#,
            ),
            20,
        );
        assert_eq!(book.best_bid(), Some(99.0));
        assert_eq!(book.best_ask(), Some(101.0));
    }

    #[test]
    fn test_empty_book_has_no_mid() {
        let book = Orderbook::new("btc_usdt");
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.mid_price(), None);
    }
}
