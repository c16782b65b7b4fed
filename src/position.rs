//! Simulated positions
//!
//! Opening, closing and reversing a position is local bookkeeping for the
//! dashboard, not a real order lifecycle. Every mark-price tick re-derives
//! mark price and unrealized P&L through the risk engine.

use serde::Serialize;
use tracing::info;

use crate::error::{MarketDataError, Result};
use crate::risk::{self, Side};

/// Maximum deviation of a limit price from the market price
pub const MAX_LIMIT_PRICE_DEVIATION: f64 = 0.2;

/// Maximum deviation of a take-profit/stop-loss trigger from the market price
pub const MAX_TRIGGER_PRICE_DEVIATION: f64 = 0.5;

/// Price a trigger is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceReference {
    Last,
    Mark,
}

/// Take-profit or stop-loss trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriggerPrice {
    pub price: f64,
    pub reference: PriceReference,
}

/// Order pricing mode for a simulated open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Limit,
    Market,
}

/// A simulated perpetual position
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: String,
    pub instrument: String,
    pub side: Side,
    pub size: f64,
    pub entry_price: f64,
    pub mark_price: f64,
    pub leverage: f64,
    pub margin: f64,
    pub liquidation_price: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
    pub take_profit: Option<TriggerPrice>,
    pub stop_loss: Option<TriggerPrice>,
}

/// Parameters for opening a simulated position
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub instrument: String,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price; ignored for market orders
    pub limit_price: Option<f64>,
    /// Current market price used for sizing and validation
    pub market_price: f64,
    pub margin: f64,
    pub leverage: f64,
    pub take_profit: Option<TriggerPrice>,
    pub stop_loss: Option<TriggerPrice>,
}

impl OpenRequest {
    fn entry_price(&self) -> f64 {
        match self.kind {
            OrderKind::Market => self.market_price,
            OrderKind::Limit => self.limit_price.unwrap_or(self.market_price),
        }
    }
}

/// Validate margin and limit pricing for an open request
///
/// Returns a user-facing message, never an error type; validation failures
/// are ordinary outcomes surfaced directly to the caller.
pub fn validate_order(
    kind: OrderKind,
    margin: f64,
    limit_price: Option<f64>,
    market_price: f64,
) -> Option<String> {
    if margin <= 0.0 {
        return Some("Margin must be greater than zero".to_string());
    }

    if kind == OrderKind::Limit {
        let price = limit_price.unwrap_or(market_price);
        if !(price > 0.0) {
            return Some("Limit price must be a valid positive number".to_string());
        }
        let deviation = (price - market_price).abs() / market_price;
        if deviation > MAX_LIMIT_PRICE_DEVIATION {
            return Some(format!(
                "Price is too far from market price ({market_price}). Maximum deviation is 20%."
            ));
        }
    }

    None
}

/// Validate take-profit/stop-loss ordering and distance from market
pub fn validate_tp_sl(
    side: Side,
    entry_price: f64,
    market_price: f64,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
) -> Option<String> {
    match side {
        Side::Long => {
            if let Some(tp) = take_profit {
                if tp <= entry_price {
                    return Some(
                        "Take profit must be higher than entry price for long positions"
                            .to_string(),
                    );
                }
            }
            if let Some(sl) = stop_loss {
                if sl >= entry_price {
                    return Some(
                        "Stop loss must be lower than entry price for long positions".to_string(),
                    );
                }
            }
        }
        Side::Short => {
            if let Some(tp) = take_profit {
                if tp >= entry_price {
                    return Some(
                        "Take profit must be lower than entry price for short positions"
                            .to_string(),
                    );
                }
            }
            if let Some(sl) = stop_loss {
                if sl <= entry_price {
                    return Some(
                        "Stop loss must be higher than entry price for short positions"
                            .to_string(),
                    );
                }
            }
        }
    }

    if let Some(tp) = take_profit {
        if (tp - market_price).abs() / market_price > MAX_TRIGGER_PRICE_DEVIATION {
            return Some(
                "Take profit is too far from market price. Maximum deviation is 50%.".to_string(),
            );
        }
    }
    if let Some(sl) = stop_loss {
        if (sl - market_price).abs() / market_price > MAX_TRIGGER_PRICE_DEVIATION {
            return Some(
                "Stop loss is too far from market price. Maximum deviation is 50%.".to_string(),
            );
        }
    }

    None
}

/// Book of simulated positions
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: Vec<Position>,
    seq: u64,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self, instrument: &str) -> String {
        self.seq += 1;
        format!("{}-{}", instrument, self.seq)
    }

    /// Open a position after validating the request
    pub fn open(&mut self, request: OpenRequest) -> Result<&Position> {
        if let Some(message) = validate_order(
            request.kind,
            request.margin,
            request.limit_price,
            request.market_price,
        ) {
            return Err(MarketDataError::Validation(message));
        }

        let entry_price = request.entry_price();
        if let Some(message) = validate_tp_sl(
            request.side,
            entry_price,
            request.market_price,
            request.take_profit.map(|t| t.price),
            request.stop_loss.map(|t| t.price),
        ) {
            return Err(MarketDataError::Validation(message));
        }

        let size = request.margin * request.leverage / entry_price;
        let id = self.next_id(&request.instrument);
        let position = Position {
            id,
            instrument: request.instrument,
            side: request.side,
            size,
            entry_price,
            mark_price: request.market_price,
            leverage: request.leverage,
            margin: request.margin,
            liquidation_price: risk::liquidation_price(request.side, entry_price, request.leverage),
            unrealized_pnl: 0.0,
            unrealized_pnl_percent: 0.0,
            take_profit: request.take_profit,
            stop_loss: request.stop_loss,
        };

        info!(
            id = %position.id,
            side = ?position.side,
            entry = position.entry_price,
            "Position opened"
        );
        self.positions.push(position);
        Ok(&self.positions[self.positions.len() - 1])
    }

    /// Re-derive mark price and P&L for every position on an instrument
    pub fn mark(&mut self, instrument: &str, mark_price: f64) {
        for position in self
            .positions
            .iter_mut()
            .filter(|p| p.instrument == instrument)
        {
            position.mark_price = mark_price;
            position.unrealized_pnl = risk::pnl(
                position.side,
                position.entry_price,
                mark_price,
                position.size,
            );
            position.unrealized_pnl_percent =
                risk::pnl_percent(position.unrealized_pnl, position.margin);
        }
    }

    /// Close a position, returning it for final display
    pub fn close(&mut self, id: &str) -> Option<Position> {
        let index = self.positions.iter().position(|p| p.id == id)?;
        let position = self.positions.remove(index);
        info!(id = %position.id, pnl = position.unrealized_pnl, "Position closed");
        Some(position)
    }

    /// Reverse a position at the current mark price
    ///
    /// Destroy and create as one step: the replacement takes the opposite
    /// side at the current mark with P&L reset and triggers cleared; size,
    /// leverage and margin carry over.
    pub fn reverse(&mut self, id: &str, mark_price: f64) -> Option<&Position> {
        let index = self.positions.iter().position(|p| p.id == id)?;
        let old = self.positions.remove(index);

        let side = old.side.opposite();
        let id = self.next_id(&old.instrument);
        let position = Position {
            id,
            instrument: old.instrument,
            side,
            size: old.size,
            entry_price: mark_price,
            mark_price,
            leverage: old.leverage,
            margin: old.margin,
            liquidation_price: risk::liquidation_price(side, mark_price, old.leverage),
            unrealized_pnl: 0.0,
            unrealized_pnl_percent: 0.0,
            take_profit: None,
            stop_loss: None,
        };

        info!(id = %position.id, side = ?position.side, "Position reversed");
        self.positions.push(position);
        self.positions.last()
    }

    /// Update triggers on an open position, validated against its prices
    pub fn set_tp_sl(
        &mut self,
        id: &str,
        take_profit: Option<TriggerPrice>,
        stop_loss: Option<TriggerPrice>,
    ) -> Result<()> {
        let position = self
            .positions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| MarketDataError::Validation(format!("Unknown position: {id}")))?;

        if let Some(message) = validate_tp_sl(
            position.side,
            position.entry_price,
            position.mark_price,
            take_profit.map(|t| t.price),
            stop_loss.map(|t| t.price),
        ) {
            return Err(MarketDataError::Validation(message));
        }

        position.take_profit = take_profit;
        position.stop_loss = stop_loss;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_open(side: Side) -> OpenRequest {
        OpenRequest {
            instrument: "btc_usdt".to_string(),
            side,
            kind: OrderKind::Market,
            limit_price: None,
            market_price: 100.0,
            margin: 200.0,
            leverage: 10.0,
            take_profit: None,
            stop_loss: None,
        }
    }

    #[test]
    fn test_open_sizes_by_notional() {
        let mut book = PositionBook::new();
        let position = book.open(market_open(Side::Long)).unwrap();
        // margin 200 at 10x = 2000 notional at price 100
        assert_eq!(position.size, 20.0);
        assert_eq!(position.entry_price, 100.0);
        assert!((position.liquidation_price - 91.0).abs() < 1e-9);
        assert_eq!(position.unrealized_pnl, 0.0);
    }

    #[test]
    fn test_open_rejects_zero_margin() {
        let mut book = PositionBook::new();
        let mut request = market_open(Side::Long);
        request.margin = 0.0;
        let err = book.open(request).unwrap_err();
        assert!(matches!(err, MarketDataError::Validation(_)));
        assert!(book.is_empty());
    }

    #[test]
    fn test_open_rejects_limit_price_deviation() {
        let mut book = PositionBook::new();
        let mut request = market_open(Side::Long);
        request.kind = OrderKind::Limit;
        request.limit_price = Some(130.0); // 30% above market
        assert!(book.open(request).is_err());

        let mut request = market_open(Side::Long);
        request.kind = OrderKind::Limit;
        request.limit_price = Some(115.0); // within 20%
        let position = book.open(request).unwrap();
        assert_eq!(position.entry_price, 115.0);
    }

    #[test]
    fn test_mark_updates_pnl() {
        let mut book = PositionBook::new();
        let id = book.open(market_open(Side::Long)).unwrap().id.clone();
        book.mark("btc_usdt", 110.0);

        let position = book.get(&id).unwrap();
        assert_eq!(position.mark_price, 110.0);
        assert_eq!(position.unrealized_pnl, 200.0); // (110-100) * 20
        assert_eq!(position.unrealized_pnl_percent, 100.0); // 200 / 200 margin

        // Other instruments are untouched.
        book.mark("eth_usdt", 9000.0);
        assert_eq!(book.get(&id).unwrap().mark_price, 110.0);
    }

    #[test]
    fn test_close_removes_position() {
        let mut book = PositionBook::new();
        let id = book.open(market_open(Side::Short)).unwrap().id.clone();
        let closed = book.close(&id).unwrap();
        assert_eq!(closed.id, id);
        assert!(book.is_empty());
        assert!(book.close(&id).is_none());
    }

    #[test]
    fn test_reverse_flips_side_and_resets() {
        let mut book = PositionBook::new();
        let mut request = market_open(Side::Long);
        request.take_profit = Some(TriggerPrice {
            price: 120.0,
            reference: PriceReference::Last,
        });
        let old_id = book.open(request).unwrap().id.clone();
        book.mark("btc_usdt", 110.0);

        let reversed = book.reverse(&old_id, 110.0).unwrap();
        assert_eq!(reversed.side, Side::Short);
        assert_eq!(reversed.entry_price, 110.0);
        assert_eq!(reversed.unrealized_pnl, 0.0);
        assert_eq!(reversed.unrealized_pnl_percent, 0.0);
        assert!(reversed.take_profit.is_none());
        assert!(reversed.stop_loss.is_none());
        assert_eq!(reversed.size, 20.0);
        assert!((reversed.liquidation_price - 110.0 * 1.09).abs() < 1e-9);

        assert_ne!(reversed.id, old_id);
        assert_eq!(book.len(), 1);
        assert!(book.get(&old_id).is_none());
    }

    #[test]
    fn test_tp_sl_ordering_by_side() {
        assert!(validate_tp_sl(Side::Long, 100.0, 100.0, Some(110.0), Some(95.0)).is_none());
        assert!(validate_tp_sl(Side::Long, 100.0, 100.0, Some(90.0), None).is_some());
        assert!(validate_tp_sl(Side::Long, 100.0, 100.0, None, Some(105.0)).is_some());
        assert!(validate_tp_sl(Side::Short, 100.0, 100.0, Some(90.0), Some(105.0)).is_none());
        assert!(validate_tp_sl(Side::Short, 100.0, 100.0, Some(110.0), None).is_some());
        assert!(validate_tp_sl(Side::Short, 100.0, 100.0, None, Some(95.0)).is_some());
    }

    #[test]
    fn test_tp_sl_distance_limit() {
        // Ordering is fine but 60% above market breaches the 50% bound.
        assert!(validate_tp_sl(Side::Long, 100.0, 100.0, Some(160.0), None).is_some());
        assert!(validate_tp_sl(Side::Short, 100.0, 100.0, None, Some(160.0)).is_some());
    }

    #[test]
    fn test_set_tp_sl_on_open_position() {
        let mut book = PositionBook::new();
        let id = book.open(market_open(Side::Long)).unwrap().id.clone();

        let tp = TriggerPrice {
            price: 120.0,
            reference: PriceReference::Mark,
        };
        book.set_tp_sl(&id, Some(tp), None).unwrap();
        assert_eq!(book.get(&id).unwrap().take_profit, Some(tp));

        let bad_sl = TriggerPrice {
            price: 150.0,
            reference: PriceReference::Last,
        };
        assert!(book.set_tp_sl(&id, None, Some(bad_sl)).is_err());
        // Failed update leaves the previous triggers in place.
        assert_eq!(book.get(&id).unwrap().take_profit, Some(tp));
    }
}
