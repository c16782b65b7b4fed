//! Risk and derivation engine
//!
//! Pure, side-effect-free functions behind the figures the dashboard
//! displays: unrealized P&L, liquidation price, an approximate funding
//! rate, and the countdown to the next funding timestamp.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// Fraction of initial margin treated as maintenance margin
pub const DEFAULT_MAINTENANCE_MARGIN_FACTOR: f64 = 0.9;

/// Base funding rate before the volatility adjustment
pub const BASE_FUNDING_RATE: f64 = 0.0001;

/// Absolute bound on the funding rate heuristic
pub const FUNDING_RATE_CAP: f64 = 0.0003;

/// UTC hours at which funding is exchanged
pub const FUNDING_HOURS: [u32; 3] = [0, 8, 16];

/// Unrealized P&L at the given mark price
pub fn pnl(side: Side, entry_price: f64, mark_price: f64, size: f64) -> f64 {
    match side {
        Side::Long => (mark_price - entry_price) * size,
        Side::Short => (entry_price - mark_price) * size,
    }
}

/// P&L relative to posted margin, in percent
pub fn pnl_percent(pnl: f64, margin: f64) -> f64 {
    if margin == 0.0 {
        return 0.0;
    }
    pnl / margin * 100.0
}

/// Estimated liquidation price with the default maintenance margin factor
pub fn liquidation_price(side: Side, entry_price: f64, leverage: f64) -> f64 {
    liquidation_price_with_factor(side, entry_price, leverage, DEFAULT_MAINTENANCE_MARGIN_FACTOR)
}

pub fn liquidation_price_with_factor(
    side: Side,
    entry_price: f64,
    leverage: f64,
    maintenance_margin_factor: f64,
) -> f64 {
    match side {
        Side::Long => entry_price * (1.0 - (1.0 / leverage) * maintenance_margin_factor),
        Side::Short => entry_price * (1.0 + (1.0 / leverage) * maintenance_margin_factor),
    }
}

/// Display-only funding rate approximation
///
/// Not a venue-reported rate: a base rate nudged by recent volatility and
/// clamped to the cap.
pub fn funding_rate_heuristic(price_change: f64, last_price: f64) -> f64 {
    let volatility = (price_change / last_price).abs();
    let adjustment = volatility * 0.2;
    let rate = if price_change > 0.0 {
        BASE_FUNDING_RATE + adjustment
    } else {
        BASE_FUNDING_RATE - adjustment
    };
    rate.max(-FUNDING_RATE_CAP).min(FUNDING_RATE_CAP)
}

/// Countdown to the next funding boundary, formatted `HH:MM:SS`
///
/// The boundary is the smallest funding hour strictly greater than the
/// current UTC hour, wrapping to next-day 00:00. Pure given `now`; callers
/// recompute every second.
pub fn next_funding_countdown(now: DateTime<Utc>) -> String {
    let hour = now.hour();
    let next_hour = FUNDING_HOURS
        .iter()
        .copied()
        .find(|h| *h > hour)
        .unwrap_or(24);

    let remaining = i64::from(next_hour) * 3600 - i64::from(now.num_seconds_from_midnight());
    format!(
        "{:02}:{:02}:{:02}",
        remaining / 3600,
        remaining % 3600 / 60,
        remaining % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pnl_sign_flips_with_side() {
        assert_eq!(pnl(Side::Long, 100.0, 110.0, 2.0), 20.0);
        assert_eq!(pnl(Side::Short, 100.0, 110.0, 2.0), -20.0);
        assert_eq!(pnl(Side::Long, 100.0, 90.0, 1.5), -15.0);
        assert_eq!(pnl(Side::Short, 100.0, 90.0, 1.5), 15.0);
    }

    #[test]
    fn test_pnl_percent() {
        assert_eq!(pnl_percent(50.0, 200.0), 25.0);
        assert_eq!(pnl_percent(-50.0, 200.0), -25.0);
        assert_eq!(pnl_percent(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_liquidation_price_at_10x() {
        assert!((liquidation_price(Side::Long, 100.0, 10.0) - 91.0).abs() < 1e-9);
        assert!((liquidation_price(Side::Short, 100.0, 10.0) - 109.0).abs() < 1e-9);
    }

    #[test]
    fn test_liquidation_price_custom_factor() {
        assert!(
            (liquidation_price_with_factor(Side::Long, 100.0, 4.0, 1.0) - 75.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_funding_rate_within_bounds() {
        let cases = [
            (0.0, 100.0),
            (0.5, 100.0),
            (-0.5, 100.0),
            (50.0, 100.0),
            (-50.0, 100.0),
            (1e12, 0.1),
            (-1e12, 0.1),
        ];
        for (change, last) in cases {
            let rate = funding_rate_heuristic(change, last);
            assert!(
                (-FUNDING_RATE_CAP..=FUNDING_RATE_CAP).contains(&rate),
                "rate {rate} out of bounds for change={change}, last={last}"
            );
        }
    }

    #[test]
    fn test_funding_rate_clamps_extreme_volatility() {
        assert_eq!(funding_rate_heuristic(50.0, 100.0), FUNDING_RATE_CAP);
        assert_eq!(funding_rate_heuristic(-50.0, 100.0), -FUNDING_RATE_CAP);
    }

    #[test]
    fn test_funding_rate_direction() {
        let up = funding_rate_heuristic(1.0, 1000.0);
        let down = funding_rate_heuristic(-1.0, 1000.0);
        assert!(up > BASE_FUNDING_RATE);
        assert!(down < BASE_FUNDING_RATE);
    }

    #[test]
    fn test_countdown_wraps_to_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
        assert_eq!(next_funding_countdown(now), "00:00:01");
    }

    #[test]
    fn test_countdown_to_morning_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        assert_eq!(next_funding_countdown(now), "01:00:00");
    }

    #[test]
    fn test_countdown_at_boundary_targets_next_one() {
        // Exactly 08:00 counts down a full eight hours to 16:00.
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(next_funding_countdown(now), "08:00:00");
    }

    #[test]
    fn test_countdown_mid_afternoon() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 15).unwrap();
        assert_eq!(next_funding_countdown(now), "07:29:45");
    }
}
