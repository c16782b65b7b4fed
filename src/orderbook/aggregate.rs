//! Depth normalization
//!
//! Converts raw (price, amount) text pairs into display levels with a
//! per-level total, truncated to the configured limit.

use crate::message::parse_loose;

use super::PriceLevel;

fn to_level(pair: &[String; 2]) -> PriceLevel {
    let price = parse_loose(&pair[0]);
    let amount = parse_loose(&pair[1]);
    PriceLevel {
        price,
        amount,
        total: price * amount,
    }
}

/// Normalize both sides of a raw depth frame
///
/// Each side is truncated to the first `limit` entries as received. Asks
/// are then re-sorted ascending by price because the source has been
/// observed to deliver them out of order; bids are trusted to arrive
/// best-first and are left untouched. NaN-priced asks sort last.
pub fn normalize(
    raw_bids: &[[String; 2]],
    raw_asks: &[[String; 2]],
    limit: usize,
) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
    let bids: Vec<PriceLevel> = raw_bids.iter().take(limit).map(to_level).collect();

    let mut asks: Vec<PriceLevel> = raw_asks.iter().take(limit).map(to_level).collect();
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));

    (bids, asks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<[String; 2]> {
        raw.iter()
            .map(|(p, a)| [p.to_string(), a.to_string()])
            .collect()
    }

    #[test]
    fn test_asks_resorted_bids_kept_as_received() {
        let bids = pairs(&[("100", "1"), ("99", "2")]);
        let asks = pairs(&[("102", "1"), ("101", "2")]);

        let (bids, asks) = normalize(&bids, &asks, 2);

        assert_eq!(
            bids.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![100.0, 99.0]
        );
        assert_eq!(
            bids.iter().map(|l| l.total).collect::<Vec<_>>(),
            vec![100.0, 198.0]
        );
        assert_eq!(
            asks.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![101.0, 102.0]
        );
        assert_eq!(
            asks.iter().map(|l| l.total).collect::<Vec<_>>(),
            vec![202.0, 102.0]
        );
    }

    #[test]
    fn test_limit_applied_before_ask_sort() {
        // The third ask is the lowest but falls outside the limit, so it
        // must not appear even after sorting.
        let asks = pairs(&[("105", "1"), ("104", "1"), ("101", "1")]);
        let (_, asks) = normalize(&[], &asks, 2);
        assert_eq!(
            asks.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![104.0, 105.0]
        );
    }

    #[test]
    fn test_unparseable_text_becomes_nan_level() {
        let bids = pairs(&[("abc", "1"), ("99", "xyz")]);
        let (bids, _) = normalize(&bids, &[], 20);

        assert!(bids[0].price.is_nan());
        assert_eq!(bids[0].amount, 1.0);
        assert!(bids[0].total.is_nan());
        assert_eq!(bids[1].price, 99.0);
        assert!(bids[1].amount.is_nan());
    }

    #[test]
    fn test_nan_asks_sort_last() {
        let asks = pairs(&[("bad", "1"), ("102", "1"), ("101", "1")]);
        let (_, asks) = normalize(&[], &asks, 20);
        assert_eq!(asks[0].price, 101.0);
        assert_eq!(asks[1].price, 102.0);
        assert!(asks[2].price.is_nan());
    }

    #[test]
    fn test_empty_sides() {
        let (bids, asks) = normalize(&[], &[], 20);
        assert!(bids.is_empty());
        assert!(asks.is_empty());
    }
}
