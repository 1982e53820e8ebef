//! Authoritative book state and immutable snapshots
//!
//! One `BookState` exists per process, owned by the upstream task. It
//! survives reconnects: levels only change through merged deltas, never
//! because the transport dropped. Everything outside the owning task sees
//! the book through `BookSnapshot`, a detached copy shaped exactly like
//! the wire payload.

use serde::{Deserialize, Serialize};
use types::book::{PriceLevel, Side};

use crate::ledger::{BookUpdate, MergeOutcome, SideLedger};

/// Immutable view of the book at one instant.
///
/// Bids are ordered best-first descending, asks best-first ascending.
/// Serializes directly into the downstream payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl BookSnapshot {
    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// The single authoritative order book.
#[derive(Debug, Clone)]
pub struct BookState {
    bids: SideLedger,
    asks: SideLedger,
}

impl BookState {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: SideLedger::new(Side::Bid),
            asks: SideLedger::new(Side::Ask),
        }
    }

    /// Merge one update into both sides and report the combined outcome.
    pub fn apply(&mut self, update: &BookUpdate) -> MergeOutcome {
        let bid_outcome = self.bids.merge(&update.bids);
        let ask_outcome = self.asks.merge(&update.asks);
        bid_outcome.combine(ask_outcome)
    }

    /// Detached copy of the current book, in wire order.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.levels(),
            asks: self.asks.levels(),
        }
    }

    /// Highest resting bid, if any.
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.best()
    }

    /// Lowest resting ask, if any.
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.best()
    }

    /// Resting level counts as (bids, asks).
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.depth(), self.asks.depth())
    }
}

impl Default for BookState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LevelDelta;
    use rust_decimal::Decimal;

    /// Build an update from (whole price, quantity in hundredths) pairs,
    /// canonicalized to two decimal places the way the scaler emits them.
    fn make_update(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> BookUpdate {
        let to_deltas = |side: &[(i64, i64)]| {
            side.iter()
                .map(|&(price, quantity_cents)| {
                    LevelDelta::new(
                        Decimal::new(price * 100, 2),
                        Decimal::new(quantity_cents, 2),
                    )
                })
                .collect()
        };
        BookUpdate {
            bids: to_deltas(bids),
            asks: to_deltas(asks),
        }
    }

    #[test]
    fn test_apply_updates_both_sides() {
        let mut book = BookState::new();
        let outcome = book.apply(&make_update(&[(100, 150), (99, 200)], &[(101, 50)]));

        assert_eq!(outcome.upserts, 3);
        assert_eq!(book.depth(), (2, 1));
    }

    #[test]
    fn test_best_bid_below_best_ask_after_updates() {
        let mut book = BookState::new();
        book.apply(&make_update(&[(99, 100), (100, 100)], &[(102, 100), (101, 100)]));

        assert_eq!(book.best_bid().unwrap().price.as_decimal(), Decimal::from(100));
        assert_eq!(book.best_ask().unwrap().price.as_decimal(), Decimal::from(101));
    }

    #[test]
    fn test_snapshot_orders_bids_descending_asks_ascending() {
        let mut book = BookState::new();
        book.apply(&make_update(
            &[(98, 100), (100, 100), (99, 100)],
            &[(103, 100), (101, 100), (102, 100)],
        ));

        let snapshot = book.snapshot();
        let bid_prices: Vec<_> = snapshot.bids.iter().map(|l| l.price.as_decimal()).collect();
        let ask_prices: Vec<_> = snapshot.asks.iter().map(|l| l.price.as_decimal()).collect();

        assert_eq!(
            bid_prices,
            vec![Decimal::from(100), Decimal::from(99), Decimal::from(98)]
        );
        assert_eq!(
            ask_prices,
            vec![Decimal::from(101), Decimal::from(102), Decimal::from(103)]
        );
    }

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let mut book = BookState::new();
        book.apply(&make_update(&[(100, 150)], &[]));

        let before = book.snapshot();
        book.apply(&make_update(&[(100, 0)], &[(101, 75)]));

        assert_eq!(before.bids.len(), 1);
        assert!(before.asks.is_empty());
        assert!(!before.is_empty());
        assert_eq!(book.depth(), (0, 1));
    }

    #[test]
    fn test_empty_snapshot_serializes_to_empty_arrays() {
        let snapshot = BookState::new().snapshot();
        assert!(snapshot.is_empty());

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"bids":[],"asks":[]}"#);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut book = BookState::new();
        book.apply(&make_update(&[(100, 150)], &[(101, 50)]));

        let json = serde_json::to_string(&book.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"bids":[{"price":"100.00","quantity":"1.50"}],"asks":[{"price":"101.00","quantity":"0.50"}]}"#
        );
    }
}
