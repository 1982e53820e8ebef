//! Persistent side ledgers and the delta merge
//!
//! A ledger maps price → absolute quantity for one side of the book.
//! Incoming deltas replace the quantity at their price outright (the
//! upstream venue sends absolute level quantities, not increments); a delta
//! with quantity `<= 0` removes the level. Keys are `Price`, so a level can
//! never rest at a non-positive price and iteration order is structural
//! rather than a sort pass.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;
use types::book::{PriceLevel, Side};
use types::numeric::{Price, Quantity};

/// One canonical price-level delta after scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDelta {
    /// Level price.
    pub price: Decimal,
    /// Absolute replacement quantity; `<= 0` removes the level.
    pub quantity: Decimal,
}

impl LevelDelta {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// A batch of canonical deltas, one list per side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    pub bids: Vec<LevelDelta>,
    pub asks: Vec<LevelDelta>,
}

impl BookUpdate {
    /// Whether the update carries no deltas at all.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total number of deltas across both sides.
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}

/// Counts of what one merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Levels inserted or overwritten.
    pub upserts: usize,
    /// Levels removed by zero/negative quantities.
    pub removals: usize,
    /// Deltas rejected outright (non-positive price).
    pub rejected: usize,
}

impl MergeOutcome {
    /// Combine the outcomes of both sides of one update.
    pub fn combine(self, other: Self) -> Self {
        Self {
            upserts: self.upserts + other.upserts,
            removals: self.removals + other.removals,
            rejected: self.rejected + other.rejected,
        }
    }
}

/// One side of the book: price → absolute quantity.
#[derive(Debug, Clone)]
pub struct SideLedger {
    side: Side,
    levels: BTreeMap<Price, Quantity>,
}

impl SideLedger {
    /// Create an empty ledger for the given side.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Apply a batch of deltas.
    ///
    /// Within one batch, later deltas win over earlier ones at the same
    /// price. Applying the same batch twice with no intervening change
    /// leaves the ledger identical to applying it once.
    pub fn merge(&mut self, deltas: &[LevelDelta]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for delta in deltas {
            let Some(price) = Price::try_new(delta.price) else {
                debug!(
                    side = ?self.side,
                    price = %delta.price,
                    "Rejecting delta at non-positive price"
                );
                outcome.rejected += 1;
                continue;
            };

            if delta.quantity > Decimal::ZERO {
                if let Some(quantity) = Quantity::try_new(delta.quantity) {
                    self.levels.insert(price, quantity);
                    outcome.upserts += 1;
                }
            } else if self.levels.remove(&price).is_some() {
                outcome.removals += 1;
            }
        }

        outcome
    }

    /// Best level: highest price for bids, lowest for asks.
    pub fn best(&self) -> Option<PriceLevel> {
        let entry = match self.side {
            Side::Bid => self.levels.iter().next_back(),
            Side::Ask => self.levels.iter().next(),
        };
        entry.map(|(price, quantity)| PriceLevel::new(*price, *quantity))
    }

    /// All levels in consumption order: descending for bids (best first),
    /// ascending for asks (best first).
    pub fn levels(&self) -> Vec<PriceLevel> {
        match self.side {
            Side::Bid => self
                .levels
                .iter()
                .rev() // Descending for bids (best bid = highest price)
                .map(|(price, quantity)| PriceLevel::new(*price, *quantity))
                .collect(),
            Side::Ask => self
                .levels
                .iter()
                .map(|(price, quantity)| PriceLevel::new(*price, *quantity))
                .collect(),
        }
    }

    /// Number of levels currently resting.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Whether the ledger holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
