//! Order-book primitives
//!
//! The side marker and the price-level pair shared by every ledger and
//! snapshot in the relay.

use serde::{Deserialize, Serialize};

use crate::numeric::{Price, Quantity};

/// Side of the book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy side (bids)
    Bid,
    /// Sell side (asks)
    Ask,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// A single price level: a price with the absolute quantity resting at it.
///
/// A level only exists while its quantity is strictly positive; ledgers
/// remove levels rather than store them at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// The price of this level.
    pub price: Price,
    /// Absolute quantity resting at this price.
    pub quantity: Quantity,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}
