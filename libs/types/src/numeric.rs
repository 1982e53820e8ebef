//! Fixed-point numeric types for prices and quantities
//!
//! Both types wrap `rust_decimal::Decimal` so all arithmetic is exact.
//! `Price` is strictly positive; `Quantity` is non-negative (zero exists as
//! a value but is never stored in a book ledger). Serialization is
//! transparent: both types appear on the wire as decimal strings.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::NumericError;

/// A strictly positive price.
///
/// Ordered consistently with its decimal value, so ledgers keyed by `Price`
/// iterate in ascending price order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, returning `None` unless the value is strictly positive.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Build a price from a whole number of currency units.
    ///
    /// Panics if `value` is zero; intended for literals and tests.
    pub fn from_u64(value: u64) -> Self {
        assert!(value > 0, "price must be strictly positive");
        Self(Decimal::from(value))
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl std::str::FromStr for Price {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .parse()
            .map_err(|_| NumericError::Unparseable(s.to_string()))?;
        Self::try_new(value).ok_or_else(|| NumericError::InvalidPrice(s.to_string()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative quantity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity, returning `None` if the value is negative.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The zero quantity.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether this quantity is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::str::FromStr for Quantity {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .parse()
            .map_err(|_| NumericError::Unparseable(s.to_string()))?;
        Self::try_new(value).ok_or_else(|| NumericError::InvalidQuantity(s.to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
