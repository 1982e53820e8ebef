//! Types library for the order-book relay
//!
//! This library provides the core type definitions shared across the relay,
//! ensuring type safety and deterministic decimal behavior.
//!
//! # Modules
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `book`: Order-book primitives (Side, PriceLevel)
//! - `errors`: Error taxonomy

// Public modules
pub mod book;
pub mod errors;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::book::*;
    pub use crate::errors::*;
    pub use crate::numeric::*;
}
