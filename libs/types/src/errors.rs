//! Error types for the relay's core domain
//!
//! Error taxonomy using thiserror

use thiserror::Error;

/// Numeric construction and parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Not a decimal number: {0}")]
    Unparseable(String),
}
