//! Fixed-point scaling of raw upstream values
//!
//! The venue encodes prices and quantities as integers scaled by a large
//! power of ten. The scaler divides each raw value by the configured
//! divisor and rounds half-away-from-zero to two decimal places, so every
//! canonical value downstream carries exactly two fractional digits.
//! Values that fail to parse are skipped level by level; one bad entry
//! never poisons the rest of its frame.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::feed::DepthFrame;
use crate::ledger::{BookUpdate, LevelDelta};

/// Decimal places every canonical price and quantity is rounded to.
pub const SCALE_DP: u32 = 2;

/// Divides raw fixed-point values down to canonical decimals.
#[derive(Debug, Clone)]
pub struct Scaler {
    price_divisor: Decimal,
    quantity_divisor: Decimal,
}

impl Scaler {
    /// Build a scaler from validated divisors.
    ///
    /// Divisors must be strictly positive; config validation guarantees
    /// this before a scaler is constructed.
    pub fn new(price_divisor: Decimal, quantity_divisor: Decimal) -> Self {
        assert!(price_divisor > Decimal::ZERO, "price divisor must be positive");
        assert!(
            quantity_divisor > Decimal::ZERO,
            "quantity divisor must be positive"
        );
        Self {
            price_divisor,
            quantity_divisor,
        }
    }

    /// Scale one raw price string. `None` if the value does not parse.
    pub fn scale_price(&self, raw: &str) -> Option<Decimal> {
        scale(raw, self.price_divisor)
    }

    /// Scale one raw quantity string. `None` if the value does not parse.
    pub fn scale_quantity(&self, raw: &str) -> Option<Decimal> {
        scale(raw, self.quantity_divisor)
    }

    /// Convert a depth frame into canonical deltas, preserving the
    /// upstream order of levels within each side.
    pub fn scale_update(&self, frame: &DepthFrame) -> BookUpdate {
        BookUpdate {
            bids: self.scale_side(&frame.bids),
            asks: self.scale_side(&frame.asks),
        }
    }

    fn scale_side(&self, raw_levels: &[(String, String)]) -> Vec<LevelDelta> {
        let mut deltas = Vec::with_capacity(raw_levels.len());
        for (raw_price, raw_quantity) in raw_levels {
            let (Some(price), Some(quantity)) = (
                self.scale_price(raw_price),
                self.scale_quantity(raw_quantity),
            ) else {
                debug!(
                    price = %raw_price,
                    quantity = %raw_quantity,
                    "Skipping level with unparseable raw value"
                );
                continue;
            };
            deltas.push(LevelDelta::new(price, quantity));
        }
        deltas
    }
}

fn scale(raw: &str, divisor: Decimal) -> Option<Decimal> {
    let value = raw.trim().parse::<Decimal>().ok()?;
    let scaled = value
        .checked_div(divisor)?
        .round_dp_with_strategy(SCALE_DP, RoundingStrategy::MidpointAwayFromZero);
    // rescale pads short fractions so "2" renders as "2.00" on the wire
    let mut canonical = scaled;
    canonical.rescale(SCALE_DP);
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEI: i64 = 1_000_000_000_000_000_000;

    fn make_scaler() -> Scaler {
        Scaler::new(Decimal::from(WEI), Decimal::from(WEI))
    }

    #[test]
    fn test_scales_raw_fixed_point_values() {
        let scaler = make_scaler();

        // 100 * 10^18 and 2 * 10^18 in raw form
        let price = scaler.scale_price("100000000000000000000").unwrap();
        let quantity = scaler.scale_quantity("2000000000000000000").unwrap();

        assert_eq!(price.to_string(), "100.00");
        assert_eq!(quantity.to_string(), "2.00");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let scaler = Scaler::new(Decimal::from(1000), Decimal::from(1000));

        assert_eq!(scaler.scale_price("100125").unwrap().to_string(), "100.13");
        assert_eq!(scaler.scale_price("100124").unwrap().to_string(), "100.12");
        assert_eq!(
            scaler.scale_quantity("-2005").unwrap().to_string(),
            "-2.01"
        );
    }

    #[test]
    fn test_negative_raw_values_keep_their_sign() {
        let scaler = make_scaler();

        let quantity = scaler.scale_quantity("-3000000000000000000").unwrap();
        assert_eq!(quantity.to_string(), "-3.00");
        assert!(quantity < Decimal::ZERO);
    }

    #[test]
    fn test_unparseable_raw_value_yields_none() {
        let scaler = make_scaler();

        assert!(scaler.scale_price("garbage").is_none());
        assert!(scaler.scale_price("").is_none());
        assert!(scaler.scale_quantity("1.2.3").is_none());
    }

    #[test]
    fn test_scale_update_preserves_order_and_skips_bad_levels() {
        let scaler = make_scaler();
        let frame = DepthFrame {
            stream_type: "book_depth".into(),
            product_id: 2,
            bids: vec![
                ("100000000000000000000".into(), "1500000000000000000".into()),
                ("not-a-number".into(), "1000000000000000000".into()),
                ("99000000000000000000".into(), "2000000000000000000".into()),
            ],
            asks: vec![(
                "101000000000000000000".into(),
                "500000000000000000".into(),
            )],
        };

        let update = scaler.scale_update(&frame);

        assert_eq!(update.bids.len(), 2);
        assert_eq!(update.bids[0].price.to_string(), "100.00");
        assert_eq!(update.bids[0].quantity.to_string(), "1.50");
        assert_eq!(update.bids[1].price.to_string(), "99.00");
        assert_eq!(update.asks.len(), 1);
        assert_eq!(update.asks[0].quantity.to_string(), "0.50");
    }

    #[test]
    fn test_zero_raw_quantity_scales_to_zero() {
        let scaler = make_scaler();

        let quantity = scaler.scale_quantity("0").unwrap();
        assert_eq!(quantity, Decimal::ZERO);
        assert_eq!(quantity.to_string(), "0.00");
    }

    #[test]
    fn test_tiny_raw_value_rounds_to_zero() {
        let scaler = make_scaler();

        // 10^15 raw is 0.001 scaled, which rounds to 0.00 and therefore
        // acts as a removal downstream
        let quantity = scaler.scale_quantity("1000000000000000").unwrap();
        assert_eq!(quantity, Decimal::ZERO);
    }
}
