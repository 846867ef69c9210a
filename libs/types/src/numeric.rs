//! Fixed-point types for prices and quantities
//!
//! Prices use rust_decimal for deterministic arithmetic (no floating-point
//! errors — settlement math must be exact). Quantities are whole units of
//! goods and are plain non-negative integers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Limit price of an order, non-negative fixed-point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Try to create a price, returning None if negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a price from a whole number of currency units
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Total value of `quantity` units at this price
    pub fn notional(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.as_u64())
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s)?;
        Price::try_new(value).ok_or(rust_decimal::Error::LessThanMinimumPossibleValue)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole-unit quantity of goods
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    /// # Panics
    /// Panics on underflow; quantities never go negative
    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.checked_sub(rhs.0).expect("quantity underflow"))
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        *self = *self - rhs;
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_negative() {
        assert!(Price::try_new(Decimal::from(-1)).is_none());
        assert!("-5".parse::<Price>().is_err());
    }

    #[test]
    fn test_price_from_str_exact() {
        let p: Price = "50.25".parse().unwrap();
        assert_eq!(p.as_decimal(), Decimal::from_str_exact("50.25").unwrap());
    }

    #[test]
    fn test_price_ordering() {
        assert!(Price::from_u64(49) < Price::from_u64(50));
        assert_eq!(Price::from_u64(50), "50".parse().unwrap());
    }

    #[test]
    fn test_notional() {
        let p = Price::from_u64(50);
        assert_eq!(p.notional(Quantity::new(5)), Decimal::from(250));
    }

    #[test]
    fn test_quantity_arithmetic() {
        let mut q = Quantity::new(10);
        q -= Quantity::new(3);
        assert_eq!(q, Quantity::new(7));
        q += Quantity::new(1);
        assert_eq!(q.as_u64(), 8);
    }

    #[test]
    #[should_panic(expected = "quantity underflow")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::new(1) - Quantity::new(2);
    }

    #[test]
    fn test_quantity_min_picks_smaller() {
        assert_eq!(Quantity::new(5).min(Quantity::new(10)), Quantity::new(5));
    }

    #[test]
    fn test_price_serialization() {
        let p: Price = "3000.50".parse().unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Splitting an order into partial fills must cost exactly the
            // same as filling it whole.
            #[test]
            fn notional_is_additive(price in 0u64..1_000_000, a in 0u64..1_000_000, b in 0u64..1_000_000) {
                let p = Price::from_u64(price);
                let whole = p.notional(Quantity::new(a) + Quantity::new(b));
                let split = p.notional(Quantity::new(a)) + p.notional(Quantity::new(b));
                prop_assert_eq!(whole, split);
            }

            #[test]
            fn price_ordering_matches_decimal(a in 0u64..1_000_000, b in 0u64..1_000_000) {
                prop_assert_eq!(
                    Price::from_u64(a).cmp(&Price::from_u64(b)),
                    Decimal::from(a).cmp(&Decimal::from(b))
                );
            }
        }
    }
}
