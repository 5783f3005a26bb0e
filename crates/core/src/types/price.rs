//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are persisted as plain JSON numbers (`"price": 9.99`) so the stored
//! shapes stay compatible with existing clients, but all arithmetic happens on
//! [`Decimal`] so totals like `9.99 × 2` come out as exactly `19.98`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when constructing a negative [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("price cannot be negative: {0}")]
pub struct NegativePrice(pub Decimal);

/// A non-negative monetary amount in the store currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`NegativePrice`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, NegativePrice> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(NegativePrice(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0.normalize(), serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_is_exact() {
        let price = Price::from_cents(999);
        assert_eq!(price.times(2), Price::from_cents(1998));
    }

    #[test]
    fn test_rejects_negative() {
        assert!(Price::new(Decimal::new(-1, 2)).is_err());
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_json_is_a_number() {
        let json = serde_json::to_string(&Price::from_cents(1998)).unwrap();
        assert_eq!(json, "19.98");

        let parsed: Price = serde_json::from_str("24").unwrap();
        assert_eq!(parsed, Price::from_cents(2400));

        assert!(serde_json::from_str::<Price>("-3.5").is_err());
    }

    #[test]
    fn test_sum_and_display() {
        let total: Price = [Price::from_cents(150), Price::from_cents(275)]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "$4.25");
    }
}
