//! Prices

use std::ops::Deref;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// Represents a price in pence/cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price {
    value: i64,
}

impl Price {
    /// A zero price.
    pub const ZERO: Price = Price { value: 0 };

    /// Creates a new Price from minor units
    pub const fn new(value: i64) -> Self {
        Price { value }
    }

    /// Multiply by a line quantity, `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.value.checked_mul(i64::from(quantity)).map(Price::new)
    }

    /// Add two prices, `None` on overflow.
    pub fn checked_add(self, other: Price) -> Option<Self> {
        self.value.checked_add(other.value).map(Price::new)
    }

    /// Subtract another price, `None` on overflow.
    pub fn checked_sub(self, other: Price) -> Option<Self> {
        self.value.checked_sub(other.value).map(Price::new)
    }

    /// Whether this price is exactly zero.
    pub const fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Express this price as money in the given currency.
    pub fn to_money(self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.value, currency)
    }
}

impl Deref for Price {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Price::new(value)
    }
}
