//! Coupons

use std::fmt;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prices::Price;

/// Errors raised when building an invalid coupon.
#[derive(Debug, Error, PartialEq)]
pub enum CouponError {
    /// Percentage discounts must be within 0..=100.
    #[error("percentage discount must be between 0 and 100, got {0}")]
    PercentageOutOfRange(Decimal),

    /// Fixed discounts and minimum orders cannot be negative.
    #[error("coupon amount cannot be negative, got {0} minor units")]
    NegativeAmount(i64),

    /// Coupon codes cannot be blank.
    #[error("coupon code cannot be empty")]
    EmptyCode,
}

/// Case-insensitive coupon code, normalised to upper case without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalise a user supplied code.
    pub fn new(code: impl AsRef<str>) -> Self {
        CouponCode(code.as_ref().trim().to_uppercase())
    }

    /// The normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is blank after trimming.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CouponCode {
    fn from(value: String) -> Self {
        CouponCode::new(value)
    }
}

impl From<&str> for CouponCode {
    fn from(value: &str) -> Self {
        CouponCode::new(value)
    }
}

impl From<CouponCode> for String {
    fn from(value: CouponCode) -> Self {
        value.0
    }
}

/// The kind of reduction a coupon grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponDiscount {
    /// Percentage of the subtotal, in percentage points (`10` is 10%).
    Percentage(Decimal),

    /// Fixed amount off the subtotal, never more than the subtotal itself.
    Fixed(Price),

    /// Waives shipping, no monetary discount.
    FreeShipping,
}

impl CouponDiscount {
    /// Percentage discount, validated to lie within 0..=100.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::PercentageOutOfRange`] outside that range.
    pub fn percentage(points: Decimal) -> Result<Self, CouponError> {
        if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(CouponError::PercentageOutOfRange(points));
        }

        Ok(CouponDiscount::Percentage(points))
    }

    /// Fixed amount discount.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::NegativeAmount`] for a negative amount.
    pub fn fixed(amount: Price) -> Result<Self, CouponError> {
        if *amount < 0 {
            return Err(CouponError::NegativeAmount(*amount));
        }

        Ok(CouponDiscount::Fixed(amount))
    }
}

/// Coupon reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    /// Lookup code
    pub code: CouponCode,

    /// Human readable description
    pub description: Option<String>,

    /// Discount granted
    pub discount: CouponDiscount,

    /// Subtotal floor required for the coupon to take effect
    pub minimum_order: Option<Price>,

    /// Inactive coupons cannot be found or applied
    pub is_active: bool,
}

impl Coupon {
    /// Create an active coupon with no minimum order.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::EmptyCode`] when the code is blank.
    pub fn new(code: impl Into<CouponCode>, discount: CouponDiscount) -> Result<Self, CouponError> {
        let code = code.into();

        if code.is_empty() {
            return Err(CouponError::EmptyCode);
        }

        Ok(Self {
            code,
            description: None,
            discount,
            minimum_order: None,
            is_active: true,
        })
    }

    /// Require a minimum subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::NegativeAmount`] for a negative minimum.
    pub fn with_minimum_order(mut self, minimum: Price) -> Result<Self, CouponError> {
        if *minimum < 0 {
            return Err(CouponError::NegativeAmount(*minimum));
        }

        self.minimum_order = Some(minimum);

        Ok(self)
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the coupon as inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Whether `subtotal` satisfies the minimum order, if any.
    pub fn meets_minimum(&self, subtotal: Price) -> bool {
        self.minimum_order.is_none_or(|minimum| subtotal >= minimum)
    }
}

/// Coupon lookup supplied by the coupon collaborator.
pub trait CouponBook {
    /// Find an active coupon by code. Inactive coupons are never returned.
    fn find_active_coupon(&self, code: &CouponCode) -> Option<&Coupon>;

    /// All active coupons, ordered by code.
    fn active_coupons(&self) -> Vec<&Coupon>;
}

/// Coupon book held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCoupons {
    coupons: FxHashMap<CouponCode, Coupon>,
}

impl InMemoryCoupons {
    /// Create an empty coupon book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a coupon, returning the previous entry.
    pub fn insert(&mut self, coupon: Coupon) -> Option<Coupon> {
        self.coupons.insert(coupon.code.clone(), coupon)
    }

    /// Activate or deactivate a coupon. Returns `false` for unknown codes.
    pub fn set_active(&mut self, code: &CouponCode, active: bool) -> bool {
        match self.coupons.get_mut(code) {
            Some(coupon) => {
                coupon.is_active = active;
                true
            }
            None => false,
        }
    }

    /// Number of coupons, active or not.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the book holds no coupons.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl CouponBook for InMemoryCoupons {
    fn find_active_coupon(&self, code: &CouponCode) -> Option<&Coupon> {
        self.coupons.get(code).filter(|coupon| coupon.is_active)
    }

    fn active_coupons(&self) -> Vec<&Coupon> {
        let mut active: Vec<&Coupon> = self.coupons.values().filter(|c| c.is_active).collect();

        active.sort_by(|a, b| a.code.cmp(&b.code));

        active
    }
}

impl FromIterator<Coupon> for InMemoryCoupons {
    fn from_iter<I: IntoIterator<Item = Coupon>>(iter: I) -> Self {
        Self {
            coupons: iter.into_iter().map(|c| (c.code.clone(), c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn codes_match_case_insensitively() {
        assert_eq!(CouponCode::new(" save10 "), CouponCode::new("SAVE10"));
        assert_eq!(CouponCode::new("Save10").as_str(), "SAVE10");
    }

    #[test]
    fn percentage_must_be_within_range() {
        assert!(CouponDiscount::percentage(Decimal::new(10, 0)).is_ok());
        assert_eq!(
            CouponDiscount::percentage(Decimal::new(101, 0)),
            Err(CouponError::PercentageOutOfRange(Decimal::new(101, 0)))
        );
        assert!(CouponDiscount::percentage(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn fixed_rejects_negative_amounts() {
        assert_eq!(
            CouponDiscount::fixed(Price::new(-5)),
            Err(CouponError::NegativeAmount(-5))
        );
    }

    #[test]
    fn blank_code_is_rejected() {
        assert_eq!(
            Coupon::new("   ", CouponDiscount::FreeShipping),
            Err(CouponError::EmptyCode)
        );
    }

    #[test]
    fn inactive_coupons_are_invisible() -> TestResult {
        let mut book: InMemoryCoupons = [
            Coupon::new("save10", CouponDiscount::percentage(Decimal::TEN)?)?,
            Coupon::new("old", CouponDiscount::fixed(Price::new(500))?)?.inactive(),
        ]
        .into_iter()
        .collect();

        assert!(book.find_active_coupon(&"SAVE10".into()).is_some());
        assert!(book.find_active_coupon(&"OLD".into()).is_none());
        assert_eq!(book.active_coupons().len(), 1);

        assert!(book.set_active(&"old".into(), true));
        assert!(book.find_active_coupon(&"old".into()).is_some());

        Ok(())
    }

    #[test]
    fn meets_minimum_is_inclusive() -> TestResult {
        let coupon = Coupon::new("BIG", CouponDiscount::FreeShipping)?
            .with_minimum_order(Price::new(5000))?;

        assert!(!coupon.meets_minimum(Price::new(4999)));
        assert!(coupon.meets_minimum(Price::new(5000)));

        Ok(())
    }

    #[test]
    fn active_coupons_are_sorted_by_code() -> TestResult {
        let book: InMemoryCoupons = [
            Coupon::new("WELCOME5", CouponDiscount::fixed(Price::new(500))?)?,
            Coupon::new("BIGDEAL", CouponDiscount::percentage(Decimal::new(25, 0))?)?,
        ]
        .into_iter()
        .collect();

        let codes: Vec<&str> = book
            .active_coupons()
            .into_iter()
            .map(|c| c.code.as_str())
            .collect();

        assert_eq!(codes, ["BIGDEAL", "WELCOME5"]);

        Ok(())
    }
}
