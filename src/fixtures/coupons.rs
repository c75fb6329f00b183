//! Coupon Fixtures

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    coupons::{Coupon, CouponDiscount},
    fixtures::{FixtureError, products::parse_price_in},
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Map of coupon code -> coupon fixture
    pub coupons: FxHashMap<String, CouponFixture>,
}

/// Kind of coupon in a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is a percentage such as "10%"
    Percentage,

    /// `value` is a price such as "5.00 USD"
    Fixed,

    /// No `value`; waives shipping
    FreeShipping,
}

/// Coupon Fixture
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Coupon description
    #[serde(default)]
    pub description: Option<String>,

    /// Coupon kind
    #[serde(rename = "type")]
    pub kind: CouponKind,

    /// Discount value, required unless the coupon waives shipping
    #[serde(default)]
    pub value: Option<String>,

    /// Minimum order (e.g., "50.00 USD")
    #[serde(default)]
    pub minimum_order: Option<String>,

    /// Whether the coupon can be applied
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl CouponFixture {
    /// Build the coupon, checking every amount against the fixture set's currency.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is missing or malformed, or an amount is in
    /// another currency.
    pub fn into_coupon(
        self,
        code: &str,
        currency: &'static Currency,
    ) -> Result<Coupon, FixtureError> {
        let discount = match self.kind {
            CouponKind::Percentage => {
                let value = self.required_value(code)?;
                CouponDiscount::percentage(parse_percentage(value)?)?
            }
            CouponKind::Fixed => {
                let value = self.required_value(code)?;
                CouponDiscount::fixed(parse_price_in(value, currency)?)?
            }
            CouponKind::FreeShipping => CouponDiscount::FreeShipping,
        };

        let mut coupon = Coupon::new(code, discount)?;

        if let Some(minimum) = &self.minimum_order {
            coupon = coupon.with_minimum_order(parse_price_in(minimum, currency)?)?;
        }

        if let Some(description) = self.description {
            coupon = coupon.with_description(description);
        }

        if !self.active {
            coupon = coupon.inactive();
        }

        Ok(coupon)
    }

    fn required_value(&self, code: &str) -> Result<&str, FixtureError> {
        self.value
            .as_deref()
            .ok_or_else(|| FixtureError::MissingCouponValue(code.to_string()))
    }
}

/// Parse a percentage string (e.g., "15%" or "15") into percentage points.
///
/// # Errors
///
/// Returns an error if the string is not a decimal number.
pub fn parse_percentage(s: &str) -> Result<Decimal, FixtureError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    number
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))
}
