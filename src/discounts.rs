//! Discounts

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    coupons::{Coupon, CouponDiscount},
    prices::Price,
};

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be represented in minor units.
    #[error("percentage discount overflowed minor units")]
    PercentConversion,
}

/// How a fractional percentage discount is rounded to minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRounding {
    /// Round half a cent away from zero (2.195 -> 2.20).
    #[default]
    HalfUp,

    /// Banker's rounding (2.185 -> 2.18).
    HalfEven,

    /// Truncate towards zero, never over-discounting.
    Down,
}

impl From<DiscountRounding> for RoundingStrategy {
    fn from(rounding: DiscountRounding) -> Self {
        match rounding {
            DiscountRounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            DiscountRounding::HalfEven => RoundingStrategy::MidpointNearestEven,
            DiscountRounding::Down => RoundingStrategy::ToZero,
        }
    }
}

/// Calculates the monetary discount a coupon grants on `subtotal`.
///
/// The result is zero when the subtotal is below the coupon's minimum order,
/// and never exceeds the subtotal.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if a percentage discount cannot
/// be represented in minor units.
pub fn coupon_discount(
    coupon: &Coupon,
    subtotal: Price,
    rounding: DiscountRounding,
) -> Result<Price, DiscountError> {
    if !coupon.meets_minimum(subtotal) || *subtotal <= 0 {
        return Ok(Price::ZERO);
    }

    let discount = match coupon.discount {
        CouponDiscount::Percentage(points) => {
            Price::new(percent_of_minor(points, *subtotal, rounding)?)
        }
        CouponDiscount::Fixed(amount) => amount,
        CouponDiscount::FreeShipping => Price::ZERO,
    };

    Ok(discount.clamp(Price::ZERO, subtotal))
}

/// Whether the coupon waives shipping for this subtotal.
pub fn waives_shipping(coupon: &Coupon, subtotal: Price) -> bool {
    matches!(coupon.discount, CouponDiscount::FreeShipping) && coupon.meets_minimum(subtotal)
}

/// Calculate `points`% of a minor unit amount, rounded back to minor units.
fn percent_of_minor(
    points: Decimal,
    minor: i64,
    rounding: DiscountRounding,
) -> Result<i64, DiscountError> {
    let Some(applied) = Decimal::from(minor).checked_mul(points) else {
        return Err(DiscountError::PercentConversion);
    };

    let Some(applied) = applied.checked_div(Decimal::ONE_HUNDRED) else {
        return Err(DiscountError::PercentConversion);
    };

    applied
        .round_dp_with_strategy(0, rounding.into())
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
