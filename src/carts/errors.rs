//! Cart Errors

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{coupons::CouponCode, pricing::PricingError, products::ProductId};

/// Errors returned by cart operations. A failed operation leaves the cart unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Requested quantity is not a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The catalog has no such product.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart has no line item for the product.
    #[error("item {0} not found in cart")]
    ItemNotFound(ProductId),

    /// Unknown or inactive coupon code.
    #[error("invalid coupon code: {0}")]
    InvalidCoupon(CouponCode),

    /// The cart subtotal is below the coupon's minimum order.
    #[error("minimum order value of {minimum} required for coupon {code}")]
    MinimumOrderNotMet {
        /// Coupon that was rejected
        code: CouponCode,

        /// Required subtotal
        minimum: Money<'static, Currency>,
    },

    /// Checkout attempted with no line items.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// Totals could not be recomputed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
