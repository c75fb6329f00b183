//! Pricing
//!
//! A pure computation of cart totals from a cart snapshot, the catalog and the
//! coupon book. Inputs are never mutated and every output is recomputed from
//! scratch on each call.

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    carts::{Cart, QuantityPolicy},
    coupons::{CouponBook, CouponCode},
    discounts::{DiscountError, DiscountRounding, coupon_discount, waives_shipping},
    items::LineItem,
    prices::Price,
    products::Catalog,
    shipping::ShippingPolicy,
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// An intermediate amount does not fit in minor units.
    #[error("cart amount overflowed")]
    Overflow,

    /// Errors bubbled up from discount calculation.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Where the unit price of a line item comes from when pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// The price captured from the catalog when the line item was created.
    #[default]
    Captured,

    /// The catalog's current price, falling back to the captured price for
    /// products no longer in the catalog.
    Live,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingConfig {
    /// Currency of every amount
    pub currency: &'static Currency,

    /// Shipping charge rule
    pub shipping: ShippingPolicy,

    /// Rounding of percentage discounts
    pub rounding: DiscountRounding,

    /// Handling of non-positive `set_quantity` requests
    pub quantity_policy: QuantityPolicy,

    /// Unit price resolution
    pub price_source: PriceSource,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: iso::USD,
            shipping: ShippingPolicy::default(),
            rounding: DiscountRounding::default(),
            quantity_policy: QuantityPolicy::default(),
            price_source: PriceSource::default(),
        }
    }
}

/// Derived totals of a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartTotals {
    /// Sum of `quantity * unit price`
    pub subtotal: Money<'static, Currency>,

    /// Coupon discount, never more than the subtotal
    pub discount: Money<'static, Currency>,

    /// Shipping charge, zero for an empty cart
    pub shipping: Money<'static, Currency>,

    /// `max(0, subtotal - discount + shipping)`
    pub total: Money<'static, Currency>,

    /// Sum of quantities
    pub item_count: u64,

    /// Coupon that took effect, if the stored code resolved and its minimum was met
    pub applied_coupon: Option<CouponCode>,

    /// Extra subtotal needed for free shipping, while shipping is still charged
    pub free_shipping_remaining: Option<Money<'static, Currency>>,
}

/// A cart snapshot together with its freshly computed totals.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    /// Cart snapshot
    pub cart: Cart,

    /// Totals computed from that snapshot
    pub totals: CartTotals,
}

/// Pricing engine
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Calculate the subtotal of a list of line items.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the sum does not fit in minor units.
    pub fn subtotal(
        &self,
        items: &[LineItem],
        catalog: &impl Catalog,
    ) -> Result<Price, PricingError> {
        items.iter().try_fold(Price::ZERO, |acc, item| {
            self.unit_price(item, catalog)
                .checked_mul(item.quantity())
                .and_then(|line| acc.checked_add(line))
                .ok_or(PricingError::Overflow)
        })
    }

    /// Compute all totals of a cart.
    ///
    /// The stored coupon code is re-resolved against the coupon book, so a
    /// deactivated coupon or a subtotal that has fallen below the coupon's
    /// minimum order silently drops the discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if an amount overflows.
    pub fn price(
        &self,
        cart: &Cart,
        catalog: &impl Catalog,
        coupons: &impl CouponBook,
    ) -> Result<CartTotals, PricingError> {
        let subtotal = self.subtotal(cart.items(), catalog)?;

        let coupon = cart
            .coupon_code()
            .and_then(|code| coupons.find_active_coupon(code))
            .filter(|coupon| coupon.meets_minimum(subtotal));

        let discount = match coupon {
            Some(coupon) => coupon_discount(coupon, subtotal, self.config.rounding)?,
            None => Price::ZERO,
        };

        let shipping = if coupon.is_some_and(|coupon| waives_shipping(coupon, subtotal)) {
            Price::ZERO
        } else {
            self.config.shipping.shipping_for(subtotal)
        };

        let total = subtotal
            .checked_sub(discount)
            .and_then(|amount| amount.checked_add(shipping))
            .ok_or(PricingError::Overflow)?
            .max(Price::ZERO);

        let item_count = cart
            .items()
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum();

        let free_shipping_remaining = self
            .config
            .shipping
            .free_shipping_remaining(subtotal)
            .filter(|_| *shipping > 0);

        let currency = self.config.currency;

        Ok(CartTotals {
            subtotal: subtotal.to_money(currency),
            discount: discount.to_money(currency),
            shipping: shipping.to_money(currency),
            total: total.to_money(currency),
            item_count,
            applied_coupon: coupon.map(|coupon| coupon.code.clone()),
            free_shipping_remaining: free_shipping_remaining
                .map(|remaining| remaining.to_money(currency)),
        })
    }

    /// Price a cart and pair it with its totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if an amount overflows.
    pub fn price_cart(
        &self,
        cart: Cart,
        catalog: &impl Catalog,
        coupons: &impl CouponBook,
    ) -> Result<PricedCart, PricingError> {
        let totals = self.price(&cart, catalog, coupons)?;

        Ok(PricedCart { cart, totals })
    }

    /// Unit price of a line item under the configured [`PriceSource`].
    pub fn unit_price(&self, item: &LineItem, catalog: &impl Catalog) -> Price {
        match self.config.price_source {
            PriceSource::Captured => item.unit_price(),
            PriceSource::Live => catalog
                .find_product(item.product_id())
                .map_or(item.unit_price(), |product| product.price),
        }
    }
}
