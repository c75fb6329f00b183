//! Shipping

use crate::prices::Price;

/// How shipping is charged for a non-empty cart. Empty carts never pay shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingPolicy {
    /// Free when the subtotal is strictly above `free_above`, otherwise `fee`.
    Threshold {
        /// Subtotal that must be exceeded for free shipping
        free_above: Price,

        /// Fee charged at or below the threshold
        fee: Price,
    },

    /// The same fee for every non-empty cart.
    Flat {
        /// Fee charged
        fee: Price,
    },

    /// Shipping is always free.
    Free,
}

impl Default for ShippingPolicy {
    /// Free over $100.00, otherwise $10.00.
    fn default() -> Self {
        ShippingPolicy::Threshold {
            free_above: Price::new(10_000),
            fee: Price::new(1_000),
        }
    }
}

impl ShippingPolicy {
    /// Shipping charge for a cart with the given (pre-discount) subtotal.
    pub fn shipping_for(&self, subtotal: Price) -> Price {
        if *subtotal <= 0 {
            return Price::ZERO;
        }

        match *self {
            ShippingPolicy::Threshold { free_above, fee } => {
                if subtotal > free_above {
                    Price::ZERO
                } else {
                    fee
                }
            }
            ShippingPolicy::Flat { fee } => fee,
            ShippingPolicy::Free => Price::ZERO,
        }
    }

    /// Smallest extra subtotal that makes shipping free under a threshold.
    ///
    /// `None` for empty carts, carts already past the threshold, and policies
    /// without one.
    pub fn free_shipping_remaining(&self, subtotal: Price) -> Option<Price> {
        match *self {
            ShippingPolicy::Threshold { free_above, .. }
                if *subtotal > 0 && subtotal <= free_above =>
            {
                free_above
                    .checked_sub(subtotal)?
                    .checked_add(Price::new(1))
            }
            _ => None,
        }
    }
}
