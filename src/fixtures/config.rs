//! Pricing Configuration Fixtures

use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    carts::QuantityPolicy,
    discounts::DiscountRounding,
    fixtures::{
        FixtureError,
        products::{parse_currency, parse_price_in},
    },
    prices::Price,
    pricing::{PriceSource, PricingConfig},
    shipping::ShippingPolicy,
};

/// Pricing configuration in YAML. Omitted fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFixture {
    /// ISO currency code (e.g., "USD")
    pub currency: Option<String>,

    /// Shipping policy
    pub shipping: Option<ShippingFixture>,

    /// Rounding of percentage discounts
    pub rounding: Option<DiscountRounding>,

    /// Handling of non-positive quantities
    pub quantity_policy: Option<QuantityPolicy>,

    /// Unit price resolution
    pub price_source: Option<PriceSource>,
}

/// Shipping policy in YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ShippingFixture {
    /// Free strictly above `free_above`, otherwise `fee`
    Threshold {
        /// Threshold price (e.g., "100.00 USD")
        free_above: String,

        /// Fee price (e.g., "10.00 USD")
        fee: String,
    },

    /// Same fee for every non-empty cart
    Flat {
        /// Fee price
        fee: String,
    },

    /// Never charged
    Free,
}

impl ConfigFixture {
    /// Build a pricing configuration in `currency`, the currency of the loaded products.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount is malformed or a currency disagrees with `currency`.
    pub fn into_config(self, currency: &'static Currency) -> Result<PricingConfig, FixtureError> {
        if let Some(code) = &self.currency {
            let declared = parse_currency(code)?;

            if declared != currency {
                return Err(FixtureError::CurrencyMismatch(
                    currency.iso_alpha_code.to_string(),
                    declared.iso_alpha_code.to_string(),
                ));
            }
        }

        let defaults = PricingConfig::default();

        let shipping = match self.shipping {
            Some(ShippingFixture::Threshold { free_above, fee }) => ShippingPolicy::Threshold {
                free_above: fee_in(&free_above, currency)?,
                fee: fee_in(&fee, currency)?,
            },
            Some(ShippingFixture::Flat { fee }) => ShippingPolicy::Flat {
                fee: fee_in(&fee, currency)?,
            },
            Some(ShippingFixture::Free) => ShippingPolicy::Free,
            None => defaults.shipping,
        };

        Ok(PricingConfig {
            currency,
            shipping,
            rounding: self.rounding.unwrap_or(defaults.rounding),
            quantity_policy: self.quantity_policy.unwrap_or(defaults.quantity_policy),
            price_source: self.price_source.unwrap_or(defaults.price_source),
        })
    }
}

fn fee_in(s: &str, currency: &'static Currency) -> Result<Price, FixtureError> {
    let price = parse_price_in(s, currency)?;

    if *price < 0 {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    Ok(price)
}
