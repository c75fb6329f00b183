//! Command line configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    carts::{OwnerId, QuantityPolicy},
    config::observability::LoggingConfig,
    discounts::DiscountRounding,
    pricing::{PriceSource, PricingConfig},
    products::ProductId,
};

pub mod observability;

/// Trolley cart CLI configuration
#[derive(Debug, Parser)]
#[command(name = "trolley", about = "Shopping cart with coupon pricing", long_about = None)]
pub struct Cli {
    /// Storage and fixture settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Pricing policy overrides.
    #[command(flatten)]
    pub pricing: PricingOverrides,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Cart command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Where carts, catalog and coupons come from.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// JSON file holding saved carts
    #[arg(long, env = "TROLLEY_STATE", default_value = ".trolley/carts.json", global = true)]
    pub state: PathBuf,

    /// Fixture base directory
    #[arg(long, env = "TROLLEY_FIXTURES", default_value = "./fixtures", global = true)]
    pub fixtures: PathBuf,

    /// Product and coupon fixture set
    #[arg(long, env = "TROLLEY_SET", default_value = "demo", global = true)]
    pub set: String,

    /// Pricing configuration fixture; defaults apply when omitted
    #[arg(long, env = "TROLLEY_CONFIG", global = true)]
    pub config: Option<String>,

    /// Cart owner; the anonymous cart is used when omitted
    #[arg(long, env = "TROLLEY_OWNER", global = true)]
    pub owner: Option<String>,
}

impl StoreConfig {
    /// Owner id, if one was given.
    pub fn owner_id(&self) -> Option<OwnerId> {
        self.owner.as_deref().map(OwnerId::new)
    }
}

/// Pricing policies that take precedence over the loaded configuration.
#[derive(Debug, Default, Args, PartialEq, Eq)]
pub struct PricingOverrides {
    /// What `set` does with a zero or negative quantity
    #[arg(long, env = "TROLLEY_QUANTITY_POLICY", value_enum, global = true)]
    pub quantity_policy: Option<QuantityPolicy>,

    /// Unit prices captured at add time or read live from the catalog
    #[arg(long, env = "TROLLEY_PRICE_SOURCE", value_enum, global = true)]
    pub price_source: Option<PriceSource>,

    /// Rounding of percentage discounts
    #[arg(long, env = "TROLLEY_ROUNDING", value_enum, global = true)]
    pub rounding: Option<DiscountRounding>,
}

impl PricingOverrides {
    /// Apply the given overrides on top of `config`.
    pub fn apply(&self, config: PricingConfig) -> PricingConfig {
        PricingConfig {
            quantity_policy: self.quantity_policy.unwrap_or(config.quantity_policy),
            price_source: self.price_source.unwrap_or(config.price_source),
            rounding: self.rounding.unwrap_or(config.rounding),
            ..config
        }
    }
}

/// Cart commands.
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Show the cart
    Show,

    /// Add a product
    Add {
        /// Product id
        product: u64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Set the quantity of a product already in the cart
    Set {
        /// Product id
        product: u64,

        /// New quantity; zero or less removes the item unless the config rejects it
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove a product
    Remove {
        /// Product id
        product: u64,
    },

    /// Apply a coupon code
    ApplyCoupon {
        /// Coupon code, case-insensitive
        code: String,
    },

    /// Remove the applied coupon
    RemoveCoupon,

    /// Empty the cart without checking out
    Clear,

    /// List available coupons
    Coupons,

    /// Check out the cart
    Checkout,
}

impl Command {
    /// Product targeted by the command, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match *self {
            Command::Add { product, .. }
            | Command::Set { product, .. }
            | Command::Remove { product } => Some(ProductId(product)),
            _ => None,
        }
    }
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::config::observability::LogFormat;

    use super::*;

    #[test]
    fn defaults_apply_without_flags() -> TestResult {
        let cli = Cli::try_parse_from(["trolley", "show"])?;

        assert_eq!(cli.command, Command::Show);
        assert_eq!(cli.store.set, "demo");
        assert_eq!(cli.store.fixtures, PathBuf::from("./fixtures"));
        assert_eq!(cli.pricing, PricingOverrides::default());
        assert_eq!(
            cli.pricing.apply(PricingConfig::default()),
            PricingConfig::default()
        );

        Ok(())
    }

    #[test]
    fn global_flags_follow_subcommand() -> TestResult {
        let cli = Cli::try_parse_from([
            "trolley",
            "add",
            "3",
            "--quantity",
            "2",
            "--owner",
            "alice",
            "--log-format",
            "json",
        ])?;

        assert_eq!(
            cli.command,
            Command::Add {
                product: 3,
                quantity: 2
            }
        );
        assert_eq!(cli.store.owner_id(), Some(OwnerId::new("alice")));
        assert_eq!(cli.logging.log_format, LogFormat::Json);

        Ok(())
    }

    #[test]
    fn set_accepts_negative_quantity() -> TestResult {
        let cli = Cli::try_parse_from(["trolley", "set", "1", "-2"])?;

        assert_eq!(
            cli.command,
            Command::Set {
                product: 1,
                quantity: -2
            }
        );
        assert_eq!(cli.command.product_id(), Some(ProductId(1)));

        Ok(())
    }

    #[test]
    fn coupon_command_takes_code() -> TestResult {
        let cli = Cli::try_parse_from(["trolley", "apply-coupon", "save10"])?;

        assert_eq!(
            cli.command,
            Command::ApplyCoupon {
                code: "save10".to_string()
            }
        );
        assert_eq!(cli.command.product_id(), None);

        Ok(())
    }

    #[test]
    fn pricing_flags_override_loaded_config() -> TestResult {
        let cli = Cli::try_parse_from([
            "trolley",
            "set",
            "1",
            "0",
            "--quantity-policy",
            "reject",
            "--price-source",
            "live",
            "--rounding",
            "half-even",
        ])?;

        let config = cli.pricing.apply(PricingConfig::default());

        assert_eq!(config.quantity_policy, QuantityPolicy::Reject);
        assert_eq!(config.price_source, PriceSource::Live);
        assert_eq!(config.rounding, DiscountRounding::HalfEven);
        assert_eq!(config.shipping, PricingConfig::default().shipping);

        Ok(())
    }

    #[test]
    fn clear_command_parses() -> TestResult {
        let cli = Cli::try_parse_from(["trolley", "clear", "--owner", "bob"])?;

        assert_eq!(cli.command, Command::Clear);
        assert_eq!(cli.command.product_id(), None);

        Ok(())
    }
}
