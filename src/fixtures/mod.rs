//! Fixtures
//!
//! Catalogs, coupon books and pricing configuration loaded from YAML files
//! laid out as `<base>/products/<set>.yml`, `<base>/coupons/<set>.yml` and
//! `<base>/config/<set>.yml`.

use std::{fs, path::PathBuf};

use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    coupons::{CouponError, InMemoryCoupons},
    fixtures::{config::ConfigFixture, coupons::CouponsFixture, products::ProductsFixture},
    pricing::PricingConfig,
    products::InMemoryCatalog,
};

pub mod config;
pub mod coupons;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between fixture amounts
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Coupon value missing for a discounting coupon
    #[error("Coupon {0} is missing a value")]
    MissingCouponValue(String),

    /// Coupon data rejected by the coupon rules
    #[error("Invalid coupon: {0}")]
    InvalidCoupon(#[from] CouponError),

    /// Two coupon keys normalise to the same code
    #[error("Duplicate coupon code: {0}")]
    DuplicateCoupon(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    catalog: InMemoryCatalog,
    coupons: InMemoryCoupons,
    config: Option<PricingConfig>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: InMemoryCatalog::new(),
            coupons: InMemoryCoupons::new(),
            config: None,
            currency: None,
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (id, product_fixture) in fixture.products {
            let (product, currency) = product_fixture.into_product(id)?;

            match self.currency {
                Some(existing) if existing != currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => self.currency = Some(currency),
            }

            self.catalog.insert(product);
        }

        Ok(self)
    }

    /// Load coupons from a YAML fixture file. Products must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a coupon is
    /// invalid, or two coupons share a code.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let currency = self.currency()?;
        let fixture: CouponsFixture = self.read("coupons", name)?;

        for (code, coupon_fixture) in fixture.coupons {
            let coupon = coupon_fixture.into_coupon(&code, currency)?;

            if let Some(existing) = self.coupons.insert(coupon) {
                return Err(FixtureError::DuplicateCoupon(existing.code.to_string()));
            }
        }

        Ok(self)
    }

    /// Load pricing configuration from a YAML fixture file. Products must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an amount is invalid.
    pub fn load_config(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let currency = self.currency()?;
        let fixture: ConfigFixture = self.read("config", name)?;

        self.config = Some(fixture.into_config(currency)?);

        Ok(self)
    }

    /// Load a product and coupon set with the same name from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_products(name)?.load_coupons(name)?;

        Ok(fixture)
    }

    /// The loaded catalog
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    /// The loaded coupon book
    pub fn coupons(&self) -> &InMemoryCoupons {
        &self.coupons
    }

    /// Split the fixture into its catalog and coupon book.
    pub fn into_parts(self) -> (InMemoryCatalog, InMemoryCoupons) {
        (self.catalog, self.coupons)
    }

    /// Pricing configuration: the loaded one, or defaults in the products' currency.
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn pricing_config(&self) -> Result<PricingConfig, FixtureError> {
        if let Some(config) = self.config {
            return Ok(config);
        }

        Ok(PricingConfig {
            currency: self.currency()?,
            ..PricingConfig::default()
        })
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        category: &str,
        name: &str,
    ) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        coupons::{CouponBook, CouponCode},
        prices::Price,
        products::{Catalog, ProductId},
        shipping::ShippingPolicy,
    };

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_loads_demo_set() -> TestResult {
        let fixture = Fixture::from_set("demo")?;

        let widget = fixture
            .catalog()
            .find_product(ProductId(1))
            .ok_or("missing product 1")?;

        assert_eq!(widget.price, Price::new(1099));
        assert_eq!(fixture.currency()?, USD);

        for code in ["SAVE10", "WELCOME5", "SPEND50", "BIGDEAL", "FREESHIP"] {
            assert!(
                fixture.coupons().find_active_coupon(&CouponCode::new(code)).is_some(),
                "{code} should be active"
            );
        }

        Ok(())
    }

    #[test]
    fn fixture_loads_default_config() -> TestResult {
        let mut fixture = Fixture::new();

        fixture.load_products("demo")?.load_config("default")?;

        assert_eq!(fixture.pricing_config()?, PricingConfig::default());

        Ok(())
    }

    #[test]
    fn fixture_loads_strict_config() -> TestResult {
        let mut fixture = Fixture::new();

        fixture.load_products("demo")?.load_config("strict")?;

        let config = fixture.pricing_config()?;

        assert_eq!(
            config.shipping,
            ShippingPolicy::Flat {
                fee: Price::new(599)
            }
        );
        assert_eq!(config.quantity_policy, crate::carts::QuantityPolicy::Reject);
        assert_eq!(config.price_source, crate::pricing::PriceSource::Live);

        Ok(())
    }

    #[test]
    fn fixture_without_config_uses_product_currency() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "uk",
            "products:\n  7:\n    name: Tea\n    price: 2.50 GBP\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_products("uk")?;

        let config = fixture.pricing_config()?;

        assert_eq!(config.currency, GBP);
        assert_eq!(config.shipping, ShippingPolicy::default());

        Ok(())
    }

    #[test]
    fn fixture_load_products_rejects_currency_mismatch() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "usd_set",
            "products:\n  1:\n    name: Apple\n    price: 1.00 USD\n",
        )?;

        write_fixture(
            dir.path(),
            "products",
            "gbp_set",
            "products:\n  2:\n    name: Banana\n    price: 1.00 GBP\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        fixture.load_products("usd_set")?;

        let result = fixture.load_products("gbp_set");

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));

        Ok(())
    }

    #[test]
    fn coupon_codes_differing_only_in_case_are_duplicates() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "dupes",
            "products:\n  1:\n    name: Apple\n    price: 1.00 USD\n",
        )?;

        write_fixture(
            dir.path(),
            "coupons",
            "dupes",
            "coupons:\n  save10:\n    type: percentage\n    value: 10%\n  \
             SAVE10:\n    type: fixed\n    value: 99.00 USD\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_products("dupes")?;

        let result = fixture.load_coupons("dupes");

        assert!(
            matches!(&result, Err(FixtureError::DuplicateCoupon(code)) if code == "SAVE10"),
            "{result:?}"
        );

        Ok(())
    }

    #[test]
    fn reloading_a_coupon_set_reports_duplicates() -> TestResult {
        let mut fixture = Fixture::new();
        fixture.load_products("demo")?.load_coupons("demo")?;

        assert!(matches!(
            fixture.load_coupons("demo"),
            Err(FixtureError::DuplicateCoupon(_))
        ));

        Ok(())
    }

    #[test]
    fn coupons_require_products_first() {
        let mut fixture = Fixture::new();

        assert!(matches!(
            fixture.load_coupons("demo"),
            Err(FixtureError::NoCurrency)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut fixture = Fixture::with_base_path("./does-not-exist");

        assert!(matches!(
            fixture.load_products("demo"),
            Err(FixtureError::Io(_))
        ));
    }

    #[test]
    fn fixture_default_matches_new() {
        let fixture = Fixture::default();

        assert_eq!(fixture.base_path, PathBuf::from("./fixtures"));
        assert!(fixture.catalog().is_empty());
        assert!(fixture.coupons().is_empty());
    }
}
