//! Carts
//!
//! The cart aggregate owns the ordered line items and the applied coupon code
//! for one owner, and guarantees at most one line item per product.
//!
//! Derived totals are never stored on the cart. They are produced by
//! [`PricingEngine`](crate::pricing::PricingEngine) after every mutation.

use std::fmt;

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    coupons::{CouponBook, CouponCode},
    items::LineItem,
    orders::OrderId,
    pricing::PricingEngine,
    products::{Catalog, ProductId},
    uuids::TypedUuid,
};

mod errors;

pub use errors::CartError;

/// Cart UUID
pub type CartId = TypedUuid<Cart>;

/// Opaque identifier of the user or session owning a cart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap an owner identifier.
    pub fn new(id: impl Into<String>) -> Self {
        OwnerId(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What `set_quantity` does with a zero or negative quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QuantityPolicy {
    /// Treat it as removal of the line item.
    #[default]
    Remove,

    /// Fail with [`CartError::InvalidQuantity`].
    Reject,
}

/// Lifecycle state of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// No line items.
    Empty,

    /// At least one line item.
    Active,
}

/// Cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    owner_id: Option<OwnerId>,
    items: Vec<LineItem>,
    coupon_code: Option<CouponCode>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Cart {
    /// Create an empty cart with a fresh id.
    pub fn new(owner_id: Option<OwnerId>) -> Self {
        let now = Timestamp::now();

        Self {
            id: CartId::now_v7(),
            owner_id,
            items: Vec::new(),
            coupon_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Cart id
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Owner, absent in single-tenant deployments
    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    /// Line items in insertion order
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line item for a product, if any
    pub fn item(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    /// Applied coupon code, re-resolved on every pricing
    pub fn coupon_code(&self) -> Option<&CouponCode> {
        self.coupon_code.as_ref()
    }

    /// Creation time
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Time of the last mutation
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Whether the cart has no line items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lifecycle state
    pub fn state(&self) -> CartState {
        if self.is_empty() {
            CartState::Empty
        } else {
            CartState::Active
        }
    }

    /// Add `quantity` of a product, merging into an existing line item.
    ///
    /// The unit price is captured from the catalog when the line item is first created.
    ///
    /// # Errors
    ///
    /// - [`CartError::ProductNotFound`]: the catalog has no such product.
    /// - [`CartError::InvalidQuantity`]: `quantity < 1`, or the merged quantity overflows.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        catalog: &impl Catalog,
    ) -> Result<(), CartError> {
        let product = catalog
            .find_product(product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;

        let quantity = positive_quantity(quantity)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id() == product_id)
        {
            let merged = existing
                .quantity()
                .checked_add(quantity)
                .ok_or(CartError::InvalidQuantity(i64::from(quantity)))?;

            existing.set_quantity(merged);
        } else {
            self.items
                .push(LineItem::new(product_id, quantity, product.price));
        }

        self.touch();

        Ok(())
    }

    /// Set the quantity of an existing line item exactly.
    ///
    /// # Errors
    ///
    /// - [`CartError::ItemNotFound`]: no line item for the product.
    /// - [`CartError::InvalidQuantity`]: non-positive quantity under
    ///   [`QuantityPolicy::Reject`], or a quantity too large to hold.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        policy: QuantityPolicy,
    ) -> Result<(), CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;

        if quantity <= 0 {
            return match policy {
                QuantityPolicy::Remove => {
                    self.items.remove(index);
                    self.touch();
                    Ok(())
                }
                QuantityPolicy::Reject => Err(CartError::InvalidQuantity(quantity)),
            };
        }

        let quantity = positive_quantity(quantity)?;

        if let Some(item) = self.items.get_mut(index) {
            item.set_quantity(quantity);
        }

        self.touch();

        Ok(())
    }

    /// Remove the line item for a product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] when there is no such line item.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;

        self.items.remove(index);
        self.touch();

        Ok(())
    }

    /// Apply a coupon code after checking it exists, is active, and that the
    /// current subtotal meets its minimum order.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidCoupon`]: unknown or inactive code.
    /// - [`CartError::MinimumOrderNotMet`]: subtotal below the coupon's minimum.
    /// - [`CartError::Pricing`]: the subtotal could not be computed.
    pub fn apply_coupon(
        &mut self,
        code: &str,
        coupons: &impl CouponBook,
        engine: &PricingEngine,
        catalog: &impl Catalog,
    ) -> Result<(), CartError> {
        let code = CouponCode::new(code);

        let coupon = coupons
            .find_active_coupon(&code)
            .ok_or_else(|| CartError::InvalidCoupon(code.clone()))?;

        let subtotal = engine.subtotal(&self.items, catalog)?;

        if let Some(minimum) = coupon.minimum_order
            && subtotal < minimum
        {
            return Err(CartError::MinimumOrderNotMet {
                code,
                minimum: minimum.to_money(engine.config().currency),
            });
        }

        self.coupon_code = Some(coupon.code.clone());
        self.touch();

        Ok(())
    }

    /// Clear the coupon reference. Never fails.
    pub fn remove_coupon(&mut self) {
        self.coupon_code = None;
        self.touch();
    }

    /// Drop every line item and the coupon without placing an order.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon_code = None;
        self.touch();
    }

    /// Produce an order id and the reset cart for a checkout.
    ///
    /// `self` is left untouched so the caller can keep it until the order has
    /// been accepted downstream.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] when there are no line items.
    pub fn checkout(&self) -> Result<(OrderId, Cart), CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let mut reset = self.clone();
        reset.clear();

        Ok((OrderId::now_v7(), reset))
    }

    /// Whether every line item has a positive quantity and no product appears twice.
    ///
    /// Always true for carts built through this API; used to vet snapshots
    /// read back from storage.
    pub fn is_consistent(&self) -> bool {
        let mut seen = FxHashSet::default();

        self.items
            .iter()
            .all(|item| item.quantity() >= 1 && seen.insert(item.product_id()))
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|i| i.product_id() == product_id)
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now().max(self.updated_at);
    }
}

fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    match u32::try_from(quantity) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(CartError::InvalidQuantity(quantity)),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use crate::{
        coupons::{Coupon, CouponDiscount, InMemoryCoupons},
        prices::Price,
        pricing::PricingConfig,
        products::{InMemoryCatalog, Product},
    };

    use super::*;

    fn catalog() -> InMemoryCatalog {
        [
            Product {
                id: ProductId(1),
                name: "Widget".to_string(),
                price: Price::new(1099),
            },
            Product {
                id: ProductId(2),
                name: "Gadget".to_string(),
                price: Price::new(4500),
            },
        ]
        .into_iter()
        .collect()
    }

    fn coupons() -> Result<InMemoryCoupons, crate::coupons::CouponError> {
        Ok([
            Coupon::new("SAVE10", CouponDiscount::percentage(Decimal::TEN)?)?,
            Coupon::new("SAVE10MIN", CouponDiscount::percentage(Decimal::TEN)?)?
                .with_minimum_order(Price::new(5000))?,
            Coupon::new("RETIRED", CouponDiscount::fixed(Price::new(500))?)?.inactive(),
        ]
        .into_iter()
        .collect())
    }

    #[test]
    fn new_cart_is_empty() {
        let cart = Cart::new(Some(OwnerId::new("user-1")));

        assert!(cart.is_empty());
        assert_eq!(cart.state(), CartState::Empty);
        assert_eq!(cart.owner_id().map(OwnerId::as_str), Some("user-1"));
        assert!(cart.coupon_code().is_none());
    }

    #[test]
    fn adding_same_product_merges_quantities() -> TestResult {
        let mut cart = Cart::new(None);

        cart.add_item(ProductId(1), 2, &catalog())?;
        cart.add_item(ProductId(1), 3, &catalog())?;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item(ProductId(1)).map(LineItem::quantity), Some(5));
        assert_eq!(cart.state(), CartState::Active);

        Ok(())
    }

    #[test]
    fn add_item_captures_catalog_price() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(2), 1, &catalog())?;

        assert_eq!(
            cart.item(ProductId(2)).map(LineItem::unit_price),
            Some(Price::new(4500))
        );

        Ok(())
    }

    #[test]
    fn add_item_unknown_product_fails_without_mutation() {
        let mut cart = Cart::new(None);
        let before = cart.clone();

        let result = cart.add_item(ProductId(99), 1, &catalog());

        assert_eq!(result, Err(CartError::ProductNotFound(ProductId(99))));
        assert_eq!(cart, before);
    }

    #[test]
    fn add_item_rejects_non_positive_quantity() {
        let mut cart = Cart::new(None);

        assert_eq!(
            cart.add_item(ProductId(1), 0, &catalog()),
            Err(CartError::InvalidQuantity(0))
        );
        assert_eq!(
            cart.add_item(ProductId(1), -3, &catalog()),
            Err(CartError::InvalidQuantity(-3))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn add_item_rejects_quantity_overflow() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), i64::from(u32::MAX), &catalog())?;

        assert!(matches!(
            cart.add_item(ProductId(1), 1, &catalog()),
            Err(CartError::InvalidQuantity(_))
        ));
        assert_eq!(cart.item(ProductId(1)).map(LineItem::quantity), Some(u32::MAX));

        Ok(())
    }

    #[test]
    fn set_quantity_is_not_additive() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;

        cart.set_quantity(ProductId(1), 7, QuantityPolicy::Remove)?;

        assert_eq!(cart.item(ProductId(1)).map(LineItem::quantity), Some(7));

        Ok(())
    }

    #[test]
    fn set_quantity_zero_removes_under_remove_policy() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;

        cart.set_quantity(ProductId(1), 0, QuantityPolicy::Remove)?;

        assert!(cart.item(ProductId(1)).is_none());
        assert_eq!(cart.state(), CartState::Empty);

        Ok(())
    }

    #[test]
    fn set_quantity_negative_fails_under_reject_policy() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;
        let before = cart.clone();

        let result = cart.set_quantity(ProductId(1), -1, QuantityPolicy::Reject);

        assert_eq!(result, Err(CartError::InvalidQuantity(-1)));
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn set_quantity_unknown_item_fails() {
        let mut cart = Cart::new(None);

        assert_eq!(
            cart.set_quantity(ProductId(1), 1, QuantityPolicy::Remove),
            Err(CartError::ItemNotFound(ProductId(1)))
        );
    }

    #[test]
    fn remove_item_deletes_only_that_product() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 1, &catalog())?;
        cart.add_item(ProductId(2), 1, &catalog())?;

        cart.remove_item(ProductId(1))?;

        assert!(cart.item(ProductId(1)).is_none());
        assert!(cart.item(ProductId(2)).is_some());
        assert_eq!(
            cart.remove_item(ProductId(1)),
            Err(CartError::ItemNotFound(ProductId(1)))
        );

        Ok(())
    }

    #[test]
    fn mutations_refresh_updated_at() -> TestResult {
        let mut cart = Cart::new(None);
        let created = cart.updated_at();

        cart.add_item(ProductId(1), 1, &catalog())?;

        assert!(cart.updated_at() >= created);
        assert_eq!(cart.created_at(), created);

        Ok(())
    }

    #[test]
    fn apply_coupon_stores_normalised_code() -> TestResult {
        let engine = PricingEngine::default();
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;

        cart.apply_coupon("save10", &coupons()?, &engine, &catalog())?;

        assert_eq!(cart.coupon_code(), Some(&CouponCode::new("SAVE10")));

        Ok(())
    }

    #[test]
    fn apply_coupon_rejects_unknown_and_inactive_codes() -> TestResult {
        let engine = PricingEngine::default();
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;

        assert_eq!(
            cart.apply_coupon("NOPE", &coupons()?, &engine, &catalog()),
            Err(CartError::InvalidCoupon(CouponCode::new("NOPE")))
        );
        assert_eq!(
            cart.apply_coupon("retired", &coupons()?, &engine, &catalog()),
            Err(CartError::InvalidCoupon(CouponCode::new("RETIRED")))
        );
        assert!(cart.coupon_code().is_none());

        Ok(())
    }

    #[test]
    fn apply_coupon_below_minimum_reports_minimum() -> TestResult {
        let engine = PricingEngine::new(PricingConfig::default());
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 2, &catalog())?;

        let result = cart.apply_coupon("SAVE10MIN", &coupons()?, &engine, &catalog());

        assert_eq!(
            result,
            Err(CartError::MinimumOrderNotMet {
                code: CouponCode::new("SAVE10MIN"),
                minimum: Money::from_minor(5000, iso::USD),
            })
        );
        assert!(
            result.is_err_and(|error| error.to_string().contains("$50.00")),
            "minimum missing from message"
        );
        assert!(cart.coupon_code().is_none());

        Ok(())
    }

    #[test]
    fn remove_coupon_without_coupon_is_noop() {
        let mut cart = Cart::new(None);

        cart.remove_coupon();

        assert!(cart.coupon_code().is_none());
    }

    #[test]
    fn checkout_returns_reset_cart_with_same_id() -> TestResult {
        let engine = PricingEngine::default();
        let mut cart = Cart::new(Some(OwnerId::new("u")));
        cart.add_item(ProductId(1), 2, &catalog())?;
        cart.apply_coupon("SAVE10", &coupons()?, &engine, &catalog())?;

        let (_order_id, reset) = cart.checkout()?;

        assert_eq!(reset.id(), cart.id());
        assert_eq!(reset.owner_id(), cart.owner_id());
        assert!(reset.is_empty());
        assert!(reset.coupon_code().is_none());
        assert!(!cart.is_empty(), "original snapshot must be untouched");

        Ok(())
    }

    #[test]
    fn clear_empties_items_and_coupon_but_keeps_identity() -> TestResult {
        let engine = PricingEngine::default();
        let mut cart = Cart::new(Some(OwnerId::new("u")));
        cart.add_item(ProductId(1), 2, &catalog())?;
        cart.add_item(ProductId(2), 1, &catalog())?;
        cart.apply_coupon("SAVE10", &coupons()?, &engine, &catalog())?;
        let before = cart.clone();

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.state(), CartState::Empty);
        assert!(cart.coupon_code().is_none());
        assert_eq!(cart.id(), before.id());
        assert_eq!(cart.owner_id(), before.owner_id());
        assert!(cart.updated_at() >= before.updated_at());

        Ok(())
    }

    #[test]
    fn clear_on_empty_cart_is_harmless() {
        let mut cart = Cart::new(None);

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.is_consistent());
    }

    #[test]
    fn checkout_of_empty_cart_fails() {
        let cart = Cart::new(None);

        assert!(matches!(cart.checkout(), Err(CartError::EmptyCart)));
    }

    #[test]
    fn checkout_order_ids_are_unique() -> TestResult {
        let mut cart = Cart::new(None);
        cart.add_item(ProductId(1), 1, &catalog())?;

        let (first, _) = cart.checkout()?;
        let (second, _) = cart.checkout()?;

        assert_ne!(first, second);

        Ok(())
    }
}
