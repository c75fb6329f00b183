//! Carts service
//!
//! Runs each cart operation as load, mutate a copy, reprice, save. A failing
//! operation saves nothing, so the stored cart is either fully updated with
//! fresh totals or left exactly as it was.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    carts::{Cart, CartError, OwnerId},
    coupons::{Coupon, CouponBook},
    orders::{Order, OrderId, OrderSink, OrderSinkError},
    pricing::{PricedCart, PricingEngine},
    products::{Catalog, ProductId},
    repository::{CartRepository, RepositoryError},
};

/// Errors returned by [`CartService`].
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The operation was rejected by the cart rules.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Cart storage failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The order sink did not accept a checkout.
    #[error(transparent)]
    OrderSink(#[from] OrderSinkError),
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    /// Order handed to the sink
    pub order: Order,

    /// The cart after reset
    pub cart: PricedCart,
}

impl Checkout {
    /// Id of the placed order.
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }
}

/// Cart operations over injected storage, catalog, coupons and order sink.
#[derive(Debug)]
pub struct CartService<R, C, K, S> {
    repository: R,
    catalog: C,
    coupons: K,
    orders: S,
    engine: PricingEngine,
}

impl<R, C, K, S> CartService<R, C, K, S>
where
    R: CartRepository,
    C: Catalog,
    K: CouponBook,
    S: OrderSink,
{
    /// Assemble a service from its collaborators.
    pub fn new(repository: R, catalog: C, coupons: K, orders: S, engine: PricingEngine) -> Self {
        Self {
            repository,
            catalog,
            coupons,
            orders,
            engine,
        }
    }

    /// Pricing engine in use
    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Cart storage
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Product catalog
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Coupon book
    pub fn coupons(&self) -> &K {
        &self.coupons
    }

    /// Mutable coupon book, e.g. to deactivate a coupon
    pub fn coupons_mut(&mut self) -> &mut K {
        &mut self.coupons
    }

    /// Order sink
    pub fn orders(&self) -> &S {
        &self.orders
    }

    /// Current cart of an owner with fresh totals, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the totals overflow.
    pub fn view(&self, owner: Option<&OwnerId>) -> Result<PricedCart, CartServiceError> {
        let cart = self.repository.find_or_create(owner)?;

        self.priced(cart)
    }

    /// Add a product to the owner's cart.
    ///
    /// # Errors
    ///
    /// See [`Cart::add_item`]; also storage failures.
    pub fn add_item(
        &self,
        owner: Option<&OwnerId>,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<PricedCart, CartServiceError> {
        self.mutate(owner, "add_item", |cart| {
            cart.add_item(product_id, quantity, &self.catalog)
        })
    }

    /// Set the quantity of a line item, honouring the configured quantity policy.
    ///
    /// # Errors
    ///
    /// See [`Cart::set_quantity`]; also storage failures.
    pub fn set_quantity(
        &self,
        owner: Option<&OwnerId>,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<PricedCart, CartServiceError> {
        let policy = self.engine.config().quantity_policy;

        self.mutate(owner, "set_quantity", |cart| {
            cart.set_quantity(product_id, quantity, policy)
        })
    }

    /// Remove a line item.
    ///
    /// # Errors
    ///
    /// See [`Cart::remove_item`]; also storage failures.
    pub fn remove_item(
        &self,
        owner: Option<&OwnerId>,
        product_id: ProductId,
    ) -> Result<PricedCart, CartServiceError> {
        self.mutate(owner, "remove_item", |cart| cart.remove_item(product_id))
    }

    /// Apply a coupon code.
    ///
    /// # Errors
    ///
    /// See [`Cart::apply_coupon`]; also storage failures.
    pub fn apply_coupon(
        &self,
        owner: Option<&OwnerId>,
        code: &str,
    ) -> Result<PricedCart, CartServiceError> {
        self.mutate(owner, "apply_coupon", |cart| {
            cart.apply_coupon(code, &self.coupons, &self.engine, &self.catalog)
        })
    }

    /// Clear the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage fails.
    pub fn remove_coupon(&self, owner: Option<&OwnerId>) -> Result<PricedCart, CartServiceError> {
        self.mutate(owner, "remove_coupon", |cart| {
            cart.remove_coupon();
            Ok(())
        })
    }

    /// Empty the cart and drop its coupon without placing an order.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage fails.
    pub fn clear(&self, owner: Option<&OwnerId>) -> Result<PricedCart, CartServiceError> {
        self.mutate(owner, "clear", |cart| {
            cart.clear();
            Ok(())
        })
    }

    /// Active coupons, ordered by code.
    pub fn available_coupons(&self) -> Vec<&Coupon> {
        self.coupons.active_coupons()
    }

    /// Check out the owner's cart.
    ///
    /// The order is submitted to the sink first; the cart is reset and saved
    /// only once the sink accepts it.
    ///
    /// # Errors
    ///
    /// - [`CartError::EmptyCart`] when there is nothing to check out.
    /// - [`CartServiceError::OrderSink`] when the sink refuses the order; the
    ///   cart is left unchanged.
    pub fn checkout(&self, owner: Option<&OwnerId>) -> Result<Checkout, CartServiceError> {
        let cart = self.repository.find_or_create(owner)?;

        let (order_id, reset) = cart.checkout().inspect_err(|error| {
            warn!(cart = %cart.id(), %error, "checkout rejected");
        })?;

        let totals = self
            .engine
            .price(&cart, &self.catalog, &self.coupons)
            .map_err(CartError::from)?;

        let order = Order {
            id: order_id,
            cart_id: cart.id(),
            owner_id: cart.owner_id().cloned(),
            items: cart.items().to_vec(),
            totals,
            placed_at: reset.updated_at(),
        };

        self.orders.submit(&order).inspect_err(|error| {
            warn!(cart = %cart.id(), order = %order_id, %error, "order sink refused checkout");
        })?;

        self.repository.save(&reset)?;

        info!(
            cart = %cart.id(),
            order = %order_id,
            total = %order.totals.total,
            items = order.totals.item_count,
            "checkout completed"
        );

        Ok(Checkout {
            order,
            cart: self.priced(reset)?,
        })
    }

    fn mutate(
        &self,
        owner: Option<&OwnerId>,
        operation: &'static str,
        apply: impl FnOnce(&mut Cart) -> Result<(), CartError>,
    ) -> Result<PricedCart, CartServiceError> {
        let mut cart = self.repository.find_or_create(owner)?;

        let priced = apply(&mut cart)
            .and_then(|()| {
                self.engine
                    .price_cart(cart, &self.catalog, &self.coupons)
                    .map_err(CartError::from)
            })
            .inspect_err(|error| warn!(operation, %error, "cart operation rejected"))?;

        self.repository.save(&priced.cart)?;

        debug!(
            operation,
            cart = %priced.cart.id(),
            subtotal = %priced.totals.subtotal,
            discount = %priced.totals.discount,
            shipping = %priced.totals.shipping,
            total = %priced.totals.total,
            "cart repriced"
        );

        Ok(priced)
    }

    fn priced(&self, cart: Cart) -> Result<PricedCart, CartServiceError> {
        Ok(self
            .engine
            .price_cart(cart, &self.catalog, &self.coupons)
            .map_err(CartError::from)?)
    }
}
