//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    carts::{Cart, CartError, CartId, CartState, OwnerId, QuantityPolicy},
    coupons::{Coupon, CouponBook, CouponCode, CouponDiscount, CouponError, InMemoryCoupons},
    discounts::DiscountRounding,
    fixtures::{Fixture, FixtureError},
    items::LineItem,
    orders::{Order, OrderAck, OrderId, OrderSink, OrderSinkError, RecordingOrderSink},
    prices::Price,
    pricing::{CartTotals, PriceSource, PricedCart, PricingConfig, PricingEngine, PricingError},
    products::{Catalog, InMemoryCatalog, Product, ProductId},
    receipt::{Receipt, ReceiptError},
    repository::{
        CartRepository, InMemoryCartRepository, JsonFileCartRepository, RepositoryError,
    },
    service::{CartService, CartServiceError, Checkout},
    shipping::ShippingPolicy,
};
