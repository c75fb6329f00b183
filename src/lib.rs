//! Trolley
//!
//! Trolley is a shopping cart aggregation and coupon pricing engine. Carts hold
//! line items and at most one coupon code; every total is derived from the
//! cart snapshot on demand and never stored.

pub mod carts;
pub mod config;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod logging;
pub mod orders;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod repository;
pub mod service;
pub mod shipping;
pub mod uuids;
