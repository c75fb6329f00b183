//! Orders
//!
//! Checkout hands the priced cart to an [`OrderSink`]. The cart is only reset
//! once the sink has accepted the order.

use std::sync::Mutex;

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    carts::{CartId, OwnerId},
    items::LineItem,
    pricing::CartTotals,
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderId = TypedUuid<Order>;

/// Errors reported by an order sink.
#[derive(Debug, Error, PartialEq)]
pub enum OrderSinkError {
    /// The sink refused the order.
    #[error("order {0} rejected: {1}")]
    Rejected(OrderId, String),

    /// The sink could not be reached or its state is unusable.
    #[error("order sink unavailable: {0}")]
    Unavailable(String),
}

/// An order produced by checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Cart the order was placed from
    pub cart_id: CartId,

    /// Owner of that cart
    pub owner_id: Option<OwnerId>,

    /// Line items at the time of checkout
    pub items: Vec<LineItem>,

    /// Totals at the time of checkout
    pub totals: CartTotals,

    /// When checkout happened
    pub placed_at: Timestamp,
}

/// Acknowledgement returned by an order sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAck {
    /// Accepted order
    pub order_id: OrderId,
}

/// Downstream collaborator accepting checked-out orders.
#[cfg_attr(test, mockall::automock)]
pub trait OrderSink {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderSinkError`] when the order is not accepted.
    fn submit(&self, order: &Order) -> Result<OrderAck, OrderSinkError>;
}

/// Order sink that keeps every accepted order in memory.
#[derive(Debug, Default)]
pub struct RecordingOrderSink {
    orders: Mutex<Vec<Order>>,
}

impl RecordingOrderSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders accepted so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderSinkError::Unavailable`] if the store lock is poisoned.
    pub fn orders(&self) -> Result<Vec<Order>, OrderSinkError> {
        let orders = self
            .orders
            .lock()
            .map_err(|err| OrderSinkError::Unavailable(err.to_string()))?;

        Ok(orders.clone())
    }
}

impl OrderSink for RecordingOrderSink {
    fn submit(&self, order: &Order) -> Result<OrderAck, OrderSinkError> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|err| OrderSinkError::Unavailable(err.to_string()))?;

        orders.push(order.clone());

        Ok(OrderAck { order_id: order.id })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        carts::Cart, coupons::InMemoryCoupons, pricing::PricingEngine, products::InMemoryCatalog,
    };

    use super::*;

    fn order() -> Result<Order, crate::pricing::PricingError> {
        let cart = Cart::new(None);
        let totals = PricingEngine::default().price(
            &cart,
            &InMemoryCatalog::new(),
            &InMemoryCoupons::new(),
        )?;

        Ok(Order {
            id: OrderId::now_v7(),
            cart_id: cart.id(),
            owner_id: None,
            items: Vec::new(),
            totals,
            placed_at: Timestamp::now(),
        })
    }

    #[test]
    fn recording_sink_keeps_accepted_orders() -> TestResult {
        let sink = RecordingOrderSink::new();
        let order = order()?;

        let ack = sink.submit(&order)?;

        assert_eq!(ack.order_id, order.id);
        assert_eq!(sink.orders()?, vec![order]);

        Ok(())
    }
}
