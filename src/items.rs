//! Items

use serde::{Deserialize, Serialize};

use crate::{prices::Price, products::ProductId};

/// One product-and-quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    product_id: ProductId,
    quantity: u32,
    unit_price: Price,
}

impl LineItem {
    /// Creates a new line item. Callers guarantee `quantity >= 1`.
    pub(crate) fn new(product_id: ProductId, quantity: u32, unit_price: Price) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns the product of the line item
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the quantity, always at least one
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price captured when the product was first added
    pub fn unit_price(&self) -> Price {
        self.unit_price
    }

    /// `quantity * unit_price`, `None` on overflow.
    pub fn line_subtotal(&self) -> Option<Price> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_subtotal_multiplies_quantity_by_unit_price() {
        let item = LineItem::new(ProductId(1), 2, Price::new(1099));

        assert_eq!(item.line_subtotal(), Some(Price::new(2198)));
    }

    #[test]
    fn line_subtotal_reports_overflow() {
        let item = LineItem::new(ProductId(1), u32::MAX, Price::new(i64::MAX));

        assert_eq!(item.line_subtotal(), None);
    }
}
