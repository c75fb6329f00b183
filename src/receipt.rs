//! Receipt
//!
//! Renders a priced cart as a table of line items followed by its totals.

use std::io;

use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    coupons::{Coupon, CouponDiscount},
    items::LineItem,
    pricing::{PricedCart, PricingEngine},
    products::Catalog,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Writing to the output failed.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),

    /// A line total does not fit in minor units.
    #[error("line total for product {0} overflowed")]
    Overflow(crate::products::ProductId),
}

/// Printable view of a priced cart.
#[derive(Debug)]
pub struct Receipt<'a> {
    priced: &'a PricedCart,
    engine: &'a PricingEngine,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for a priced cart, using the engine that priced it.
    pub fn new(priced: &'a PricedCart, engine: &'a PricingEngine) -> Self {
        Self { priced, engine }
    }

    /// Writes the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total overflows or the output cannot be written.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        catalog: &impl Catalog,
    ) -> Result<(), ReceiptError> {
        let cart = &self.priced.cart;

        writeln!(out, "Cart {}", cart.id())?;

        if cart.is_empty() {
            writeln!(out, "\n  (empty)\n")?;
        } else {
            let mut builder = Builder::default();

            builder.push_record(["", "Product", "Qty", "Unit Price", "Line Total"]);

            for (idx, item) in cart.items().iter().enumerate() {
                builder.push_record(self.item_row(idx, item, catalog)?);
            }

            let mut table = builder.build();
            let mut theme = Theme::from(Style::modern_rounded());
            let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

            theme.remove_horizontal_lines();
            theme.insert_horizontal_line(1, separator);

            table.with(theme);
            table.modify(Columns::new(2..5), Alignment::right());
            table.modify(Rows::first(), Alignment::center());

            writeln!(out, "\n{table}")?;
        }

        self.write_summary(&mut out)
    }

    fn item_row(
        &self,
        idx: usize,
        item: &LineItem,
        catalog: &impl Catalog,
    ) -> Result<[String; 5], ReceiptError> {
        let currency = self.engine.config().currency;
        let unit_price = self.engine.unit_price(item, catalog);
        let line_total = unit_price
            .checked_mul(item.quantity())
            .ok_or(ReceiptError::Overflow(item.product_id()))?;

        let name = catalog
            .find_product(item.product_id())
            .map_or_else(|| format!("Product {}", item.product_id()), |p| p.name.clone());

        Ok([
            format!("#{:<3}", idx + 1),
            name,
            item.quantity().to_string(),
            unit_price.to_money(currency).to_string(),
            line_total.to_money(currency).to_string(),
        ])
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let totals = &self.priced.totals;

        let discount_label = match &totals.applied_coupon {
            Some(code) => format!("Discount ({code}):"),
            None => "Discount:".to_string(),
        };

        let shipping = if totals.shipping.is_zero() && !self.priced.cart.is_empty() {
            "FREE".to_string()
        } else {
            totals.shipping.to_string()
        };

        let lines = [
            ("Items:".to_string(), totals.item_count.to_string()),
            ("Subtotal:".to_string(), totals.subtotal.to_string()),
            (discount_label, format!("-{}", totals.discount)),
            ("Shipping:".to_string(), shipping),
            ("Total:".to_string(), totals.total.to_string()),
        ];

        let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &lines {
            writeln!(out, " {label:<label_width$}  {value:>value_width$}")?;
        }

        if let Some(remaining) = &totals.free_shipping_remaining {
            writeln!(out, "\n Add {remaining} more for free shipping")?;
        }

        Ok(())
    }
}

/// Writes a table of coupons with their discount and minimum order.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_coupon_table(
    mut out: impl io::Write,
    coupons: &[&Coupon],
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    if coupons.is_empty() {
        writeln!(out, "No coupons available")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Code", "Discount", "Minimum Order", "Description"]);

    for coupon in coupons {
        let discount = match coupon.discount {
            CouponDiscount::Percentage(points) => format!("{}%", points.normalize()),
            CouponDiscount::Fixed(amount) => amount.to_money(currency).to_string(),
            CouponDiscount::FreeShipping => "Free shipping".to_string(),
        };

        let minimum = coupon
            .minimum_order
            .map_or_else(|| "-".to_string(), |m| m.to_money(currency).to_string());

        builder.push_record([
            coupon.code.to_string(),
            discount,
            minimum,
            coupon.description.clone().unwrap_or_default(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(1..3), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}
