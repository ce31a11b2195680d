//! Cart Store
//!
//! The authoritative in-session list of items a customer intends to buy.
//! Every operation is synchronous and infallible; prices are derived on read.

use super::models::{CartLine, NewCartLine};
use crate::pricing::{Amount, Coupon, DeliveryMethod, PricingPolicy, Quote};
use serde::Serialize;

/// Ordered collection of cart lines, at most one per product id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartStore {
    lines: Vec<CartLine>,
    coupon: Option<Coupon>,
}

impl CartStore {
    /// Creates an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, merging with an existing line for the same product id.
    ///
    /// A descriptor with an explicit quantity of zero changes nothing.
    pub fn add_item(&mut self, item: NewCartLine) {
        let quantity = item.quantity.unwrap_or(1);
        if quantity == 0 {
            return;
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }

        self.lines.push(CartLine {
            product_id: item.product_id,
            title: item.title,
            unit_price: item.unit_price,
            quantity,
            image: item.image,
            category: item.category,
            brand: item.brand,
        });
    }

    /// Merges every descriptor in order
    pub fn add_items(&mut self, items: impl IntoIterator<Item = NewCartLine>) {
        for item in items {
            self.add_item(item);
        }
    }

    /// Removes the line for `product_id`; unknown ids are ignored
    pub fn remove_item(&mut self, product_id: &str) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Sets a line's quantity. Quantities below 1 remove the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);

        if quantity == 0 {
            self.remove_item(product_id);
        } else if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
    }

    /// Empties the cart and forgets any coupon
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon = None;
    }

    /// Takes ordered lines out of the cart.
    ///
    /// Each ordered quantity is subtracted from the live line with the same
    /// product id, so anything added after the order snapshot was taken stays.
    /// The coupon is spent by the order and dropped.
    pub fn remove_ordered(&mut self, ordered: &[CartLine]) {
        for line in ordered {
            if let Some(live) = self.line_mut(&line.product_id) {
                live.quantity = live.quantity.saturating_sub(line.quantity);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
        self.coupon = None;
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines (header badge)
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Discount of the redeemed coupon, if any
    pub fn discount(&self) -> Amount {
        self.coupon.as_ref().map_or(0, |c| c.amount)
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Replaces any previously redeemed coupon
    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
    }

    pub fn remove_coupon(&mut self) {
        self.coupon = None;
    }

    /// Sum of `unit_price × quantity` over all lines
    pub fn subtotal(&self) -> Amount {
        self.lines
            .iter()
            .fold(0, |acc: Amount, line| acc.saturating_add(line.line_total()))
    }

    /// Full priced breakdown for the given delivery choice
    pub fn quote(&self, policy: &PricingPolicy, delivery: Option<DeliveryMethod>) -> Quote {
        policy.quote(self.subtotal(), self.discount(), delivery)
    }

    /// Amount due: subtotal, tax and delivery (discount per policy)
    pub fn total(&self, policy: &PricingPolicy, delivery: Option<DeliveryMethod>) -> Amount {
        self.quote(policy, delivery).total
    }
}
