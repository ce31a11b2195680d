//! Shopping Cart Domain Models
//!
//! This module contains all data structures related to the shopping cart
//! business domain.

use crate::pricing::{Amount, Quote};
use serde::{Deserialize, Serialize};

// =============================================================================
// Cart Domain Models
// =============================================================================

/// One purchasable entry in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product identifier, unique within a cart
    pub product_id: String,

    /// Display title
    pub title: String,

    /// Price of a single unit
    pub unit_price: Amount,

    /// Always at least 1
    pub quantity: u32,

    /// Image URL
    #[serde(default)]
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`
    pub fn line_total(&self) -> Amount {
        self.unit_price.saturating_mul(Amount::from(self.quantity))
    }
}

/// Item descriptor accepted by `add_item`. A missing quantity means one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCartLine {
    pub product_id: String,
    pub title: String,
    pub unit_price: Amount,

    #[serde(default)]
    pub quantity: Option<u32>,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,
}

impl NewCartLine {
    /// Creates a descriptor for one unit of a product
    pub fn new(product_id: impl Into<String>, title: impl Into<String>, unit_price: Amount) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            unit_price,
            quantity: None,
            image: String::new(),
            category: None,
            brand: None,
        }
    }

    /// Sets an explicit quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

// =============================================================================
// HTTP Inputs & Responses
// =============================================================================

/// Input for `POST /cart/items`
#[derive(Debug, Deserialize)]
pub struct AddToCartInput {
    /// Items to merge into the cart
    pub items: Vec<NewCartLine>,
}

/// Input for `PATCH /cart/items/:product_id`
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    /// New quantity; anything below 1 removes the line
    pub quantity: i64,
}

/// Input for `PUT /cart/coupon`
#[derive(Debug, Deserialize)]
pub struct CouponInput {
    pub code: String,
}

/// Cart contents with its priced summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,

    /// Sum of quantities across lines
    pub item_count: u32,

    /// Code of the redeemed coupon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,

    pub quote: Quote,
}
