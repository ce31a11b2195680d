//! Product Models

use crate::pricing::Amount;
use serde::{Deserialize, Serialize};

/// A catalogue product as stored by the persistence service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: Amount,

    #[serde(default)]
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Input for `PATCH /admin/products/:id/price`
#[derive(Debug, Deserialize)]
pub struct PriceUpdateInput {
    pub price: Amount,
}
