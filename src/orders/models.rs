//! Order Models
//!
//! Orders are owned by the persistence service; checkout writes one and the
//! back-office updates its status.

use crate::pricing::Amount;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of an order: `pending → shipped | cancelled`, `shipped → delivered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether `next` follows `self` in the order lifecycle.
    /// Rewriting the current status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        self == next
            || matches!(
                (self, next),
                (Pending, Shipped) | (Pending, Cancelled) | (Shipped, Delivered)
            )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How status writes are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransitionPolicy {
    /// Any status may be written at any time (administrative override)
    #[default]
    Unconstrained,
    /// Only lifecycle transitions are accepted
    Strict,
}

/// Payment options offered at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    /// Payment arranged in a messaging conversation after the order is placed
    Chat,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order record as submitted to the persistence service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Province (wilaya) of the delivery address
    pub wilaya: String,
    pub address: String,
    pub total_amount: Amount,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,

    /// `None` for guest checkout
    pub user_id: Option<String>,
}

/// Order record as stored, with the fields the persistence service assigns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    pub wilaya: String,
    pub address: String,
    pub total_amount: Amount,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materializes a submitted order with its generated id and timestamp
    pub fn from_new(id: Uuid, order: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_email: order.customer_email,
            wilaya: order.wilaya,
            address: order.address,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: order.status,
            user_id: order.user_id,
            created_at,
        }
    }

    /// First eight characters of the id, as quoted to customers
    pub fn reference(&self) -> String {
        self.id.simple().to_string().chars().take(8).collect()
    }
}

/// Input for `PATCH /admin/orders/:id/status`
#[derive(Debug, Deserialize)]
pub struct StatusUpdateInput {
    pub status: OrderStatus,
}
