//! External Collaborator Ports
//!
//! Traits for the hosted table store (orders, products, identity) and the
//! transactional email API. Adapters live in [`crate::adapters`] and map
//! their failures into the typed errors below.

use crate::{
    orders::models::{NewOrder, Order, OrderStatus},
    pricing::Amount,
    products::models::Product,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by the persistence service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Transport failure or rejected request
    #[error("{message}")]
    Request { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Response body did not match the expected shape
    #[error("unexpected response from store: {message}")]
    Decode { message: String },
}

impl PersistenceError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the email service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("email delivery failed: {message}")]
    Delivery { message: String },
}

impl NotificationError {
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// The authenticated customer, when there is one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Email template selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    OrderConfirmation,
    OrderShipped,
}

/// Payload of a transactional email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    pub recipient: String,
    pub name: String,
    pub order_id: Uuid,
    pub total: Amount,
}

impl EmailRequest {
    /// Builds the email for `order`, or `None` when it has no address
    pub fn for_order(kind: EmailKind, order: &Order) -> Option<Self> {
        let recipient = order.customer_email.clone()?;

        Some(Self {
            kind,
            recipient,
            name: order.customer_name.clone(),
            order_id: order.id,
            total: order.total_amount,
        })
    }
}

// =============================================================================
// Ports
// =============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts an order; the store assigns its id and creation time.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PersistenceError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, PersistenceError>;

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, PersistenceError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, PersistenceError>;

    async fn find_product(&self, id: &str) -> Result<Option<Product>, PersistenceError>;

    async fn update_product_price(
        &self,
        id: &str,
        price: Amount,
    ) -> Result<Product, PersistenceError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an access token; `None` token or unknown user yields `None`.
    async fn current_identity(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Identity>, PersistenceError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, request: &EmailRequest) -> Result<(), NotificationError>;
}

/// The set of collaborators the application is wired with
#[derive(Clone)]
pub struct Ports {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
}
