//! Checkout Models

use crate::{
    cart::models::CartLine,
    orders::models::{Order, PaymentMethod},
    pricing::{DeliveryMethod, Quote},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wizard step, numbered 1 to 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Delivery,
    Payment,
    Confirmation,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Self::Delivery => 1,
            Self::Payment => 2,
            Self::Confirmation => 3,
        }
    }

    /// Following step; the confirmation step is last.
    pub fn next(self) -> Self {
        match self {
            Self::Delivery => Self::Payment,
            Self::Payment | Self::Confirmation => Self::Confirmation,
        }
    }

    /// Preceding step; the delivery step is first.
    pub fn previous(self) -> Self {
        match self {
            Self::Delivery | Self::Payment => Self::Delivery,
            Self::Confirmation => Self::Payment,
        }
    }
}

/// Where the order is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Province
    pub wilaya: String,
    pub street: String,
}

/// Choices made so far in the wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSelections {
    pub address: Option<DeliveryAddress>,
    pub delivery_method: Option<DeliveryMethod>,
    pub payment_method: Option<PaymentMethod>,
}

/// Everything needed to write an order, captured before the remote call
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub address: DeliveryAddress,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub quote: Quote,

    /// The cart lines the order covers
    pub lines: Vec<CartLine>,
}

/// Result of a successful checkout
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub order: Order,

    /// Messaging deep link to open for chat payments
    pub chat_link: Option<String>,
}

// =============================================================================
// HTTP Inputs & Responses
// =============================================================================

/// Input for `PUT /checkout/delivery`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInput {
    pub address: Option<DeliveryAddress>,
    pub delivery_method: Option<DeliveryMethod>,
}

/// Input for `PUT /checkout/payment`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub payment_method: Option<PaymentMethod>,
}

/// Wizard state with the current quote
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub step: u8,
    pub step_name: Step,
    pub selections: CheckoutSelections,
    pub quote: Quote,
}

/// Response of `POST /checkout/place`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub order_id: Uuid,
    pub reference: String,
    pub status: String,
    pub total: u64,

    /// Where the order confirmation view lives
    pub confirmation_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_link: Option<String>,
}

impl From<Confirmation> for ConfirmationResponse {
    fn from(confirmation: Confirmation) -> Self {
        let order = confirmation.order;

        Self {
            order_id: order.id,
            reference: order.reference(),
            status: order.status.to_string(),
            total: order.total_amount,
            confirmation_url: format!("/orders/{}", order.id),
            chat_link: confirmation.chat_link,
        }
    }
}
