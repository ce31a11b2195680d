//! Order Placement
//!
//! Turns a cart and the wizard selections into a persisted order. The write
//! is attempted once; a failure leaves the cart and wizard untouched so the
//! customer can retry. The confirmation email is best-effort.

use super::{
    errors::CheckoutError,
    models::{Confirmation, Step, Submission},
    wizard::{validate_step, CheckoutWizard, ValidationErrors},
};
use crate::{
    cart::{models::CartLine, store::CartStore},
    orders::models::{NewOrder, Order, OrderStatus, PaymentMethod},
    ports::{EmailKind, EmailRequest, Identity, IdentityProvider, Notifier, OrderRepository},
    pricing::PricingPolicy,
};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Name recorded for customers who are not signed in or have no profile name
pub const GUEST_NAME: &str = "Client invité";

/// Phone recorded when none is known
pub const UNKNOWN_PHONE: &str = "Non renseigné";

/// Builds messaging deep links for chat payments
#[derive(Debug, Clone)]
pub struct ChatRedirect {
    base: String,
    phone: String,
}

impl ChatRedirect {
    /// Links of the form `https://wa.me/<phone>?text=...`
    pub fn new(phone: impl Into<String>) -> Self {
        Self::with_base("https://wa.me", phone)
    }

    pub fn with_base(base: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            phone: phone.into(),
        }
    }

    /// Pre-filled order confirmation message for `order` and its lines
    pub fn link_for(&self, order: &Order, lines: &[CartLine]) -> Result<Url, url::ParseError> {
        let message = format!(
            "Bonjour, je souhaite confirmer ma commande #{} ({}) d'un montant de {} DA.",
            order.reference(),
            item_summary(lines),
            order.total_amount
        );

        Url::parse_with_params(
            &format!("{}/{}", self.base.trim_end_matches('/'), self.phone),
            &[("text", message)],
        )
    }
}

pub struct CheckoutService {
    orders: Arc<dyn OrderRepository>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    pricing: PricingPolicy,
    chat: ChatRedirect,
}

impl CheckoutService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        pricing: PricingPolicy,
        chat: ChatRedirect,
    ) -> Self {
        Self {
            orders,
            identity,
            notifier,
            pricing,
            chat,
        }
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Snapshots what an order needs from the cart and the wizard.
    ///
    /// The wizard must be on the confirmation step and every earlier step
    /// must still validate.
    pub fn prepare(
        &self,
        cart: &CartStore,
        wizard: &CheckoutWizard,
    ) -> Result<Submission, CheckoutError> {
        if wizard.step() != Step::Confirmation {
            return Err(CheckoutError::NotReady {
                step: wizard.step(),
            });
        }

        let selections = wizard.selections();
        let (Some(address), Some(delivery_method), Some(payment_method)) = (
            selections.address.clone(),
            selections.delivery_method,
            selections.payment_method,
        ) else {
            let errors = [Step::Delivery, Step::Payment]
                .into_iter()
                .filter_map(|step| validate_step(step, selections).err())
                .fold(ValidationErrors::default(), ValidationErrors::merge);
            return Err(errors.into());
        };

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(Submission {
            quote: cart.quote(&self.pricing, Some(delivery_method)),
            lines: cart.lines().to_vec(),
            address,
            delivery_method,
            payment_method,
        })
    }

    /// Writes the order and notifies the customer.
    pub async fn place_order(
        &self,
        submission: Submission,
        token: Option<&str>,
    ) -> Result<Confirmation, CheckoutError> {
        let identity = self.resolve_identity(token).await;
        let new_order = build_order(&submission, identity.as_ref());

        let order = self
            .orders
            .insert_order(new_order)
            .await
            .map_err(|e| {
                warn!(error = %e, "order insert rejected");
                CheckoutError::Persistence(e)
            })?;

        info!(
            order_id = %order.id,
            total = order.total_amount,
            payment = %order.payment_method,
            delivery = %submission.delivery_method,
            guest = order.user_id.is_none(),
            "order placed"
        );

        let chat_link = match order.payment_method {
            PaymentMethod::Chat => self.chat_link(&order, &submission.lines),
            _ => None,
        };

        self.notify(EmailKind::OrderConfirmation, &order).await;

        Ok(Confirmation { order, chat_link })
    }

    /// Full checkout for a caller that owns the cart: prepare, place, then
    /// settle. Nothing leaves the cart unless the order was written.
    pub async fn checkout(
        &self,
        cart: &mut CartStore,
        wizard: &mut CheckoutWizard,
        token: Option<&str>,
    ) -> Result<Confirmation, CheckoutError> {
        let submission = self.prepare(cart, wizard)?;
        let ordered = submission.lines.clone();
        let confirmation = self.place_order(submission, token).await?;
        Self::complete(cart, wizard, &ordered);
        Ok(confirmation)
    }

    /// Post-success cleanup: the ordered lines leave the cart and the wizard
    /// starts over.
    pub fn complete(cart: &mut CartStore, wizard: &mut CheckoutWizard, ordered: &[CartLine]) {
        cart.remove_ordered(ordered);
        wizard.reset();
    }

    async fn resolve_identity(&self, token: Option<&str>) -> Option<Identity> {
        match self.identity.current_identity(token).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "identity lookup failed, continuing as guest");
                None
            }
        }
    }

    fn chat_link(&self, order: &Order, lines: &[CartLine]) -> Option<String> {
        match self.chat.link_for(order, lines) {
            Ok(url) => Some(url.into()),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "could not build chat link");
                None
            }
        }
    }

    async fn notify(&self, kind: EmailKind, order: &Order) {
        notify_best_effort(self.notifier.as_ref(), kind, order).await;
    }
}

/// Sends an order email if the order has an address. Failures are logged.
pub(crate) async fn notify_best_effort(notifier: &dyn Notifier, kind: EmailKind, order: &Order) {
    let Some(request) = EmailRequest::for_order(kind, order) else {
        return;
    };

    if let Err(e) = notifier.send_email(&request).await {
        warn!(order_id = %order.id, kind = ?kind, error = %e, "email not sent");
    }
}

/// `"RTX 4070 ×1, Souris G305 ×2"`
fn item_summary(lines: &[CartLine]) -> String {
    let parts: Vec<_> = lines
        .iter()
        .map(|line| format!("{} ×{}", line.title, line.quantity))
        .collect();
    parts.join(", ")
}

fn build_order(submission: &Submission, identity: Option<&Identity>) -> NewOrder {
    let customer_name = identity
        .and_then(|i| i.full_name.clone())
        .unwrap_or_else(|| GUEST_NAME.to_owned());
    let customer_phone = identity
        .and_then(|i| i.phone.clone())
        .unwrap_or_else(|| UNKNOWN_PHONE.to_owned());

    NewOrder {
        customer_name,
        customer_phone,
        customer_email: identity.and_then(|i| i.email.clone()),
        wilaya: submission.address.wilaya.clone(),
        address: submission.address.street.clone(),
        total_amount: submission.quote.total,
        payment_method: submission.payment_method,
        status: OrderStatus::Pending,
        user_id: identity.map(|i| i.user_id.clone()),
    }
}
