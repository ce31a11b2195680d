//! Back-office order status updates

use super::models::{Order, OrderStatus, TransitionPolicy};
use crate::{
    checkout::service::notify_best_effort,
    ports::{EmailKind, Notifier, OrderRepository, PersistenceError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderAdminError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub struct OrderAdmin {
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
    policy: TransitionPolicy,
}

impl OrderAdmin {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        notifier: Arc<dyn Notifier>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            orders,
            notifier,
            policy,
        }
    }

    pub async fn find(&self, id: Uuid) -> Result<Order, OrderAdminError> {
        self.orders
            .find_order(id)
            .await?
            .ok_or(OrderAdminError::NotFound(id))
    }

    /// Writes `status` to the order. Moving into `shipped` sends the shipment
    /// notice (best-effort).
    pub async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, OrderAdminError> {
        let current = self.find(id).await?;

        if self.policy == TransitionPolicy::Strict && !current.status.can_transition_to(status) {
            return Err(OrderAdminError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .orders
            .update_order_status(id, status)
            .await
            .map_err(|e| match e {
                PersistenceError::NotFound { .. } => OrderAdminError::NotFound(id),
                other => other.into(),
            })?;

        info!(order_id = %id, from = %current.status, to = %status, "order status updated");

        if status == OrderStatus::Shipped && current.status != OrderStatus::Shipped {
            notify_best_effort(self.notifier.as_ref(), EmailKind::OrderShipped, &updated).await;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::memory::{InMemoryStore, OutboxNotifier},
        orders::models::{NewOrder, PaymentMethod},
    };

    async fn setup(policy: TransitionPolicy) -> (Arc<InMemoryStore>, Arc<OutboxNotifier>, OrderAdmin, Order) {
        let store = Arc::new(InMemoryStore::new());
        let outbox = Arc::new(OutboxNotifier::new());
        let order = store
            .insert_order(NewOrder {
                customer_name: "Sofiane".into(),
                customer_phone: "0550123456".into(),
                customer_email: Some("sofiane@example.dz".into()),
                wilaya: "Sétif".into(),
                address: "Rue des frères Bouchama".into(),
                total_amount: 50_000,
                payment_method: PaymentMethod::CashOnDelivery,
                status: OrderStatus::Pending,
                user_id: Some("user-7".into()),
            })
            .await
            .unwrap();
        let admin = OrderAdmin::new(store.clone(), outbox.clone(), policy);

        (store, outbox, admin, order)
    }

    #[tokio::test]
    async fn test_shipping_sends_notice_once() {
        let (_, outbox, admin, order) = setup(TransitionPolicy::Unconstrained).await;

        let updated = admin.update_status(order.id, OrderStatus::Shipped).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        // Re-writing shipped does not notify again
        admin.update_status(order.id, OrderStatus::Shipped).await.unwrap();

        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, EmailKind::OrderShipped);
        assert_eq!(sent[0].recipient, "sofiane@example.dz");
    }

    #[tokio::test]
    async fn test_unconstrained_allows_any_write() {
        let (store, _, admin, order) = setup(TransitionPolicy::Unconstrained).await;

        admin.update_status(order.id, OrderStatus::Delivered).await.unwrap();
        admin.update_status(order.id, OrderStatus::Pending).await.unwrap();

        assert_eq!(
            store.find_order_now(order.id).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_strict_rejects_backwards_moves() {
        let (store, _, admin, order) = setup(TransitionPolicy::Strict).await;

        admin.update_status(order.id, OrderStatus::Shipped).await.unwrap();
        admin.update_status(order.id, OrderStatus::Delivered).await.unwrap();

        let err = admin
            .update_status(order.id, OrderStatus::Pending)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            OrderAdminError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
        );
        assert_eq!(
            store.find_order_now(order.id).unwrap().status,
            OrderStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (_, _, admin, _) = setup(TransitionPolicy::Unconstrained).await;
        let id = Uuid::new_v4();

        assert_eq!(
            admin.update_status(id, OrderStatus::Shipped).await,
            Err(OrderAdminError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let (store, outbox, admin, order) = setup(TransitionPolicy::Unconstrained).await;
        store.set_fail_writes(true);

        let err = admin
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderAdminError::Persistence(_)));
        assert!(outbox.sent().await.is_empty());
    }
}
