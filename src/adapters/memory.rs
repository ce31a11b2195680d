//! In-memory adapters
//!
//! Stand-ins for the hosted store and the email API, used by the default
//! binary wiring and by tests. Writes can be made to fail on demand.

use crate::{
    orders::models::{NewOrder, Order, OrderStatus},
    ports::{
        EmailRequest, Identity, IdentityProvider, NotificationError, Notifier, OrderRepository,
        PersistenceError, ProductRepository,
    },
    pricing::Amount,
    products::models::Product,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const INJECTED_FAILURE: &str = "store unavailable (injected failure)";

/// Orders, products and identities held in concurrent maps
#[derive(Default)]
pub struct InMemoryStore {
    orders: DashMap<Uuid, Order>,
    products: DashMap<String, Product>,
    identities: DashMap<String, Identity>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `products`
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.products.insert(product.id.clone(), product);
        }
        store
    }

    /// Makes every subsequent write fail until switched off
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Maps an access token to a signed-in customer
    pub fn register_identity(&self, token: impl Into<String>, identity: Identity) {
        self.identities.insert(token.into(), identity);
    }

    /// Synchronous lookup for inspection
    pub fn find_order_now(&self, id: Uuid) -> Option<Order> {
        self.orders.get(&id).map(|order| order.clone())
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::request(INJECTED_FAILURE));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PersistenceError> {
        self.check_writable()?;

        let order = Order::from_new(Uuid::new_v4(), order, Utc::now());
        self.orders.insert(order.id, order.clone());
        debug!(order_id = %order.id, "order stored in memory");

        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, PersistenceError> {
        Ok(self.find_order_now(id))
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, PersistenceError> {
        self.check_writable()?;

        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::not_found("order", id.to_string()))?;
        order.status = status;

        Ok(order.clone())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, PersistenceError> {
        let mut products: Vec<_> = self.products.iter().map(|p| p.value().clone()).collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, PersistenceError> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn update_product_price(
        &self,
        id: &str,
        price: Amount,
    ) -> Result<Product, PersistenceError> {
        self.check_writable()?;

        let mut product = self
            .products
            .get_mut(id)
            .ok_or_else(|| PersistenceError::not_found("product", id))?;
        product.price = price;

        Ok(product.clone())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryStore {
    async fn current_identity(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Identity>, PersistenceError> {
        Ok(token.and_then(|t| self.identities.get(t).map(|i| i.clone())))
    }
}

/// Collects emails instead of sending them
#[derive(Default)]
pub struct OutboxNotifier {
    sent: Mutex<Vec<EmailRequest>>,
    fail: AtomicBool,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Emails accepted so far
    pub async fn sent(&self) -> Vec<EmailRequest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send_email(&self, request: &EmailRequest) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::delivery("outbox rejected the message"));
        }

        info!(
            kind = ?request.kind,
            recipient = %request.recipient,
            order_id = %request.order_id,
            "email queued"
        );
        self.sent.lock().await.push(request.clone());
        Ok(())
    }
}

/// Small hardware catalogue for local runs
pub fn demo_catalog() -> Vec<Product> {
    let product = |id: &str, title: &str, price: Amount, category: &str, brand: &str| Product {
        id: id.to_owned(),
        title: title.to_owned(),
        price,
        image: format!("/images/products/{id}.webp"),
        category: Some(category.to_owned()),
        brand: Some(brand.to_owned()),
    };

    vec![
        product("gpu-rtx-4070", "Carte graphique RTX 4070 12 Go", 89_000, "gpu", "NVIDIA"),
        product("cpu-r7-7800x3d", "Processeur Ryzen 7 7800X3D", 72_500, "cpu", "AMD"),
        product("ssd-990-1tb", "SSD NVMe 990 Pro 1 To", 18_900, "storage", "Samsung"),
        product("mouse-g305", "Souris sans fil G305", 8_500, "peripherals", "Logitech"),
        product("kb-k70", "Clavier mécanique K70", 24_000, "peripherals", "Corsair"),
    ]
}
