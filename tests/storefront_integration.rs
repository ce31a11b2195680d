//! Integration tests for the storefront REST API
//!
//! These tests drive the router end to end with in-memory collaborators:
//! - Cart aggregation and totals per session cookie
//! - The three-step checkout wizard and its validation
//! - Order placement, failure handling and retry
//! - Back-office order status and price updates

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use storefront_cart::adapters::memory::{demo_catalog, InMemoryStore, OutboxNotifier};
use storefront_cart::cart::{AppState, SharedState, StoreSettings};
use storefront_cart::orders::models::TransitionPolicy;
use storefront_cart::ports::{EmailKind, Identity, Ports};
use storefront_cart::pricing::{
    CouponBook, DeliveryRates, DiscountPolicy, PricingPolicy, DEFAULT_TAX_RATE,
};
use storefront_cart::router::create_app_router;

struct TestApp {
    app: axum::Router,
    state: SharedState,
    store: Arc<InMemoryStore>,
    outbox: Arc<OutboxNotifier>,
}

/// Helper function to create a test app instance
fn create_test_app() -> TestApp {
    create_test_app_with(StoreSettings::default())
}

fn create_test_app_with(settings: StoreSettings) -> TestApp {
    let store = Arc::new(InMemoryStore::with_products(demo_catalog()));
    let outbox = Arc::new(OutboxNotifier::new());
    let ports = Ports {
        orders: store.clone(),
        products: store.clone(),
        identity: store.clone(),
        notifier: outbox.clone(),
    };
    let state = Arc::new(AppState::new(ports, settings));

    TestApp {
        app: create_app_router(state.clone()),
        state,
        store,
        outbox,
    }
}

/// A browser: remembers the session cookie between requests
struct Client<'a> {
    app: &'a axum::Router,
    cookie: Option<String>,
    token: Option<String>,
}

impl<'a> Client<'a> {
    fn new(app: &'a axum::Router) -> Self {
        Self {
            app,
            cookie: None,
            token: None,
        }
    }

    fn signed_in(app: &'a axum::Router, token: &str) -> Self {
        Self {
            token: Some(token.to_owned()),
            ..Self::new(app)
        }
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

        (status, body)
    }

    async fn add_demo_items(&mut self) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/cart/items",
                Some(json!({
                    "items": [
                        { "productId": "gpu-rtx-4070", "title": "RTX 4070", "unitPrice": 89000 },
                        { "productId": "mouse-g305", "title": "G305", "unitPrice": 8500, "quantity": 2 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn walk_to_confirmation(&mut self, payment: &str) {
        let (status, _) = self
            .send(
                "PUT",
                "/checkout/delivery",
                Some(json!({
                    "address": { "wilaya": "Alger", "street": "12 rue Didouche Mourad" },
                    "deliveryMethod": "standard"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.send("POST", "/checkout/next", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], 2);

        let (status, _) = self
            .send(
                "PUT",
                "/checkout/payment",
                Some(json!({ "paymentMethod": payment })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.send("POST", "/checkout/next", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], 3);
        assert_eq!(body["stepName"], "confirmation");
    }
}

#[tokio::test]
async fn test_health() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    let (status, body) = client.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    let (status, body) = client.send("GET", "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_cart_aggregates_and_prices() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    client.add_demo_items().await;
    let (_, body) = client
        .send(
            "POST",
            "/cart/items",
            Some(json!({
                "items": [{ "productId": "mouse-g305", "title": "G305", "unitPrice": 8500 }]
            })),
        )
        .await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2, "same product merges into one line");
    assert_eq!(items[1]["quantity"], 3);
    assert_eq!(body["itemCount"], 4);
    assert_eq!(body["quote"]["subtotal"], 114_500);
    assert_eq!(body["quote"]["tax"], 21_755);
    assert_eq!(body["quote"]["delivery"], 0, "no delivery method chosen yet");
    assert_eq!(body["quote"]["total"], 136_255);
}

#[tokio::test]
async fn test_cart_quantity_zero_removes_line() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;

    let (status, body) = client
        .send(
            "PATCH",
            "/cart/items/mouse-g305",
            Some(json!({ "quantity": 0 })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["quote"]["subtotal"], 89_000);

    let (_, body) = client.send("DELETE", "/cart/items/gpu-rtx-4070", None).await;
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["quote"]["total"], 0);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let test = create_test_app();
    let mut alice = Client::new(&test.app);
    let mut bob = Client::new(&test.app);

    alice.add_demo_items().await;
    let (_, body) = bob.send("GET", "/cart", None).await;

    assert!(body["items"].as_array().unwrap().is_empty());
    assert_ne!(alice.cookie, bob.cookie);
}

#[tokio::test]
async fn test_guest_checkout_happy_path() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    client.add_demo_items().await;
    client.walk_to_confirmation("cash_on_delivery").await;

    let (_, view) = client.send("GET", "/checkout", None).await;
    assert_eq!(view["quote"]["delivery"], 500);
    assert_eq!(view["quote"]["total"], 126_640);

    let (status, body) = client.send("POST", "/checkout/place", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["total"], 126_640);
    assert!(body.get("chatLink").is_none());

    let order_id = body["orderId"].as_str().unwrap().to_owned();
    assert_eq!(body["confirmationUrl"], format!("/orders/{order_id}"));
    assert_eq!(body["reference"], &order_id.replace('-', "")[..8]);

    let (status, order) = client.send("GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["customer_name"], "Client invité");
    assert_eq!(order["wilaya"], "Alger");
    assert_eq!(order["payment_method"], "cash_on_delivery");
    assert!(order["user_id"].is_null());

    let (_, cart) = client.send("GET", "/cart", None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (_, view) = client.send("GET", "/checkout", None).await;
    assert_eq!(view["step"], 1);
    assert!(test.state.sessions.is_empty(), "finished session is dropped");

    assert!(test.outbox.sent().await.is_empty(), "guests get no email");
}

#[tokio::test]
async fn test_cookieless_reads_store_no_sessions() {
    let test = create_test_app();

    for _ in 0..3 {
        let mut client = Client::new(&test.app);
        let (status, cart) = client.send("GET", "/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cart["items"].as_array().unwrap().is_empty());

        let (status, view) = client.send("GET", "/checkout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], 1);
    }

    assert_eq!(test.state.sessions.len(), 0);
}

fn coupon_settings() -> StoreSettings {
    let pricing = PricingPolicy::new(
        DEFAULT_TAX_RATE,
        DeliveryRates::default(),
        DiscountPolicy::Apply,
    )
    .unwrap()
    .with_coupons(CouponBook::new(["BIENVENUE=20000".parse().unwrap()]));

    StoreSettings {
        pricing,
        ..StoreSettings::default()
    }
}

#[tokio::test]
async fn test_customer_cannot_choose_discount_amount() {
    let test = create_test_app_with(coupon_settings());
    let mut client = Client::new(&test.app);
    client
        .send(
            "POST",
            "/cart/items",
            Some(json!({
                "items": [{ "productId": "mouse-g305", "title": "G305", "unitPrice": 8500 }]
            })),
        )
        .await;

    let (status, _) = client
        .send("PUT", "/cart/discount", Some(json!({ "amount": 1_000_000 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = client
        .send("PUT", "/cart/coupon", Some(json!({ "code": "FREE" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unknown_coupon");

    let (status, cart) = client
        .send("PUT", "/cart/coupon", Some(json!({ "code": "bienvenue" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["coupon"], "BIENVENUE");
    assert_eq!(cart["quote"]["discount"], 8_500, "capped at the subtotal");

    client.walk_to_confirmation("cash_on_delivery").await;
    let (status, body) = client.send("POST", "/checkout/place", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, order) = client
        .send("GET", &format!("/orders/{}", body["orderId"].as_str().unwrap()), None)
        .await;
    assert_eq!(order["total_amount"], 1_615 + 500);
}

#[tokio::test]
async fn test_coupon_can_be_removed() {
    let test = create_test_app_with(coupon_settings());
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;

    client
        .send("PUT", "/cart/coupon", Some(json!({ "code": "BIENVENUE" })))
        .await;
    let (status, cart) = client.send("DELETE", "/cart/coupon", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(cart.get("coupon").is_none());
    assert_eq!(cart["quote"]["discount"], 0);
    assert_eq!(cart["quote"]["total"], 126_140);
}

#[tokio::test]
async fn test_signed_in_checkout_links_user_and_sends_email() {
    let test = create_test_app();
    test.store.register_identity(
        "token-123",
        Identity {
            user_id: "user-42".into(),
            full_name: Some("Amina Benali".into()),
            phone: Some("0550123456".into()),
            email: Some("amina@example.dz".into()),
        },
    );
    let mut client = Client::signed_in(&test.app, "token-123");

    client.add_demo_items().await;
    client.walk_to_confirmation("bank_transfer").await;
    let (status, body) = client.send("POST", "/checkout/place", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, order) = client
        .send("GET", &format!("/orders/{}", body["orderId"].as_str().unwrap()), None)
        .await;
    assert_eq!(order["user_id"], "user-42");
    assert_eq!(order["customer_name"], "Amina Benali");
    assert_eq!(order["customer_email"], "amina@example.dz");

    let sent = test.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EmailKind::OrderConfirmation);
    assert_eq!(sent[0].recipient, "amina@example.dz");
}

#[tokio::test]
async fn test_submission_failure_keeps_cart_and_allows_retry() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    client.add_demo_items().await;
    client.walk_to_confirmation("cash_on_delivery").await;

    test.store.set_fail_writes(true);
    let (status, body) = client.send("POST", "/checkout/place", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "persistence_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("store unavailable"));
    assert_eq!(test.store.order_count(), 0);

    let (_, cart) = client.send("GET", "/cart", None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    let (_, view) = client.send("GET", "/checkout", None).await;
    assert_eq!(view["step"], 3);

    test.store.set_fail_writes(false);
    let (status, _) = client.send("POST", "/checkout/place", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(test.store.order_count(), 1);
}

#[tokio::test]
async fn test_next_without_selections_reports_fields() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;

    let (status, body) = client.send("POST", "/checkout/next", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["address"].is_string());
    assert!(body["fields"]["delivery_method"].is_string());

    let (_, view) = client.send("GET", "/checkout", None).await;
    assert_eq!(view["step"], 1);
}

#[tokio::test]
async fn test_back_keeps_selections() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;
    client.walk_to_confirmation("cash_on_delivery").await;

    client.send("POST", "/checkout/back", None).await;
    let (_, view) = client.send("POST", "/checkout/back", None).await;

    assert_eq!(view["step"], 1);
    assert_eq!(view["selections"]["deliveryMethod"], "standard");
    assert_eq!(view["selections"]["paymentMethod"], "cash_on_delivery");
}

#[tokio::test]
async fn test_place_before_confirmation_is_conflict() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;

    let (status, body) = client.send("POST", "/checkout/place", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "checkout_not_ready");
    assert_eq!(test.store.order_count(), 0);
}

#[tokio::test]
async fn test_chat_payment_returns_deep_link() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;
    client.walk_to_confirmation("chat").await;

    let (status, body) = client.send("POST", "/checkout/place", None).await;

    assert_eq!(status, StatusCode::CREATED);
    let link = body["chatLink"].as_str().unwrap();
    assert!(link.starts_with("https://wa.me/213550000000?text="));
}

#[tokio::test]
async fn test_admin_status_update() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;
    client.walk_to_confirmation("cash_on_delivery").await;
    let (_, body) = client.send("POST", "/checkout/place", None).await;
    let order_id = body["orderId"].as_str().unwrap().to_owned();

    let (status, order) = client
        .send(
            "PATCH",
            &format!("/admin/orders/{order_id}/status"),
            Some(json!({ "status": "delivered" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "unconstrained by default");
    assert_eq!(order["status"], "delivered");
}

#[tokio::test]
async fn test_admin_strict_transitions() {
    let test = create_test_app_with(StoreSettings {
        transition_policy: TransitionPolicy::Strict,
        ..StoreSettings::default()
    });
    let mut client = Client::new(&test.app);
    client.add_demo_items().await;
    client.walk_to_confirmation("cash_on_delivery").await;
    let (_, body) = client.send("POST", "/checkout/place", None).await;
    let uri = format!("/admin/orders/{}/status", body["orderId"].as_str().unwrap());

    let (status, body) = client
        .send("PATCH", &uri, Some(json!({ "status": "delivered" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");

    let (status, _) = client
        .send("PATCH", &uri, Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    let (status, body) = client
        .send("GET", "/orders/00000000-0000-0000-0000-000000000000", None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_products_and_price_adjustment() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);

    let (status, products) = client.send("GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 5);

    let (status, product) = client
        .send(
            "PATCH",
            "/admin/products/kb-k70/price",
            Some(json!({ "price": 21000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["price"], 21_000);

    let (_, product) = client.send("GET", "/products/kb-k70", None).await;
    assert_eq!(product["price"], 21_000);
}

#[tokio::test]
async fn test_price_adjustment_rolls_back_on_failure() {
    let test = create_test_app();
    let mut client = Client::new(&test.app);
    client.send("GET", "/products", None).await;

    test.store.set_fail_writes(true);
    let (status, _) = client
        .send(
            "PATCH",
            "/admin/products/kb-k70/price",
            Some(json!({ "price": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, product) = client.send("GET", "/products/kb-k70", None).await;
    assert_eq!(product["price"], 24_000);
}
