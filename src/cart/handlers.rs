//! REST API handlers for shopping cart operations

use super::{
    helpers::SessionContext,
    models::{AddToCartInput, CartView, CouponInput, UpdateQuantityInput},
    state::{Session, SharedState},
};
use crate::router::error::ApiError;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, patch, post, put},
    Json, Router,
};

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_items))
        .route(
            "/cart/items/:product_id",
            patch(update_quantity).delete(remove_item),
        )
        .route("/cart/coupon", put(redeem_coupon).delete(remove_coupon))
}

/// Applies `f` to the caller's session and answers with the cart view
fn respond_with_cart(
    state: &SharedState,
    headers: &HeaderMap,
    f: impl FnOnce(&mut Session),
) -> Response {
    let session = SessionContext::resolve(headers);
    let view: CartView = state.with_session(&session.id, |s| {
        f(s);
        s.cart_view(state.pricing())
    });

    session.attach(Json(view))
}

/// Endpoint: GET /cart
/// Read-only; an unknown session sees an empty cart and is not stored.
async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session = SessionContext::resolve(&headers);
    let view = state.peek_session(&session.id, |s| s.cart_view(state.pricing()));

    session.attach(Json(view))
}

/// Endpoint: POST /cart/items
/// Merges the given items into the cart.
async fn add_items(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<AddToCartInput>,
) -> Response {
    respond_with_cart(&state, &headers, |s| s.cart.add_items(payload.items))
}

/// Endpoint: PATCH /cart/items/:product_id
async fn update_quantity(
    State(state): State<SharedState>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateQuantityInput>,
) -> Response {
    respond_with_cart(&state, &headers, |s| {
        s.cart.update_quantity(&product_id, payload.quantity)
    })
}

/// Endpoint: DELETE /cart/items/:product_id
async fn remove_item(
    State(state): State<SharedState>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    respond_with_cart(&state, &headers, |s| s.cart.remove_item(&product_id))
}

/// Endpoint: DELETE /cart
async fn clear_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    respond_with_cart(&state, &headers, |s| s.cart.clear())
}

/// Endpoint: PUT /cart/coupon
/// Redeems a coupon code; the discount amount comes from the store's coupon list.
async fn redeem_coupon(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<CouponInput>,
) -> Response {
    match state.pricing().coupons().redeem(&payload.code) {
        Ok(coupon) => respond_with_cart(&state, &headers, |s| s.cart.apply_coupon(coupon)),
        Err(e) => SessionContext::resolve(&headers).attach(ApiError::from(e)),
    }
}

/// Endpoint: DELETE /cart/coupon
async fn remove_coupon(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    respond_with_cart(&state, &headers, |s| s.cart.remove_coupon())
}
