//! REST API handlers for the checkout wizard and order placement

use super::{
    errors::CheckoutError,
    models::{ConfirmationResponse, DeliveryInput, PaymentInput},
};
use crate::{
    cart::{
        helpers::{bearer_token, SessionContext},
        state::{Session, SharedState},
    },
    router::error::ApiError,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};

/// Creates routes for checkout operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/checkout", get(get_checkout))
        .route("/checkout/delivery", put(select_delivery))
        .route("/checkout/payment", put(select_payment))
        .route("/checkout/next", post(next_step))
        .route("/checkout/back", post(previous_step))
        .route("/checkout/place", post(place_order))
}

/// Applies `f` to the caller's session and answers with the wizard view,
/// or with the error `f` returned.
fn respond_with_checkout(
    state: &SharedState,
    headers: &HeaderMap,
    f: impl FnOnce(&mut Session) -> Result<(), CheckoutError>,
) -> Response {
    let session = SessionContext::resolve(headers);
    let result = state.with_session(&session.id, |s| {
        f(s).map(|()| s.checkout_view(state.pricing()))
    });

    match result {
        Ok(view) => session.attach(Json(view)),
        Err(e) => session.attach(ApiError::from(e)),
    }
}

/// Endpoint: GET /checkout
/// Read-only; an unknown session sees step 1 and is not stored.
async fn get_checkout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session = SessionContext::resolve(&headers);
    let view = state.peek_session(&session.id, |s| s.checkout_view(state.pricing()));

    session.attach(Json(view))
}

/// Endpoint: PUT /checkout/delivery
async fn select_delivery(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<DeliveryInput>,
) -> Response {
    respond_with_checkout(&state, &headers, |s| {
        s.wizard
            .select_delivery(payload.address, payload.delivery_method);
        Ok(())
    })
}

/// Endpoint: PUT /checkout/payment
async fn select_payment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentInput>,
) -> Response {
    respond_with_checkout(&state, &headers, |s| {
        s.wizard.select_payment(payload.payment_method);
        Ok(())
    })
}

/// Endpoint: POST /checkout/next
/// Moves forward when the current step validates.
async fn next_step(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    respond_with_checkout(&state, &headers, |s| {
        s.wizard.next()?;
        Ok(())
    })
}

/// Endpoint: POST /checkout/back
async fn previous_step(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    respond_with_checkout(&state, &headers, |s| {
        s.wizard.back();
        Ok(())
    })
}

/// Endpoint: POST /checkout/place
/// Writes the order; the cart is cleared only when the write succeeds.
async fn place_order(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session = SessionContext::resolve(&headers);
    let token = bearer_token(&headers);

    match state.place_order(&session.id, token.as_deref()).await {
        Ok(confirmation) => session.attach((
            StatusCode::CREATED,
            Json(ConfirmationResponse::from(confirmation)),
        )),
        Err(e) => session.attach(ApiError::from(e)),
    }
}
