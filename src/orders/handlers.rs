//! REST API handlers for orders

use super::models::{Order, StatusUpdateInput};
use crate::{cart::state::SharedState, router::error::ApiError};
use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

/// Creates routes for order operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/orders/:id", get(get_order))
        .route("/admin/orders/:id/status", patch(update_status))
}

/// Endpoint: GET /orders/:id
/// Order confirmation view.
async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.find(id).await?))
}

/// Endpoint: PATCH /admin/orders/:id/status
async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateInput>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.update_status(id, payload.status).await?))
}
