//! REST API handlers for the product catalogue

use super::models::{PriceUpdateInput, Product};
use crate::{cart::state::SharedState, router::error::ApiError};
use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};

/// Creates routes for product operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/admin/products/:id/price", patch(adjust_price))
}

/// Endpoint: GET /products
async fn list_products(State(state): State<SharedState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.refresh().await?))
}

/// Endpoint: GET /products/:id
async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.get(&id).await?))
}

/// Endpoint: PATCH /admin/products/:id/price
async fn adjust_price(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<PriceUpdateInput>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.adjust_price(&id, payload.price).await?))
}
