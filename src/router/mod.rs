//! Routing module for the storefront application

pub mod error;

use crate::cart::state::SharedState;
use axum::{
    body::Body,
    extract::Request,
    http::Uri,
    middleware::Next,
    routing::get,
    Json, Router,
};
use error::ApiError;
use serde_json::{json, Value};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Creates and configures the application router with all routes and middleware
pub fn create_app_router(state: SharedState) -> Router {
    // Middleware: Log requests
    let log_layer = axum::middleware::from_fn(|req: Request<Body>, next: Next| async move {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let started = Instant::now();

        let res = next.run(req).await;
        let elapsed = started.elapsed();

        if res.status().is_success() {
            info!(%method, %uri, status = res.status().as_u16(), ?elapsed, "request handled");
        } else {
            warn!(%method, %uri, status = res.status().as_u16(), ?elapsed, "request failed");
        }
        res
    });

    // Middleware: CORS (Permissive for local dev)
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes
    Router::new()
        .route("/health", get(health))
        .merge(crate::cart::routes())
        .merge(crate::checkout::routes())
        .merge(crate::orders::routes())
        .merge(crate::products::routes())
        .fallback(not_found)
        .layer(log_layer)
        .layer(cors_layer)
        .with_state(state)
}

/// Endpoint: GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("route {}", uri.path()))
}
