//! HTTP error responses
//!
//! Every failure is rendered as `{ "error": <code>, "message": <text> }`;
//! validation failures add a `fields` map.

use crate::{
    checkout::{errors::CheckoutError, wizard::ValidationErrors},
    orders::admin::OrderAdminError,
    ports::PersistenceError,
    pricing::PricingError,
    products::catalog::CatalogError,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Orders(#[from] OrderAdminError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("{0} not found")]
    NotFound(String),
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub error: &'static str,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Checkout(e) => match e {
                CheckoutError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
                CheckoutError::NotReady { .. } => (StatusCode::CONFLICT, "checkout_not_ready"),
                CheckoutError::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, "empty_cart"),
                CheckoutError::AlreadySubmitting => (StatusCode::CONFLICT, "submission_in_progress"),
                CheckoutError::Persistence(_) => (StatusCode::BAD_GATEWAY, "persistence_error"),
            },
            Self::Orders(e) => match e {
                OrderAdminError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                OrderAdminError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "invalid_transition")
                }
                OrderAdminError::Persistence(p) => persistence_status(p),
            },
            Self::Catalog(e) => match e {
                CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                CatalogError::Persistence(p) => persistence_status(p),
            },
            Self::Pricing(e) => match e {
                PricingError::UnknownCoupon(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unknown_coupon"),
                _ => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_pricing_input"),
            },
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        }
    }

    fn fields(&self) -> Option<ValidationErrors> {
        match self {
            Self::Checkout(CheckoutError::Validation(errors)) => Some(errors.clone()),
            _ => None,
        }
    }
}

fn persistence_status(error: &PersistenceError) -> (StatusCode, &'static str) {
    match error {
        PersistenceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        _ => (StatusCode::BAD_GATEWAY, "persistence_error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(error = %self, code, "request failed");
        } else {
            debug!(error = %self, code, "request rejected");
        }

        let body = ErrorResponse {
            error: code,
            message: self.to_string(),
            fields: self.fields(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{models::CheckoutSelections, models::Step, wizard::validate_step};

    #[test]
    fn test_persistence_failure_is_bad_gateway_with_detail() {
        let err = ApiError::from(CheckoutError::Persistence(PersistenceError::request(
            "connection reset",
        )));

        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "persistence_error");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_validation_carries_fields() {
        let errors = validate_step(Step::Delivery, &CheckoutSelections::default()).unwrap_err();
        let err = ApiError::from(CheckoutError::Validation(errors));

        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.fields().is_some());
    }

    #[test]
    fn test_unknown_coupon_is_unprocessable() {
        let err = ApiError::from(PricingError::UnknownCoupon("FREE".into()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "unknown_coupon")
        );
    }

    #[test]
    fn test_not_found_mapping() {
        let err = ApiError::from(CatalogError::Persistence(PersistenceError::not_found(
            "product", "x",
        )));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }
}
