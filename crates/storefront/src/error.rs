//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error body is the JSON envelope
//! `{"success": false, "error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use aurelia_core::ApiResponse;

use crate::db::StoreError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Serialization(_) | StoreError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// The HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(err)
            | Self::Checkout(CheckoutError::Store(err))
            | Self::Auth(AuthError::Store(err)) => store_status(err),
            Self::Checkout(CheckoutError::CartNotFound(_) | CheckoutError::ProductNotFound(_))
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Checkout(CheckoutError::CartChanged(_)) => StatusCode::CONFLICT,
            Self::Checkout(CheckoutError::EmptyCart)
            | Self::Auth(AuthError::InvalidEmail(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client.
    fn client_message(&self) -> String {
        // Don't expose internal error details to clients
        if self.status().is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Store(err) => err.to_string(),
            Self::Checkout(CheckoutError::EmptyCart) => "Cart is empty".to_string(),
            Self::Checkout(CheckoutError::CartNotFound(_)) => "Cart not found".to_string(),
            Self::Checkout(CheckoutError::CartChanged(_)) => {
                "Cart changed during checkout, please retry".to_string()
            }
            Self::Checkout(CheckoutError::ProductNotFound(id)) => {
                format!("Product {id} not found")
            }
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ApiResponse::<()>::err(self.client_message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aurelia_core::{CartId, ProductId};
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StoreError::AlreadyExists("cart:c1".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(StoreError::Validation("bad".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::CartNotFound(CartId::new("c1")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::ProductNotFound(ProductId::new("p1")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::CartChanged(CartId::new("c1")).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_is_envelope() {
        let response = AppError::Internal("connection refused".to_string()).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_missing_product_message_names_id() {
        let response = AppError::from(CheckoutError::ProductNotFound(ProductId::new("p9")))
            .into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Product p9 not found");
    }
}
