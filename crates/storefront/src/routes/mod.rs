//! HTTP route handlers for storefront.
//!
//! Handlers parse requests, call repositories and services, and wrap results
//! in the `{success, data?, error?}` envelope. They hold no storage logic.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Store round-trip
//!
//! # Catalog (seeding middleware)
//! GET  /api/products           - Filtered, paginated listing
//! GET  /api/products/{id}      - Product detail
//!
//! # Cart
//! GET  /api/cart/{cart_id}     - Cart contents (created on first read)
//! POST /api/cart               - Set one product's quantity
//! POST /api/cart/merge         - Merge a pre-login cart into the user's cart
//!
//! # Checkout & orders
//! POST /api/checkout           - Place an order from a cart
//! GET  /api/orders/{user_id}   - Order history, newest first
//!
//! # Auth
//! POST /api/auth/login         - Login or create by email
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    middleware::from_fn_with_state,
    routing::{get, post},
};

use aurelia_core::ApiResponse;

use crate::error::AppError;
use crate::middleware::ensure_catalog_seeded;
use crate::state::AppState;

/// Successful handler output.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wrap `data` in a success envelope.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Reject an empty required string field.
pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// Create the product routes router.
///
/// Every product route first makes sure the catalog is seeded.
pub fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route_layer(from_fn_with_state(state, ensure_catalog_seeded))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::update))
        .route("/merge", post(cart::merge))
        .route("/{cart_id}", get(cart::show))
}

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the storefront.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/api/products", product_routes(state))
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/orders/{user_id}", get(orders::list))
        .route("/api/auth/login", post(auth::login))
}
