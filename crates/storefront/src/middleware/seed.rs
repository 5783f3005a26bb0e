//! Catalog seeding guard for product routes.
//!
//! The catalog is seeded once at startup. This middleware covers stores that
//! were emptied or attached later: after the first successful pass the check
//! is a single flag read.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Ensure the product catalog is seeded before the request continues.
pub async fn ensure_catalog_seeded(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = ProductRepository::new(state.db()).ensure_seed().await {
        return AppError::from(e).into_response();
    }
    next.run(request).await
}
