//! Checkout route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::{CartId, UserId};

use super::{ApiResult, ok, require};
use crate::services::{CheckoutReceipt, CheckoutService};
use crate::state::AppState;

/// Request body for checkout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// Place an order from a cart.
///
/// POST /api/checkout
///
/// # Errors
///
/// Returns `AppError::Checkout` if the cart is missing or empty, or a product
/// is gone.
#[instrument(skip(state, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<CheckoutReceipt> {
    let Json(req) = payload?;
    require("cartId", &req.cart_id)?;
    require("userId", &req.user_id)?;

    let receipt = CheckoutService::new(state.db())
        .checkout(&CartId::new(req.cart_id), &UserId::new(req.user_id))
        .await?;
    ok(receipt)
}
