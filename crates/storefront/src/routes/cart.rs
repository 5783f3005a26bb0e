//! Cart route handlers.
//!
//! Carts are addressed by a client-held id: an anonymous id before login,
//! the user id afterwards. An unseen id gets an empty cart.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::{Cart, CartId, ProductId, UserId};

use super::{ApiResult, ok, require};
use crate::db::{CartRepository, ProductRepository};
use crate::error::AppError;
use crate::services::CartMergeService;
use crate::state::AppState;

/// Request body for setting a cart line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    /// Cart to change; a new id is generated when absent.
    #[serde(default)]
    pub cart_id: Option<String>,
    #[serde(default)]
    pub product_id: String,
    /// Absolute quantity; zero or less removes the line.
    pub quantity: i64,
    /// Attach the cart to this user.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request body for merging a pre-login cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartRequest {
    #[serde(default)]
    pub local_cart_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// Get cart contents.
///
/// GET /api/cart/{cart_id}
///
/// # Errors
///
/// Returns `AppError::Store` if the store fails.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(cart_id): Path<String>) -> ApiResult<Cart> {
    let cart = CartRepository::new(state.db())
        .get_or_create(&CartId::new(cart_id))
        .await?;
    ok(cart)
}

/// Set the quantity of one product in a cart.
///
/// POST /api/cart
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a missing product id and
/// `AppError::NotFound` if the product does not exist.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> ApiResult<Cart> {
    let Json(req) = payload?;
    require("productId", &req.product_id)?;

    let product_id = ProductId::new(req.product_id);
    if !ProductRepository::new(state.db()).exists(&product_id).await? {
        return Err(AppError::NotFound("Product".to_string()));
    }

    let cart_id = req
        .cart_id
        .filter(|id| !id.trim().is_empty())
        .map_or_else(CartId::generate, CartId::new);
    let carts = CartRepository::new(state.db());
    carts.get_or_create(&cart_id).await?;

    let mut cart = carts
        .update_item_quantity(&cart_id, &product_id, req.quantity)
        .await?;
    if let Some(user_id) = req.user_id.filter(|id| !id.trim().is_empty()) {
        let user_id = UserId::new(user_id);
        if cart.user_id.as_ref() != Some(&user_id) {
            cart = carts.assign_user(&cart_id, &user_id).await?;
        }
    }
    ok(cart)
}

/// Merge a pre-login cart into the user's cart.
///
/// POST /api/cart/merge
///
/// # Errors
///
/// Returns `AppError::BadRequest` if either id is missing.
#[instrument(skip(state, payload))]
pub async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<MergeCartRequest>, JsonRejection>,
) -> ApiResult<Cart> {
    let Json(req) = payload?;
    require("localCartId", &req.local_cart_id)?;
    require("userId", &req.user_id)?;

    let cart = CartMergeService::new(state.db())
        .merge_into_user_cart(&CartId::new(req.local_cart_id), &UserId::new(req.user_id))
        .await?;
    ok(cart)
}
