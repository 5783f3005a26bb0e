//! Order history route handler.

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::instrument;

use aurelia_core::{Order, UserId};

use super::{ApiResult, ok};
use crate::db::OrderRepository;
use crate::state::AppState;

/// A user's orders.
#[derive(Debug, Serialize)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// List a user's orders, newest first.
///
/// GET /api/orders/{user_id}
///
/// # Errors
///
/// Returns `AppError::Store` if the store fails.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<OrderList> {
    let items = OrderRepository::new(state.db())
        .list_for_user(&UserId::new(user_id))
        .await?;
    ok(OrderList { items })
}
