//! Authentication route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::User;

use super::{ApiResult, ok, require};
use crate::services::AuthService;
use crate::state::AppState;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

/// Log in by email, creating the account on first login.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a missing email and `AppError::Auth`
/// for a malformed one.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(req) = payload?;
    require("email", &req.email)?;

    let user = AuthService::new(state.db()).login(&req.email).await?;
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            ..Default::default()
        }));
    });
    ok(user)
}
