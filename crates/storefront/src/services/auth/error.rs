//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] aurelia_core::EmailError),

    /// Storage error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),
}
