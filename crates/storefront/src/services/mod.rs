//! Business logic services for the storefront.
//!
//! Services orchestrate repositories and hold no storage logic of their own.
//!
//! # Services
//!
//! - `auth` - Mock login-or-create by email
//! - `cart_merge` - Fold a pre-login cart into the user's cart
//! - `checkout` - Turn a cart into an order

pub mod auth;
pub mod cart_merge;
pub mod checkout;

pub use auth::{AuthError, AuthService};
pub use cart_merge::CartMergeService;
pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
