//! Core types for Aurelia.
//!
//! Type-safe wrappers for common domain concepts plus the JSON shapes of the
//! four stored entity types: products, carts, users and orders.

pub mod api;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod user;

pub use api::{ApiResponse, Page};
pub use cart::{Cart, CartItem};
pub use catalog::{Product, ProductFilter};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem};
pub use price::{NegativePrice, Price};
pub use user::User;
