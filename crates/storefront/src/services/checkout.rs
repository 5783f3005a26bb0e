//! Checkout: turn a cart into an order.
//!
//! The steps are not one transaction across cart, products and orders. The
//! returned total is always the total stored on the created order. The
//! snapshotted lines are claimed from the cart before the order is written,
//! so two checkouts of one cart cannot both order the same lines, and lines
//! added after the snapshot stay in the cart.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use aurelia_core::{CartId, Order, OrderId, OrderItem, Price, ProductId, UserId};

use crate::db::{CartRepository, Db, OrderRepository, ProductRepository, StoreError};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No cart is stored under the given id.
    #[error("cart not found: {0}")]
    CartNotFound(CartId),

    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The cart's lines changed between reading and claiming them.
    #[error("cart changed during checkout: {0}")]
    CartChanged(CartId),

    /// Storage error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),
}

/// What the client gets back from a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total: Price,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self {
            carts: CartRepository::new(db),
            products: ProductRepository::new(db),
            orders: OrderRepository::new(db),
        }
    }

    /// Place an order for everything in `cart_id` and remove those lines
    /// from the cart.
    ///
    /// Each line snapshots the product's current price, title and image.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartNotFound` if the cart does not exist,
    /// `CheckoutError::EmptyCart` if it has no items,
    /// `CheckoutError::ProductNotFound` if a line's product is gone, and
    /// `CheckoutError::CartChanged` if the cart was changed or checked out
    /// concurrently. No order is created in any of these cases.
    #[instrument(skip(self), fields(cart_id = %cart_id, user_id = %user_id))]
    pub async fn checkout(
        &self,
        cart_id: &CartId,
        user_id: &UserId,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let cart = self
            .carts
            .get(cart_id)
            .await?
            .ok_or_else(|| CheckoutError::CartNotFound(cart_id.clone()))?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self
                .products
                .get(&item.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(item.product_id.clone()))?;
            lines.push(OrderItem::snapshot(&product, item.quantity));
        }

        if !self.carts.claim_lines(cart_id, &cart.items).await? {
            return Err(CheckoutError::CartChanged(cart_id.clone()));
        }

        let order = Order::place(OrderId::generate(), user_id.clone(), lines, Utc::now());
        let order = match self.orders.create(order).await {
            Ok(order) => order,
            Err(e) => {
                if let Err(restore) = self.carts.merge_items(cart_id, &cart.items, None).await {
                    warn!(error = %restore, "failed to return lines to cart");
                }
                return Err(e.into());
            }
        };

        info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(CheckoutReceipt {
            order_id: order.id,
            total: order.total,
        })
    }
}
