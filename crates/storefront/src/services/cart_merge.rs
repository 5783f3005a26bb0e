//! Folding a pre-login cart into the signed-in user's cart.

use tracing::{debug, instrument, warn};

use aurelia_core::{Cart, CartId, UserId};

use crate::db::{CartRepository, Db, StoreError};

/// Cart merge service.
pub struct CartMergeService<'a> {
    carts: CartRepository<'a>,
}

impl<'a> CartMergeService<'a> {
    /// Create a new cart merge service.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self {
            carts: CartRepository::new(db),
        }
    }

    /// Merge the anonymous cart `local_cart_id` into the cart of `user_id`.
    ///
    /// A user's cart is stored under the user id. Quantities are summed. The
    /// local cart is removed before its lines are added, so it is merged at
    /// most once even when two logins race. A missing or empty local cart
    /// leaves the user's cart untouched. If the merge fails the local cart is
    /// put back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    #[instrument(skip(self), fields(local_cart_id = %local_cart_id, user_id = %user_id))]
    pub async fn merge_into_user_cart(
        &self,
        local_cart_id: &CartId,
        user_id: &UserId,
    ) -> Result<Cart, StoreError> {
        let user_cart_id = CartId::new(user_id.as_str());
        if *local_cart_id == user_cart_id {
            return self.carts.get_or_create(&user_cart_id).await;
        }

        // Claiming the lines removes the local cart, so a concurrent merge of
        // the same id finds nothing left to add.
        let Some(local) = self.carts.take_nonempty(local_cart_id).await? else {
            debug!("nothing to merge");
            return self.carts.get_or_create(&user_cart_id).await;
        };

        let merged = match self.fold_into(&user_cart_id, &local, user_id).await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(error = %e, "merge failed, restoring local cart");
                if let Err(restore) = self.carts.restore(local).await {
                    warn!(error = %restore, "failed to restore local cart");
                }
                return Err(e);
            }
        };
        Ok(merged)
    }

    async fn fold_into(
        &self,
        user_cart_id: &CartId,
        local: &Cart,
        user_id: &UserId,
    ) -> Result<Cart, StoreError> {
        self.carts.get_or_create(user_cart_id).await?;
        self.carts
            .merge_items(user_cart_id, &local.items, Some(user_id))
            .await
    }
}
