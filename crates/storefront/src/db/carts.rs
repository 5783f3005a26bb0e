//! Cart repository.
//!
//! All content changes go through `IndexedEntity::update`, so two requests
//! changing the same cart at once both land. The quantity rules themselves
//! live on [`Cart`].

use tracing::{debug, instrument};

use aurelia_core::{Cart, CartId, CartItem, ProductId, UserId};

use super::entity::{EntityDef, IndexedEntity, Record};
use super::{Db, StoreError};

impl Record for Cart {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Cart entity registration.
pub static CARTS: EntityDef<Cart> = EntityDef {
    name: "cart",
    index_name: "carts",
    initial_state: Cart::default,
    seed: None,
};

/// Repository for cart reads and writes.
pub struct CartRepository<'a> {
    db: &'a Db,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self { db }
    }

    fn entity(&self, id: &CartId) -> IndexedEntity<'a, Cart> {
        CARTS.entity(self.db, id.as_str())
    }

    /// Returns true if a cart with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn exists(&self, id: &CartId) -> Result<bool, StoreError> {
        self.entity(id).exists().await
    }

    /// Get a cart by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn get(&self, id: &CartId) -> Result<Option<Cart>, StoreError> {
        self.entity(id).get().await
    }

    /// Get a cart, creating an empty one the first time an id is seen.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(cart_id = %id))]
    pub async fn get_or_create(&self, id: &CartId) -> Result<Cart, StoreError> {
        let entity = self.entity(id);
        if let Some(cart) = entity.get().await? {
            return Ok(cart);
        }
        match entity.create(Cart::empty(id.clone())).await {
            Ok(cart) => {
                debug!("created cart");
                Ok(cart)
            }
            // Another request created it between our read and our create.
            Err(StoreError::AlreadyExists(_)) => entity.state().await,
            Err(e) => Err(e),
        }
    }

    /// Set the quantity of one product (`<= 0` removes the line).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    #[instrument(skip(self), fields(cart_id = %id, product_id = %product_id))]
    pub async fn update_item_quantity(
        &self,
        id: &CartId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, StoreError> {
        self.entity(id)
            .update(|mut cart| {
                cart.set_quantity(product_id, quantity);
                cart
            })
            .await
    }

    /// Change the quantity of one product by `delta`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    #[instrument(skip(self), fields(cart_id = %id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        id: &CartId,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Cart, StoreError> {
        self.entity(id)
            .update(|mut cart| {
                cart.add_quantity(product_id, delta);
                cart
            })
            .await
    }

    /// Remove one product's line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    pub async fn remove_item(&self, id: &CartId, product_id: &ProductId) -> Result<Cart, StoreError> {
        self.entity(id)
            .update(|mut cart| {
                cart.remove(product_id);
                cart
            })
            .await
    }

    /// The cart's lines (empty for an unknown cart).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn items(&self, id: &CartId) -> Result<Vec<CartItem>, StoreError> {
        Ok(self.entity(id).state().await?.items)
    }

    /// Sum `items` into the cart and optionally attach it to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    #[instrument(skip(self, items), fields(cart_id = %id, lines = items.len()))]
    pub async fn merge_items(
        &self,
        id: &CartId,
        items: &[CartItem],
        user_id: Option<&UserId>,
    ) -> Result<Cart, StoreError> {
        self.entity(id)
            .update(|mut cart| {
                cart.merge_items(items);
                if let Some(user_id) = user_id {
                    cart.user_id = Some(user_id.clone());
                }
                cart
            })
            .await
    }

    /// Attach the cart to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    pub async fn assign_user(&self, id: &CartId, user_id: &UserId) -> Result<Cart, StoreError> {
        self.entity(id)
            .update(|mut cart| {
                cart.user_id = Some(user_id.clone());
                cart
            })
            .await
    }

    /// Remove exactly `lines` from the cart, keeping the record and any other
    /// lines. Returns false, changing nothing, if any of `lines` is no longer
    /// in the cart with the same quantity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart does not exist.
    #[instrument(skip(self, lines), fields(cart_id = %id, lines = lines.len()))]
    pub async fn claim_lines(&self, id: &CartId, lines: &[CartItem]) -> Result<bool, StoreError> {
        let mut claimed = false;
        self.entity(id)
            .update(|mut cart| {
                claimed = cart.take_lines(lines);
                cart
            })
            .await?;
        Ok(claimed)
    }

    /// Remove and return the cart if it has any lines. An empty or missing
    /// cart is left as it is and `None` is returned. Concurrent callers for
    /// one id never both get the lines.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(cart_id = %id))]
    pub async fn take_nonempty(&self, id: &CartId) -> Result<Option<Cart>, StoreError> {
        self.entity(id).take_if(|cart| !cart.is_empty()).await
    }

    /// Put back a cart removed by [`take_nonempty`](Self::take_nonempty).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the id was reused meanwhile.
    pub async fn restore(&self, cart: Cart) -> Result<Cart, StoreError> {
        self.entity(&cart.id).create(cart).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn cart_with(db: &Db, id: &str, lines: &[(&str, i64)]) -> CartId {
        let carts = CartRepository::new(db);
        let id = CartId::new(id);
        carts.get_or_create(&id).await.unwrap();
        for (product, quantity) in lines {
            carts
                .update_item_quantity(&id, &ProductId::new(*product), *quantity)
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_get_or_create_is_lazy_and_indexed() {
        let db = Db::memory();
        let carts = CartRepository::new(&db);
        let id = CartId::new("c1");

        assert!(!carts.exists(&id).await.unwrap());
        let cart = carts.get_or_create(&id).await.unwrap();
        assert_eq!(cart, Cart::empty(id.clone()));
        assert!(carts.exists(&id).await.unwrap());
        assert_eq!(CARTS.index(&db).len().await.unwrap(), 1);

        carts.get_or_create(&id).await.unwrap();
        assert_eq!(CARTS.index(&db).len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let db = Db::memory();
        let id = cart_with(&db, "c1", &[("p1", 4), ("p2", 1)]).await;
        let carts = CartRepository::new(&db);

        carts
            .update_item_quantity(&id, &ProductId::new("p1"), 0)
            .await
            .unwrap();
        let items = carts.items(&id).await.unwrap();
        assert!(items.iter().all(|i| i.product_id.as_str() != "p1"));
        assert_eq!(items, vec![CartItem::new("p2", 1)]);
    }

    #[tokio::test]
    async fn test_update_on_unknown_cart_is_not_found() {
        let db = Db::memory();
        let err = CartRepository::new(&db)
            .update_item_quantity(&CartId::new("nope"), &ProductId::new("p1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_take_nonempty_skips_empty_carts() {
        let db = Db::memory();
        let carts = CartRepository::new(&db);
        let empty = cart_with(&db, "empty", &[]).await;
        let full = cart_with(&db, "full", &[("p1", 2)]).await;

        assert!(carts.take_nonempty(&empty).await.unwrap().is_none());
        assert!(carts.exists(&empty).await.unwrap());
        assert!(carts.take_nonempty(&CartId::new("nope")).await.unwrap().is_none());

        let taken = carts.take_nonempty(&full).await.unwrap().unwrap();
        assert_eq!(taken.items, vec![CartItem::new("p1", 2)]);
        assert!(!carts.exists(&full).await.unwrap());

        carts.restore(taken).await.unwrap();
        assert_eq!(carts.items(&full).await.unwrap(), vec![CartItem::new("p1", 2)]);
    }

    #[tokio::test]
    async fn test_add_and_remove_item() {
        let db = Db::memory();
        let id = cart_with(&db, "c1", &[]).await;
        let carts = CartRepository::new(&db);

        carts.add_item(&id, &ProductId::new("p1"), 2).await.unwrap();
        let cart = carts.add_item(&id, &ProductId::new("p1"), 1).await.unwrap();
        assert_eq!(cart.items, vec![CartItem::new("p1", 3)]);

        let cart = carts.remove_item(&id, &ProductId::new("p1")).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_merge_sums_and_attaches_user() {
        let db = Db::memory();
        let id = cart_with(&db, "u1", &[("p1", 3)]).await;
        let carts = CartRepository::new(&db);

        let cart = carts
            .merge_items(&id, &[CartItem::new("p1", 2)], Some(&UserId::new("u1")))
            .await
            .unwrap();
        assert_eq!(cart.items, vec![CartItem::new("p1", 5)]);
        assert_eq!(cart.user_id, Some(UserId::new("u1")));
    }

    #[tokio::test]
    async fn test_claim_lines_keeps_record_and_later_lines() {
        let db = Db::memory();
        let id = cart_with(&db, "c1", &[("p1", 1)]).await;
        let carts = CartRepository::new(&db);
        let snapshot = carts.items(&id).await.unwrap();
        carts
            .update_item_quantity(&id, &ProductId::new("p2"), 4)
            .await
            .unwrap();

        assert!(carts.claim_lines(&id, &snapshot).await.unwrap());
        assert!(carts.exists(&id).await.unwrap());
        assert_eq!(carts.items(&id).await.unwrap(), vec![CartItem::new("p2", 4)]);

        assert!(!carts.claim_lines(&id, &snapshot).await.unwrap());
        assert_eq!(carts.items(&id).await.unwrap(), vec![CartItem::new("p2", 4)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_adds_are_not_lost() {
        let db = Db::memory();
        let id = cart_with(&db, "busy", &[]).await;

        let tasks: Vec<_> = (0..50)
            .map(|n| {
                let db = db.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let product = ProductId::new(format!("p{}", n % 5));
                    CartRepository::new(&db)
                        .add_item(&id, &product, 1)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let cart = CartRepository::new(&db).get(&id).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 5);
        assert!(cart.items.iter().all(|item| item.quantity == 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_creates_once() {
        let db = Db::memory();
        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    CartRepository::new(&db)
                        .get_or_create(&CartId::new("shared"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_empty());
        }
        assert_eq!(CARTS.index(&db).len().await.unwrap(), 1);
    }
}
