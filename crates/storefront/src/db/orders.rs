//! Order repository.
//!
//! Orders are immutable once placed; there is no update path.

use tracing::instrument;

use aurelia_core::{Order, OrderId, UserId};

use super::entity::{EntityDef, Record};
use super::{Db, StoreError};

/// Batch size used when scanning every order.
const SCAN_BATCH: usize = 100;

impl Record for Order {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Order entity registration.
pub static ORDERS: EntityDef<Order> = EntityDef {
    name: "order",
    index_name: "orders",
    initial_state: Order::default,
    seed: None,
};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    db: &'a Db,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Store a newly placed order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the order id is taken.
    #[instrument(skip(self, order), fields(order_id = %order.id, user_id = %order.user_id))]
    pub async fn create(&self, order: Order) -> Result<Order, StoreError> {
        ORDERS.entity(self.db, order.id.to_string()).create(order).await
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        ORDERS.entity(self.db, id.as_str()).get().await
    }

    /// Every order placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = ORDERS
            .list_all(self.db, SCAN_BATCH)
            .await?
            .into_iter()
            .filter(|order| &order.user_id == user_id)
            .collect();
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(id: &str, user: &str, timestamp: i64) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: UserId::new(user),
            timestamp,
            ..Order::default()
        }
    }

    #[tokio::test]
    async fn test_list_for_user_filters_and_sorts_newest_first() {
        let db = Db::memory();
        let orders = OrderRepository::new(&db);
        orders.create(order("o1", "u1", 100)).await.unwrap();
        orders.create(order("o2", "u2", 200)).await.unwrap();
        orders.create(order("o3", "u1", 300)).await.unwrap();

        let listed = orders.list_for_user(&UserId::new("u1")).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o3", "o1"]);
        assert!(orders.list_for_user(&UserId::new("u9")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_order_id_is_rejected() {
        let db = Db::memory();
        let orders = OrderRepository::new(&db);
        orders.create(order("o1", "u1", 1)).await.unwrap();
        let err = orders.create(order("o1", "u1", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(orders.get(&OrderId::new("o1")).await.unwrap().unwrap().timestamp, 1);
    }
}
