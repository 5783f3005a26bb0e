//! Orders placed at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::{OrderId, ProductId, UserId};
use super::price::Price;

/// An order line. Price, title and image are copied from the product when
/// the order is placed so later catalog edits don't rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
    pub title: String,
    pub image_url: String,
}

impl OrderItem {
    /// Snapshot `product` for `quantity` units.
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            price: product.price,
            title: product.title.clone(),
            image_url: product.image_url.clone(),
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A placed order. Immutable once stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Price,
    /// Creation instant in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Order {
    /// Build an order whose `total` is the sum of its line totals.
    #[must_use]
    pub fn place(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let total = items.iter().map(OrderItem::line_total).sum();
        Self {
            id,
            user_id,
            items,
            total,
            timestamp: placed_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(cents),
            image_url: format!("https://img.example/{id}.jpg"),
            ..Product::default()
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let items = vec![
            OrderItem::snapshot(&product("p1", 999), 2),
            OrderItem::snapshot(&product("p2", 1_250), 1),
        ];
        let order = Order::place(
            OrderId::new("o1"),
            UserId::new("u1"),
            items,
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        );
        assert_eq!(order.total, Price::from_cents(3_248));
        assert_eq!(order.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let mut source = product("p1", 999);
        let line = OrderItem::snapshot(&source, 3);
        source.price = Price::from_cents(1);
        source.title = "Renamed".to_string();

        assert_eq!(line.price, Price::from_cents(999));
        assert_eq!(line.title, "Product p1");
        assert_eq!(line.image_url, "https://img.example/p1.jpg");
    }

    #[test]
    fn test_json_shape() {
        let order = Order::place(
            OrderId::new("o1"),
            UserId::new("u1"),
            vec![OrderItem::snapshot(&product("p1", 999), 2)],
            DateTime::from_timestamp_millis(0).unwrap(),
        );
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["total"], 19.98);
        assert_eq!(json["items"][0]["productId"], "p1");
        assert_eq!(json["items"][0]["imageUrl"], "https://img.example/p1.jpg");
    }
}
