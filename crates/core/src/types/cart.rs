//! Shopping carts and the rules for changing their contents.
//!
//! Two kinds of quantity change exist and the difference matters:
//!
//! - [`Cart::set_quantity`] replaces the quantity. The client always sends the
//!   absolute quantity it wants, so repeating a request is harmless.
//! - [`Cart::merge_items`] sums quantities, because it combines two carts that
//!   were filled independently (an anonymous cart folded into a user's cart).
//!
//! Every line keeps `quantity >= 1`. A change that would leave a line at zero
//! or below removes the line instead.

use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId, UserId};

/// A single cart line. `product_id` is unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A shopping cart.
///
/// Anonymous carts are keyed by a client-generated id; a logged-in user's
/// cart is keyed by the user id and carries `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart with the given id.
    #[must_use]
    pub fn empty(id: CartId) -> Self {
        Self {
            id,
            user_id: None,
            items: Vec::new(),
        }
    }

    /// Set the quantity of `product_id` to exactly `quantity`.
    ///
    /// A quantity of zero or less removes the line. An unknown product is
    /// appended.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        let Some(quantity) = positive_quantity(quantity) else {
            self.remove(product_id);
            return;
        };
        match self.line_mut(product_id) {
            Some(item) => item.quantity = quantity,
            None => self.items.push(CartItem::new(product_id.clone(), quantity)),
        }
    }

    /// Change the quantity of `product_id` by `delta`.
    ///
    /// The line is appended if absent and removed if the result drops to zero
    /// or below.
    pub fn add_quantity(&mut self, product_id: &ProductId, delta: i64) {
        let current = self.quantity_of(product_id);
        self.set_quantity(product_id, i64::from(current).saturating_add(delta));
    }

    /// Remove the line for `product_id`, if any.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|item| &item.product_id != product_id);
    }

    /// Fold `incoming` lines into this cart, summing quantities for products
    /// that are already present.
    pub fn merge_items(&mut self, incoming: &[CartItem]) {
        for item in incoming {
            if item.quantity == 0 {
                continue;
            }
            match self.line_mut(&item.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => self.items.push(item.clone()),
            }
        }
    }

    /// Quantity currently held for `product_id` (zero if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove exactly `lines` if every one of them is present with the same
    /// quantity. Returns false, changing nothing, otherwise. Lines not named
    /// in `lines` are kept.
    pub fn take_lines(&mut self, lines: &[CartItem]) -> bool {
        if lines.is_empty() || !lines.iter().all(|line| self.items.contains(line)) {
            return false;
        }
        self.items.retain(|item| !lines.contains(item));
        true
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }
}

fn positive_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        return None;
    }
    Some(u32::try_from(quantity).unwrap_or(u32::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_with(lines: &[(&str, u32)]) -> Cart {
        Cart {
            id: CartId::new("c1"),
            user_id: None,
            items: lines.iter().map(|(p, q)| CartItem::new(*p, *q)).collect(),
        }
    }

    #[test]
    fn test_set_quantity_replaces() {
        let mut cart = cart_with(&[("p1", 3)]);
        cart.set_quantity(&ProductId::new("p1"), 5);
        assert_eq!(cart.items, vec![CartItem::new("p1", 5)]);

        cart.set_quantity(&ProductId::new("p1"), 5);
        assert_eq!(cart.items, vec![CartItem::new("p1", 5)]);
    }

    #[test]
    fn test_set_quantity_appends_new_line() {
        let mut cart = cart_with(&[("p1", 1)]);
        cart.set_quantity(&ProductId::new("p2"), 2);
        assert_eq!(
            cart.items,
            vec![CartItem::new("p1", 1), CartItem::new("p2", 2)]
        );
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = cart_with(&[("p1", 7), ("p2", 1)]);
        cart.set_quantity(&ProductId::new("p1"), 0);
        assert_eq!(cart.items, vec![CartItem::new("p2", 1)]);

        cart.set_quantity(&ProductId::new("p2"), -4);
        assert!(cart.is_empty());

        // Removing something that was never there is a no-op.
        cart.set_quantity(&ProductId::new("p9"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_quantity() {
        let mut cart = cart_with(&[("p1", 2)]);
        cart.add_quantity(&ProductId::new("p1"), 3);
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 5);

        cart.add_quantity(&ProductId::new("p1"), -5);
        assert!(cart.is_empty());

        cart.add_quantity(&ProductId::new("p3"), 1);
        assert_eq!(cart.items, vec![CartItem::new("p3", 1)]);
    }

    #[test]
    fn test_merge_sums_existing_and_appends_new() {
        let mut cart = cart_with(&[("p1", 3)]);
        cart.merge_items(&[CartItem::new("p1", 2), CartItem::new("p2", 1)]);
        assert_eq!(
            cart.items,
            vec![CartItem::new("p1", 5), CartItem::new("p2", 1)]
        );
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_take_lines_keeps_unlisted_lines() {
        let mut cart = cart_with(&[("p1", 2), ("p2", 1)]);
        assert!(cart.take_lines(&[CartItem::new("p1", 2)]));
        assert_eq!(cart.items, vec![CartItem::new("p2", 1)]);
    }

    #[test]
    fn test_take_lines_rejects_changed_quantity() {
        let mut cart = cart_with(&[("p1", 3)]);
        assert!(!cart.take_lines(&[CartItem::new("p1", 2)]));
        assert!(!cart.take_lines(&[]));
        assert_eq!(cart.items, vec![CartItem::new("p1", 3)]);
    }

    #[test]
    fn test_merge_skips_zero_lines() {
        let mut cart = Cart::empty(CartId::new("c"));
        cart.merge_items(&[CartItem::new("p1", 0)]);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let cart = cart_with(&[("p1", 2)]);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "c1", "items": [{ "productId": "p1", "quantity": 2 }] })
        );

        let parsed: Cart = serde_json::from_value(serde_json::json!({ "id": "c2" })).unwrap();
        assert!(parsed.items.is_empty());
        assert!(parsed.user_id.is_none());
    }
}
