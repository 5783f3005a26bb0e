//! Catalog products.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A catalog product.
///
/// Products are written once by catalog seeding and never modified by the
/// storefront; orders snapshot the fields they need at checkout time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub category: String,
    pub brand: String,
    pub colors: Vec<String>,
    pub inventory: u32,
}

/// In-memory catalog filter used by the product listing.
///
/// Empty allow-lists match everything; price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl ProductFilter {
    /// Returns true if `product` passes every configured constraint.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        (self.categories.is_empty() || self.categories.contains(&product.category))
            && (self.brands.is_empty() || self.brands.contains(&product.brand))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}
