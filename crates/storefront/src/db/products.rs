//! Product repository.
//!
//! Products are read-only at runtime: they arrive through catalog seeding and
//! there is no admin write path.

use tracing::instrument;

use aurelia_core::{Page, Product, ProductFilter, ProductId};

use super::entity::{EntityDef, Record};
use super::{Db, StoreError};
use crate::seed;

impl Record for Product {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Product entity registration.
pub static PRODUCTS: EntityDef<Product> = EntityDef {
    name: "product",
    index_name: "products",
    initial_state: Product::default,
    seed: Some(seed::products),
};

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    db: &'a Db,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        PRODUCTS.entity(self.db, id.as_str()).get().await
    }

    /// Returns true if a product with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn exists(&self, id: &ProductId) -> Result<bool, StoreError> {
        PRODUCTS.entity(self.db, id.as_str()).exists().await
    }

    /// Page through the catalog in index order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn list(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<Product>, StoreError> {
        PRODUCTS.list(self.db, cursor, limit).await
    }

    /// Write the built-in catalog if no products exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the seed data is invalid or the substrate fails.
    pub async fn ensure_seed(&self) -> Result<usize, StoreError> {
        PRODUCTS.ensure_seed(self.db).await
    }

    /// Filter the catalog and page through the matches.
    ///
    /// Loads up to `scan_limit` products and filters them in memory. The
    /// cursor is the id of the last product of the previous page; an unknown
    /// cursor starts over from the first match. `next` is set whenever a full
    /// page was returned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self, filter))]
    pub async fn search(
        &self,
        filter: &ProductFilter,
        scan_limit: usize,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<Product>, StoreError> {
        let scanned = PRODUCTS.list(self.db, None, scan_limit).await?.items;
        let matches: Vec<Product> = scanned
            .into_iter()
            .filter(|product| filter.matches(product))
            .collect();

        let start = cursor
            .and_then(|cursor| matches.iter().position(|p| p.id.as_str() == cursor))
            .map_or(0, |position| position + 1);
        let items: Vec<Product> = matches.into_iter().skip(start).take(limit).collect();
        let next = if limit > 0 && items.len() == limit {
            items.last().map(|p| p.id.to_string())
        } else {
            None
        };
        Ok(Page { items, next })
    }
}
