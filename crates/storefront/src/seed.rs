//! Built-in catalog seed data.
//!
//! The catalog is compiled into the binary from `seed/products.json` and
//! written to the store the first time the product index is found empty.

use aurelia_core::Product;

use crate::db::StoreError;

const PRODUCTS_JSON: &str = include_str!("../seed/products.json");

/// The seed catalog.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the bundled JSON is malformed and
/// `StoreError::Validation` if two products share an id.
pub fn products() -> Result<Vec<Product>, StoreError> {
    let products: Vec<Product> = serde_json::from_str(PRODUCTS_JSON)?;
    for (position, product) in products.iter().enumerate() {
        if products
            .iter()
            .skip(position + 1)
            .any(|other| other.id == product.id)
        {
            return Err(StoreError::Validation(format!(
                "duplicate seed product id {}",
                product.id
            )));
        }
    }
    Ok(products)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_catalog_parses() {
        let products = products().unwrap();
        assert_eq!(products.len(), 25);
        assert!(products.iter().all(|p| !p.id.is_empty()));
        assert!(products.iter().all(|p| !p.colors.is_empty()));
    }
}
