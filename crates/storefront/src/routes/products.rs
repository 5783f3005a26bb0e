//! Catalog route handlers.

use std::str::FromStr;

use axum::extract::{Path, Query, State, rejection::QueryRejection};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::{Page, Price, Product, ProductFilter, ProductId};

use super::{ApiResult, ok};
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Largest page a client may request.
const MAX_PAGE_SIZE: usize = 100;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Comma-separated category allow-list.
    pub category: Option<String>,
    /// Comma-separated brand allow-list.
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// Id of the last product on the previous page.
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl ProductQuery {
    fn filter(&self) -> Result<ProductFilter, AppError> {
        Ok(ProductFilter {
            categories: split_list(self.category.as_deref()),
            brands: split_list(self.brand.as_deref()),
            min_price: parse_price("minPrice", self.min_price.as_deref())?,
            max_price: parse_price("maxPrice", self.max_price.as_deref())?,
        })
    }

    fn limit(&self, default: usize) -> Result<usize, AppError> {
        match self.limit {
            None => Ok(default),
            Some(0) => Err(AppError::BadRequest("limit must be positive".to_string())),
            Some(limit) => Ok(limit.min(MAX_PAGE_SIZE)),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_price(field: &str, raw: Option<&str>) -> Result<Option<Price>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let amount = Decimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))?;
    Price::new(amount)
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{field} must not be negative")))
}

/// List products with optional filtering.
///
/// GET /api/products?category=&brand=&minPrice=&maxPrice=&cursor=&limit=
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed parameters.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Page<Product>> {
    let Query(query) = query?;
    let filter = query.filter()?;
    let limit = query.limit(state.config().product_page_size)?;

    let page = ProductRepository::new(state.db())
        .search(
            &filter,
            state.config().catalog_scan_limit,
            query.cursor.as_deref().filter(|c| !c.is_empty()),
            limit,
        )
        .await?;
    ok(page)
}

/// Get a single product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if no product has this id.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    let product = ProductRepository::new(state.db())
        .get(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    ok(product)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_ignores_blanks() {
        assert_eq!(
            split_list(Some("Home, Footwear,,")),
            vec!["Home".to_string(), "Footwear".to_string()]
        );
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(
            parse_price("minPrice", Some("19.99")).unwrap(),
            Some(Price::from_cents(1_999))
        );
        assert_eq!(parse_price("minPrice", Some(" ")).unwrap(), None);
        assert!(parse_price("minPrice", Some("cheap")).is_err());
        assert!(parse_price("minPrice", Some("-1")).is_err());
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        let query = ProductQuery::default();
        assert_eq!(query.limit(12).unwrap(), 12);

        let query = ProductQuery {
            limit: Some(5_000),
            ..ProductQuery::default()
        };
        assert_eq!(query.limit(12).unwrap(), MAX_PAGE_SIZE);

        let query = ProductQuery {
            limit: Some(0),
            ..ProductQuery::default()
        };
        assert!(query.limit(12).is_err());
    }
}
