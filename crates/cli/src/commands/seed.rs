//! Catalog seeding commands.
//!
//! Seeding is idempotent: products are written only when the product index
//! is empty, and existing records are never overwritten.

use aurelia_storefront::db::{self, Db, ProductRepository};
use tracing::info;

use super::{CommandError, database_url};

/// Seed the built-in product catalog into the `PostgreSQL` store.
///
/// # Errors
///
/// Returns `CommandError` if the URL is missing, the connection fails or a
/// write fails.
pub async fn products() -> Result<(), CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let store = Db::postgres(pool);
    let products = ProductRepository::new(&store);
    let written = products.ensure_seed().await?;
    if written == 0 {
        info!("Catalog already populated, nothing written");
    } else {
        info!(written, "Catalog seeded");
    }
    Ok(())
}

/// Report how many products are indexed.
///
/// # Errors
///
/// Returns `CommandError` if the URL is missing or the store cannot be read.
pub async fn status() -> Result<(), CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let store = Db::postgres(pool);
    let indexed = db::products::PRODUCTS.index(&store).len().await?;
    info!(indexed, "Product catalog");
    Ok(())
}
