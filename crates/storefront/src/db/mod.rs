//! Indexed entity storage for the storefront.
//!
//! Every route handler reads and writes entities through this module. The
//! layering, leaf first:
//!
//! - [`record_store`] - the key/value substrate (`get`/`put`/`delete` of raw
//!   JSON bytes). In-memory for development and tests, `PostgreSQL` for
//!   durable deployments.
//! - [`index`] - per entity type, the ordered set of live keys, stored as one
//!   record under the index name.
//! - [`entity`] - [`IndexedEntity`], the generic CRUD + atomic `mutate`
//!   abstraction bound to an [`EntityDef`].
//! - [`products`], [`carts`], [`users`], [`orders`] - one repository per
//!   entity type with the type-specific mutations.
//!
//! # Key layout
//!
//! ```text
//! {entity_name}:{id}   one JSON record per entity, e.g. "cart:3f9c..."
//! {index_name}         JSON array of ids in insertion order, e.g. "carts"
//! ```
//!
//! A record exists for an id iff the id is in its type's index. Writes that
//! touch one key are serialized through per-key locks held by [`Db`].
//!
//! # `PostgreSQL`
//!
//! The durable backend keeps everything in a single table, created by the
//! migration in `crates/storefront/migrations/`:
//! ```bash
//! cargo run -p aurelia-cli -- migrate
//! ```

pub mod carts;
pub mod entity;
pub mod index;
pub mod locks;
pub mod orders;
pub mod products;
pub mod record_store;
pub mod users;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use entity::{EntityDef, IndexedEntity, Record};
pub use index::EntityIndex;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use record_store::{Backend, MemoryStore, PgRecordStore, RecordStore};
pub use users::UserRepository;

use locks::KeyLocks;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation requires the key to exist and it does not.
    #[error("not found: {0}")]
    NotFound(String),

    /// `create` was called for a key that already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A record or argument failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle to the entity store.
///
/// Cheaply cloneable via `Arc`. Holds the record substrate plus the
/// process-wide write locks and seeding flags that give `mutate`, `create`,
/// `delete` and `ensure_seed` their atomicity.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

struct DbInner {
    backend: Backend,
    locks: KeyLocks,
    seeded: Mutex<HashSet<&'static str>>,
}

impl Db {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(DbInner {
                backend,
                locks: KeyLocks::default(),
                seeded: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// A fresh, empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(Backend::Memory(Arc::new(MemoryStore::default())))
    }

    /// A store backed by the `PostgreSQL` record table.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Backend::Postgres(PgRecordStore::new(pool)))
    }

    /// The raw record substrate.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    pub(crate) fn locks(&self) -> &KeyLocks {
        &self.inner.locks
    }

    /// Round-trip the backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the backend is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.inner.backend.ping().await
    }

    /// Read and decode the record stored under `key`.
    pub(crate) async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.inner.backend.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`.
    pub(crate) async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.inner.backend.put(key, bytes).await
    }

    pub(crate) fn is_seeded(&self, entity: &'static str) -> bool {
        self.inner
            .seeded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(entity)
    }

    pub(crate) fn mark_seeded(&self, entity: &'static str) {
        self.inner
            .seeded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity);
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
