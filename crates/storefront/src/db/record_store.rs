//! Key/value record substrate.
//!
//! The storage core only needs three operations from its substrate: read a
//! key, overwrite a key, delete a key. Values are opaque JSON bytes. Backends
//! must give read-your-writes consistency per key; atomicity across keys is
//! handled above this layer.

use std::collections::HashMap;
use std::future::Future;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::StoreError;

/// A persistence primitive mapping a string key to JSON bytes.
pub trait RecordStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Process-local backend. Data lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Number of stored keys (records plus index records).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All stored keys that start with `prefix`, sorted.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .records
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.records.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// PostgreSQL backend
// =============================================================================

/// Durable backend over the `storefront.record` table (`key TEXT PRIMARY KEY,
/// value JSONB`).
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordStore for PgRecordStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value::text FROM storefront.record WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        debug!(hit = value.is_some(), "record lookup");
        Ok(value.map(String::into_bytes))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let json = String::from_utf8(value)
            .map_err(|e| StoreError::Validation(format!("record for {key} is not UTF-8: {e}")))?;
        sqlx::query(
            r"
            INSERT INTO storefront.record (key, value)
            VALUES ($1, $2::jsonb)
            ON CONFLICT (key) DO UPDATE
               SET value = EXCLUDED.value,
                   updated_at = now()
            ",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM storefront.record WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Backend selection
// =============================================================================

/// The configured substrate.
#[derive(Debug, Clone)]
pub enum Backend {
    Memory(std::sync::Arc<MemoryStore>),
    Postgres(PgRecordStore),
}

impl Backend {
    /// Round-trip the substrate (a no-op for the in-memory backend).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if `PostgreSQL` is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Postgres(store) => {
                sqlx::query("SELECT 1").execute(store.pool()).await?;
                Ok(())
            }
        }
    }

    /// The in-memory store, if that is the configured backend.
    #[must_use]
    pub fn as_memory(&self) -> Option<&MemoryStore> {
        match self {
            Self::Memory(store) => Some(store),
            Self::Postgres(_) => None,
        }
    }
}

impl RecordStore for Backend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Postgres(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put(key, value).await,
            Self::Postgres(store) => store.put(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.delete(key).await,
            Self::Postgres(store) => store.delete(key).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::default();
        assert!(store.get("cart:1").await.unwrap().is_none());

        store.put("cart:1", b"{}".to_vec()).await.unwrap();
        assert_eq!(store.get("cart:1").await.unwrap().unwrap(), b"{}");

        store.put("cart:1", b"[]".to_vec()).await.unwrap();
        assert_eq!(store.get("cart:1").await.unwrap().unwrap(), b"[]");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_delete_is_idempotent() {
        let store = MemoryStore::default();
        store.put("k", b"1".to_vec()).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryStore::default();
        for key in ["product:b", "product:a", "products", "cart:x"] {
            store.put(key, b"null".to_vec()).await.unwrap();
        }
        assert_eq!(
            store.keys_with_prefix("product:").await,
            vec!["product:a".to_string(), "product:b".to_string()]
        );
    }
}
