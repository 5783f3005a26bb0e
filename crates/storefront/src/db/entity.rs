//! Generic indexed entities.
//!
//! An entity type is described by a static [`EntityDef`]: its record
//! namespace, its index name, its zero value and optional seed data. An
//! [`IndexedEntity`] binds a definition to one id and exposes the storage
//! operations every repository is built from.
//!
//! # Atomicity
//!
//! `create`, `delete`, `take_if`, `mutate` and `update` take the record key's write lock for their
//! whole read-modify-write, so concurrent writers to one key serialize and no
//! update is lost. Index changes happen while the record lock is held:
//! the id is indexed before the record is first written and unindexed after
//! the record is deleted. Lock order is always record key, then index key.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use aurelia_core::Page;

use super::index::EntityIndex;
use super::record_store::RecordStore;
use super::{Db, StoreError};

/// A JSON record that knows its own id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The id this record is stored under.
    fn id(&self) -> &str;
}

/// Static registration of an entity type.
pub struct EntityDef<T> {
    /// Record namespace: records live at `{name}:{id}`.
    pub name: &'static str,
    /// Key of the index record.
    pub index_name: &'static str,
    /// State returned by `state()` for an id with no record.
    pub initial_state: fn() -> T,
    /// Records written by `ensure_seed` when the index is empty.
    pub seed: Option<fn() -> Result<Vec<T>, StoreError>>,
}

impl<T: Record> EntityDef<T> {
    /// Bind this type to one id.
    pub fn entity<'a>(&'static self, db: &'a Db, id: impl Into<String>) -> IndexedEntity<'a, T> {
        let id = id.into();
        let key = self.record_key(&id);
        IndexedEntity {
            db,
            def: self,
            id,
            key,
        }
    }

    /// This type's index.
    #[must_use]
    pub const fn index<'a>(&self, db: &'a Db) -> EntityIndex<'a> {
        EntityIndex::new(db, self.index_name)
    }

    /// Store key of the record for `id`.
    #[must_use]
    pub fn record_key(&self, id: &str) -> String {
        format!("{}:{id}", self.name)
    }

    /// Page through records in index order.
    ///
    /// Ids whose record has disappeared between the index read and the record
    /// read are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or a record is corrupt.
    #[instrument(skip(self, db), fields(entity = self.name))]
    pub async fn list(
        &'static self,
        db: &Db,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<T>, StoreError> {
        let (ids, next) = self.index(db).list_all(limit, cursor).await?;
        let mut items = Vec::with_capacity(ids.len());
        for id in &ids {
            match db.read::<T>(&self.record_key(id)).await? {
                Some(record) => items.push(record),
                None => debug!(id, "indexed id has no record"),
            }
        }
        Ok(Page { items, next })
    }

    /// Every record of this type, in index order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or a record is corrupt.
    pub async fn list_all(&'static self, db: &Db, batch: usize) -> Result<Vec<T>, StoreError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list(db, cursor.as_deref(), batch.max(1)).await?;
            all.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Populate this type's seed records if its index is empty.
    ///
    /// Cheap after the first call: a per-process flag short-circuits the
    /// check. Seeders for one type queue on a seed lock, so concurrent
    /// callers seed exactly once. Each seed record is written under its own
    /// record lock with the same record-then-index order as `create`, so a
    /// racing `create` for a seed id either wins or sees `AlreadyExists`.
    /// Existing records are never overwritten. If a write fails, the records
    /// this call wrote are removed again.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the seed data is invalid or the substrate fails.
    pub async fn ensure_seed(&'static self, db: &Db) -> Result<usize, StoreError> {
        if db.is_seeded(self.name) {
            return Ok(0);
        }
        let Some(seed) = self.seed else {
            db.mark_seeded(self.name);
            return Ok(0);
        };

        let index = self.index(db);
        let seed_lock = format!("{}#seed", self.index_name);
        let _guard = db.locks().lock(&seed_lock).await;
        if db.is_seeded(self.name) {
            return Ok(0);
        }

        let count = index.len().await?;
        if count > 0 {
            debug!(entity = self.name, count, "already populated");
            db.mark_seeded(self.name);
            return Ok(0);
        }

        let records = seed()?;
        let mut written: Vec<&str> = Vec::with_capacity(records.len());
        for record in &records {
            match self.seed_one(db, record).await {
                Ok(true) => written.push(record.id()),
                Ok(false) => {}
                Err(e) => {
                    for id in written {
                        if let Err(rollback) = self.entity(db, id).delete().await {
                            warn!(entity = self.name, id, error = %rollback, "failed to roll back seed record");
                        }
                    }
                    return Err(e);
                }
            }
        }

        db.mark_seeded(self.name);
        info!(entity = self.name, written = written.len(), "seeded");
        Ok(written.len())
    }

    /// Index `record` and write it unless a record is already stored under
    /// its key. Returns true if it was written.
    async fn seed_one(&'static self, db: &Db, record: &T) -> Result<bool, StoreError> {
        let key = self.record_key(record.id());
        let _guard = db.locks().lock(&key).await;
        let index = self.index(db);
        index.add(record.id()).await?;
        if db.backend().get(&key).await?.is_some() {
            return Ok(false);
        }
        if let Err(e) = db.write(&key, record).await {
            if let Err(cleanup) = index.remove(record.id()).await {
                warn!(error = %cleanup, "failed to unindex after failed seed write");
            }
            return Err(e);
        }
        Ok(true)
    }
}

/// One entity of type `T`, addressed by id.
pub struct IndexedEntity<'a, T: 'static> {
    db: &'a Db,
    def: &'static EntityDef<T>,
    id: String,
    key: String,
}

impl<T: Record> IndexedEntity<'_, T> {
    /// The entity id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record key (`{name}:{id}`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if a record is stored for this id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.db.backend().get(&self.key).await?.is_some())
    }

    /// The stored record, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn get(&self) -> Result<Option<T>, StoreError> {
        self.db.read(&self.key).await
    }

    /// The stored record, or the type's initial state if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the record is corrupt.
    pub async fn state(&self) -> Result<T, StoreError> {
        Ok(self
            .get()
            .await?
            .unwrap_or_else(|| (self.def.initial_state)()))
    }

    /// Store `value` as a new record and index it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a record is already stored,
    /// `StoreError::Validation` if `value` carries a different id.
    #[instrument(skip(self, value), fields(key = %self.key))]
    pub async fn create(&self, value: T) -> Result<T, StoreError> {
        if !value.id().is_empty() && value.id() != self.id {
            return Err(StoreError::Validation(format!(
                "record id {} does not match key {}",
                value.id(),
                self.key
            )));
        }

        let _guard = self.db.locks().lock(&self.key).await;
        if self.exists().await? {
            return Err(StoreError::AlreadyExists(self.key.clone()));
        }

        let index = self.def.index(self.db);
        index.add(&self.id).await?;
        if let Err(e) = self.db.write(&self.key, &value).await {
            if let Err(cleanup) = index.remove(&self.id).await {
                warn!(error = %cleanup, "failed to unindex after failed create");
            }
            return Err(e);
        }
        debug!("created");
        Ok(value)
    }

    /// Remove the record and unindex it. Idempotent.
    ///
    /// Returns true if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn delete(&self) -> Result<bool, StoreError> {
        let _guard = self.db.locks().lock(&self.key).await;
        let existed = self.exists().await?;
        self.db.backend().delete(&self.key).await?;
        self.def.index(self.db).remove(&self.id).await?;
        Ok(existed)
    }

    /// Remove and return the record if `keep` says so, all under the record
    /// lock. Of several concurrent callers at most one gets the record.
    ///
    /// Returns `None`, and leaves the record alone, if nothing is stored or
    /// `keep` rejects it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self, keep), fields(key = %self.key))]
    pub async fn take_if<F>(&self, keep: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&T) -> bool + Send,
    {
        let _guard = self.db.locks().lock(&self.key).await;
        let Some(current) = self.get().await? else {
            return Ok(None);
        };
        if !keep(&current) {
            return Ok(None);
        }
        self.db.backend().delete(&self.key).await?;
        self.def.index(self.db).remove(&self.id).await?;
        debug!("taken");
        Ok(Some(current))
    }

    /// Atomically replace the record with `f(current)` and return the result.
    ///
    /// `current` is the stored record, or the type's initial state if none is
    /// stored. Concurrent `mutate` calls on the same id run one after another,
    /// each seeing the previous one's result. The id is not indexed here;
    /// callers that need the record listed `create` it first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails. Nothing is written on
    /// error.
    #[instrument(skip(self, f), fields(key = %self.key))]
    pub async fn mutate<F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(T) -> T + Send,
    {
        let _guard = self.db.locks().lock(&self.key).await;
        let next = f(self.state().await?);
        self.db.write(&self.key, &next).await?;
        Ok(next)
    }

    /// Like [`mutate`](Self::mutate), but only for a record that is already
    /// stored, so an unknown id never leaves an unindexed record behind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record is stored, or
    /// `StoreError` if the substrate fails. Nothing is written on error.
    #[instrument(skip(self, f), fields(key = %self.key))]
    pub async fn update<F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(T) -> T + Send,
    {
        let _guard = self.db.locks().lock(&self.key).await;
        let current = self
            .get()
            .await?
            .ok_or_else(|| StoreError::NotFound(self.key.clone()))?;
        let next = f(current);
        self.db.write(&self.key, &next).await?;
        Ok(next)
    }
}
