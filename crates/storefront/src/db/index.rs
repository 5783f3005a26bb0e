//! Per-type index of live entity ids.
//!
//! The index for a type is a single record (a JSON array of ids in insertion
//! order) stored under the type's index name. It is what makes listing
//! possible without a query engine. All mutations of an index record happen
//! under the index key's write lock.

use tracing::{debug, instrument};

use super::{Db, StoreError};

/// Handle to one entity type's index.
#[derive(Clone, Copy)]
pub struct EntityIndex<'a> {
    db: &'a Db,
    name: &'static str,
}

impl<'a> EntityIndex<'a> {
    #[must_use]
    pub const fn new(db: &'a Db, name: &'static str) -> Self {
        Self { db, name }
    }

    /// The store key of the index record.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.name
    }

    /// Add `id`. No-op if already present.
    ///
    /// Returns true if the id was added.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(index = self.name))]
    pub async fn add(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.db.locks().lock(self.name).await;
        let mut ids = self.load().await?;
        if ids.iter().any(|existing| existing == id) {
            return Ok(false);
        }
        ids.push(id.to_owned());
        self.store(&ids).await?;
        Ok(true)
    }

    /// Remove `id`. No-op if absent.
    ///
    /// Returns true if the id was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    #[instrument(skip(self), fields(index = self.name))]
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.db.locks().lock(self.name).await;
        let mut ids = self.load().await?;
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() == before {
            return Ok(false);
        }
        self.store(&ids).await?;
        Ok(true)
    }

    /// Page through ids in insertion order.
    ///
    /// `cursor` is the last id of the previous page (`None` starts at the
    /// beginning). The returned cursor is the last id of this page, or `None`
    /// when fewer than `limit` ids remained. When the ids run out on an exact
    /// page boundary the following call returns an empty page with no cursor.
    /// A cursor that is no longer in the index yields an empty final page.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails or the index record is
    /// corrupt.
    pub async fn list_all(
        &self,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>), StoreError> {
        let ids = self.load().await?;
        let start = match cursor {
            None => 0,
            Some(cursor) => match ids.iter().position(|id| id == cursor) {
                Some(position) => position + 1,
                None => {
                    debug!(index = self.name, cursor, "cursor no longer indexed");
                    return Ok((Vec::new(), None));
                }
            },
        };

        let page: Vec<String> = ids.iter().skip(start).take(limit).cloned().collect();
        let next = if limit > 0 && page.len() == limit {
            page.last().cloned()
        } else {
            None
        };
        Ok((page, next))
    }

    /// Number of indexed ids.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load().await?.len())
    }

    /// Returns true if no ids are indexed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the substrate fails.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.load().await?.is_empty())
    }

    /// Read the raw id list. Callers that modify it must hold the index lock.
    pub(crate) async fn load(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.db.read(self.name).await?.unwrap_or_default())
    }

    pub(crate) async fn store(&self, ids: &[String]) -> Result<(), StoreError> {
        self.db.write(self.name, &ids).await
    }
}
