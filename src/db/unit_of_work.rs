//! Read-your-writes overlay used while processing a single event.
//!
//! Handlers read through the overlay and stage every write in it; nothing
//! reaches the store until [`UnitOfWork::commit`] hands the accumulated
//! [`WriteBatch`] over in one call.

use crate::db::store::{load_entity, EntityStore, ProcessedEvent, StoreError, WriteBatch};
use crate::domain::Entity;

pub struct UnitOfWork<'a> {
    store: &'a dyn EntityStore,
    batch: WriteBatch,
}

impl<'a> UnitOfWork<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
        }
    }

    /// Load a record, preferring a version staged earlier in this unit.
    ///
    /// # Errors
    /// Returns an error if the store read fails or the body does not decode.
    pub async fn load<T: Entity>(&self, id: &str) -> Result<Option<T>, StoreError> {
        if let Some(body) = self.batch.get_raw(T::KIND, id) {
            return Ok(Some(serde_json::from_str(body)?));
        }
        load_entity(self.store, id).await
    }

    pub async fn exists<T: Entity>(&self, id: &str) -> Result<bool, StoreError> {
        if self.batch.get_raw(T::KIND, id).is_some() {
            return Ok(true);
        }
        Ok(self.store.load_raw(T::KIND, id).await?.is_some())
    }

    /// Stage a record. The last save of a given id wins.
    pub fn save<T: Entity>(&mut self, entity: &T) -> Result<(), StoreError> {
        self.batch.upsert(entity)
    }

    /// Whether the event was committed by an earlier unit of work.
    pub async fn is_processed(&self, event_id: &str) -> Result<bool, StoreError> {
        self.store.is_processed(event_id).await
    }

    /// Commit every staged write together with the processed-event record.
    ///
    /// Returns the number of records written.
    pub async fn commit(mut self, processed: ProcessedEvent) -> Result<usize, StoreError> {
        let written = self.batch.len();
        self.batch.set_processed(processed);
        self.store.commit(self.batch).await?;
        Ok(written)
    }
}
