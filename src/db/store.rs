//! Entity store contract and the per-event write batch.

use crate::domain::Entity;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("entity codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store corrupted: {0}")]
    Corrupt(String),
}

/// Audit record written in the same batch as the entities an event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    pub event_id: String,
    pub kind: String,
    pub outcome: String,
    pub block_number: u64,
    pub log_index: u64,
}

/// Every upsert produced by one event, applied atomically by
/// [`EntityStore::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: BTreeMap<(String, String), String>,
    processed: Option<ProcessedEvent>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an upsert of an already-serialized body. Later writes to the
    /// same `(kind, id)` replace earlier ones.
    pub fn upsert_raw(&mut self, kind: &str, id: &str, body: String) {
        self.writes.insert((kind.to_string(), id.to_string()), body);
    }

    /// Serialize and stage an entity.
    ///
    /// # Errors
    /// Returns an error if the entity cannot be serialized.
    pub fn upsert<T: Entity>(&mut self, entity: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(entity)?;
        self.upsert_raw(T::KIND, entity.id(), body);
        Ok(())
    }

    pub fn get_raw(&self, kind: &str, id: &str) -> Option<&str> {
        self.writes
            .get(&(kind.to_string(), id.to_string()))
            .map(|s| s.as_str())
    }

    pub fn set_processed(&mut self, processed: ProcessedEvent) {
        self.processed = Some(processed);
    }

    pub fn processed(&self) -> Option<&ProcessedEvent> {
        self.processed.as_ref()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterate `(kind, id, body)` in deterministic order.
    pub fn writes(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.writes
            .iter()
            .map(|((kind, id), body)| (kind.as_str(), id.as_str(), body.as_str()))
    }
}

/// Key-value persistence for typed records.
///
/// There is no read-modify-write transaction API: callers stage all writes for
/// one event in a [`WriteBatch`] and hand it to [`EntityStore::commit`], which
/// must apply it all-or-nothing.
#[async_trait]
pub trait EntityStore: Send + Sync + fmt::Debug {
    /// Load the serialized body stored under `(kind, id)`.
    async fn load_raw(&self, kind: &str, id: &str) -> Result<Option<String>, StoreError>;

    /// Apply every write in the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Number of records stored under `kind`.
    async fn count(&self, kind: &str) -> Result<u64, StoreError>;

    /// Number of events recorded as processed.
    async fn processed_event_count(&self) -> Result<u64, StoreError>;

    /// Whether an event id has been recorded as processed.
    async fn is_processed(&self, event_id: &str) -> Result<bool, StoreError>;
}

/// Load and decode a typed record.
///
/// # Errors
/// Returns an error if the read fails or the stored body does not decode.
pub async fn load_entity<T: Entity>(
    store: &dyn EntityStore,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.load_raw(T::KIND, id).await? {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}
