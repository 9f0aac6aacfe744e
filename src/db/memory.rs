//! In-memory entity store for tests and dry runs.

use crate::db::store::{EntityStore, ProcessedEvent, StoreError, WriteBatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<(String, String), String>,
    processed: Vec<ProcessedEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn processed_events(&self) -> Result<Vec<ProcessedEvent>, StoreError> {
        let inner = self.read()?;
        Ok(inner.processed.clone())
    }

    /// Snapshot of every stored `(kind, id) -> body`.
    pub fn dump(&self) -> Result<HashMap<(String, String), String>, StoreError> {
        let inner = self.read()?;
        Ok(inner.entities.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load_raw(&self, kind: &str, id: &str) -> Result<Option<String>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .entities
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Corrupt("injected commit failure".to_string()));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;

        for (kind, id, body) in batch.writes() {
            inner
                .entities
                .insert((kind.to_string(), id.to_string()), body.to_string());
        }
        if let Some(processed) = batch.processed() {
            if !inner.processed.iter().any(|p| p.event_id == processed.event_id) {
                inner.processed.push(processed.clone());
            }
        }
        Ok(())
    }

    async fn count(&self, kind: &str) -> Result<u64, StoreError> {
        let inner = self.read()?;
        Ok(inner.entities.keys().filter(|(k, _)| k == kind).count() as u64)
    }

    async fn processed_event_count(&self) -> Result<u64, StoreError> {
        let inner = self.read()?;
        Ok(inner.processed.len() as u64)
    }

    async fn is_processed(&self, event_id: &str) -> Result<bool, StoreError> {
        let inner = self.read()?;
        Ok(inner.processed.iter().any(|p| p.event_id == event_id))
    }
}
