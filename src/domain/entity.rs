//! Typed records persisted through the entity store.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record addressable by `(KIND, id)` in the entity store.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Namespace of this record type in the store.
    const KIND: &'static str;

    fn id(&self) -> &str;
}
