//! Canonical event ordering for deterministic processing.

use crate::domain::LedgerEvent;

/// Canonical ordering key for ledger events.
///
/// Ordering: block_number -> log_index -> tx_hash (fallback sort).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    /// Block height (primary sort).
    pub block_number: u64,
    /// Position of the log within the block (secondary sort).
    pub log_index: u64,
    /// Transaction hash (fallback sort).
    pub tx_hash: String,
}

impl EventOrderingKey {
    pub fn from_event(event: &LedgerEvent) -> Self {
        let meta = event.meta();
        EventOrderingKey {
            block_number: meta.block_number,
            log_index: meta.log_index,
            tx_hash: meta.tx_hash.to_lowercase(),
        }
    }

    /// Returns true if `a` must be processed before `b`.
    pub fn should_come_before(a: &LedgerEvent, b: &LedgerEvent) -> bool {
        Self::from_event(a) < Self::from_event(b)
    }
}

/// Sort events into the canonical ledger order. The sort is stable.
pub fn sort_events_canonical(events: &mut [LedgerEvent]) {
    events.sort_by_cached_key(EventOrderingKey::from_event);
}
