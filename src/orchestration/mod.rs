//! Event handling: dispatch, idempotency and per-event atomic commits.

pub mod indexer;
pub mod reconciliation;

mod balances;
mod minipools;
mod nodes;
mod rewards;
mod transfers;

pub use indexer::{BatchItem, EventOutcome, IndexError, Indexer, IndexerSettings};
pub use reconciliation::{reconcile, ReconciliationReport};
