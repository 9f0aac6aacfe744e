//! Persistence for ledger records.
//!
//! This module provides:
//! - The `EntityStore` contract and per-event `WriteBatch`
//! - `UnitOfWork`, the read-your-writes overlay used by event handlers
//! - SQLite (`Repository`) and in-memory (`MemoryStore`) stores
//! - Database initialization and migrations

pub mod memory;
pub mod migrations;
pub mod repo;
pub mod store;
pub mod unit_of_work;

pub use memory::MemoryStore;
pub use migrations::init_db;
pub use repo::Repository;
pub use store::{load_entity, EntityStore, ProcessedEvent, StoreError, WriteBatch};
pub use unit_of_work::UnitOfWork;
