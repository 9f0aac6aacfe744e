pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{JsonRpcOracle, MockOracle, OracleError, OracleReader};
pub use db::{init_db, EntityStore, MemoryStore, Repository};
pub use domain::{
    Address, Amount, EventMeta, LedgerEvent, NetworkCheckpoint, Participant,
    ParticipantCheckpoint, ProtocolRoot, SignedAmount,
};
pub use error::AppError;
pub use orchestration::{EventOutcome, IndexError, Indexer, IndexerSettings};
