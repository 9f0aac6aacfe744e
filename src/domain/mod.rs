//! Domain types for the liquid-staking ledger.
//!
//! This module provides:
//! - Fixed-point `Amount` / `SignedAmount` backed by alloy-primitives
//! - Domain primitives: Address, EventId, EventMeta
//! - Inbound ledger events and their canonical ordering
//! - Persisted records: participants, nodes, minipools, checkpoints, transactions

pub mod amount;
pub mod checkpoint;
pub mod entity;
pub mod event;
pub mod minipool;
pub mod node;
pub mod ordering;
pub mod participant;
pub mod primitives;
pub mod protocol;
pub mod transaction;

pub use amount::{signed_diff, Amount, AmountParseError, SignedAmount};
pub use checkpoint::{ChainCheckpoint, NetworkCheckpoint};
pub use entity::Entity;
pub use event::{
    BalanceSnapshotUpdated, LedgerEvent, MinipoolChanged, MinipoolCreated, NodeRegistered,
    OracleNodeJoined, OracleNodeRemoved, PriceUpdated, RewardClaimed, StakeChanged,
    TokenTransferred,
};
pub use minipool::{Minipool, MinipoolStatus, Transition};
pub use node::{
    MinipoolCounts, Node, NodeCheckpoint, NodeNetworkCheckpoint, StakeKind, StakeTransaction,
};
pub use ordering::{sort_events_canonical, EventOrderingKey};
pub use participant::{Participant, ParticipantCheckpoint};
pub use primitives::{
    member_checkpoint_id, Address, AddressParseError, EventId, EventMeta, ZERO_ADDRESS,
};
pub use protocol::{PoolSnapshot, ProtocolRoot, POOL_SNAPSHOT_ID, PROTOCOL_ROOT_ID};
pub use transaction::{ClaimerType, RewardClaim, TokenTransaction};
