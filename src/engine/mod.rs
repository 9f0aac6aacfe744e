//! Pure computation for deterministic ledger logic.
//!
//! Nothing here touches the oracle. The chain manager only reads and stages
//! through a [`crate::db::UnitOfWork`].

pub mod balance;
pub mod chain;
pub mod reward;
pub mod totals;

pub use balance::{apply_transfer, revalue, TransferEffect};
pub use chain::{CheckpointChainManager, ChainError, Finalized, Pending, Populated};
pub use reward::{to_underlying, BalanceObservation, RewardDeltaCalculator};
pub use totals::{CheckpointTotals, NodeTotals};
