//! Node operators, their collateral movements and the node checkpoint chain.

use crate::domain::checkpoint::carry_forward;
use crate::domain::{Address, Amount, ChainCheckpoint, Entity, EventMeta, MinipoolStatus};
use serde::{Deserialize, Serialize};

/// A registered node operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: Address,
    /// Collateral currently staked.
    pub staked: Amount,
    pub total_slashed: Amount,
    pub total_claimed_rewards: Amount,
    pub last_checkpoint_ref: Option<String>,
    pub registered_block: u64,
    pub registered_time: i64,

    #[serde(default)]
    pub minipools: MinipoolCounts,
    #[serde(default)]
    pub is_oracle_node: bool,
    /// Bond posted when joining the oracle DAO, zero once removed.
    #[serde(default)]
    pub oracle_node_bond: Amount,
    /// Block time of the last oracle DAO membership change.
    #[serde(default)]
    pub oracle_node_block_time: Option<i64>,
}

/// Minipools owned by a node, by lifecycle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinipoolCounts {
    /// Created and waiting for a deposit.
    pub queued: u64,
    pub staking: u64,
    pub withdrawable: u64,
    /// Running total, never decremented.
    pub total_finalized: u64,
}

impl MinipoolCounts {
    /// Move one minipool out of `from` and into `to`. Counters floor at zero.
    pub fn shift(&mut self, from: MinipoolStatus, to: MinipoolStatus) {
        if let Some(slot) = self.slot(from) {
            *slot = slot.saturating_sub(1);
        }
        if let Some(slot) = self.slot(to) {
            *slot += 1;
        }
    }

    fn slot(&mut self, status: MinipoolStatus) -> Option<&mut u64> {
        match status {
            MinipoolStatus::Initialized => Some(&mut self.queued),
            MinipoolStatus::Staking => Some(&mut self.staking),
            MinipoolStatus::Withdrawable => Some(&mut self.withdrawable),
            MinipoolStatus::Finalized => Some(&mut self.total_finalized),
            MinipoolStatus::Destroyed => None,
        }
    }

    /// Minipools that have not been finalized or destroyed.
    pub fn active(&self) -> u64 {
        self.queued + self.staking + self.withdrawable
    }
}

impl Node {
    pub fn new(id: Address, meta: &EventMeta) -> Self {
        Self {
            id,
            staked: Amount::ZERO,
            total_slashed: Amount::ZERO,
            total_claimed_rewards: Amount::ZERO,
            last_checkpoint_ref: None,
            registered_block: meta.block_number,
            registered_time: meta.block_time,
            minipools: MinipoolCounts::default(),
            is_oracle_node: false,
            oracle_node_bond: Amount::ZERO,
            oracle_node_block_time: None,
        }
    }
}

impl Entity for Node {
    const KIND: &'static str = "node";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeKind {
    Deposited,
    Withdrawn,
    Slashed,
}

impl std::fmt::Display for StakeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakeKind::Deposited => write!(f, "deposited"),
            StakeKind::Withdrawn => write!(f, "withdrawn"),
            StakeKind::Slashed => write!(f, "slashed"),
        }
    }
}

/// One collateral movement on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeTransaction {
    pub id: String,
    pub node: Address,
    pub kind: StakeKind,
    pub amount: Amount,
    /// `amount` valued at the latest committed collateral price.
    pub underlying_amount: Amount,
    pub block_number: u64,
    pub block_time: i64,
}

impl Entity for StakeTransaction {
    const KIND: &'static str = "stake_transaction";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A node's state at one node network checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCheckpoint {
    /// `"{nodeNetworkCheckpointId} - {nodeId}"`.
    pub id: String,
    pub node: Address,
    pub network_checkpoint: String,
    pub staked: Amount,
    pub staked_value: Amount,
    pub total_slashed: Amount,
    pub total_claimed_rewards: Amount,
    #[serde(default)]
    pub minipools: MinipoolCounts,
    #[serde(default)]
    pub is_oracle_node: bool,
    #[serde(default)]
    pub oracle_node_bond: Amount,
    pub block_number: u64,
    pub block_time: i64,
}

impl Entity for NodeCheckpoint {
    const KIND: &'static str = "node_checkpoint";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Protocol-wide node snapshot produced by each price update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeNetworkCheckpoint {
    pub id: String,
    pub previous_checkpoint_ref: Option<String>,
    pub next_checkpoint_ref: Option<String>,

    /// Collateral price in underlying units.
    pub price: Amount,

    // Point-in-time observations.
    pub nodes_registered: u64,
    pub nodes_with_stake: u64,
    pub total_staked: Amount,
    pub total_staked_value: Amount,
    #[serde(default)]
    pub queued_minipools: u64,
    #[serde(default)]
    pub staking_minipools: u64,
    #[serde(default)]
    pub withdrawable_minipools: u64,
    #[serde(default)]
    pub nodes_with_active_minipools: u64,
    #[serde(default)]
    pub oracle_nodes: u64,
    #[serde(default)]
    pub total_oracle_node_bond: Amount,

    // Running totals.
    pub total_slashed: Amount,
    pub total_claimed_rewards: Amount,
    #[serde(default)]
    pub total_finalized_minipools: u64,

    pub average_staked_per_node: Amount,
    #[serde(default)]
    pub average_oracle_node_bond: Amount,

    pub block_number: u64,
    pub block_time: i64,
}

impl NodeNetworkCheckpoint {
    pub fn new(
        id: String,
        previous_checkpoint_ref: Option<String>,
        meta: &EventMeta,
        price: Amount,
    ) -> Self {
        Self {
            id,
            previous_checkpoint_ref,
            next_checkpoint_ref: None,
            price,
            nodes_registered: 0,
            nodes_with_stake: 0,
            total_staked: Amount::ZERO,
            total_staked_value: Amount::ZERO,
            queued_minipools: 0,
            staking_minipools: 0,
            withdrawable_minipools: 0,
            nodes_with_active_minipools: 0,
            oracle_nodes: 0,
            total_oracle_node_bond: Amount::ZERO,
            total_slashed: Amount::ZERO,
            total_claimed_rewards: Amount::ZERO,
            total_finalized_minipools: 0,
            average_staked_per_node: Amount::ZERO,
            average_oracle_node_bond: Amount::ZERO,
            block_number: meta.block_number,
            block_time: meta.block_time,
        }
    }
}

impl Entity for NodeNetworkCheckpoint {
    const KIND: &'static str = "node_network_checkpoint";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ChainCheckpoint for NodeNetworkCheckpoint {
    fn previous_ref(&self) -> Option<&str> {
        self.previous_checkpoint_ref.as_deref()
    }

    fn next_ref(&self) -> Option<&str> {
        self.next_checkpoint_ref.as_deref()
    }

    fn set_next_ref(&mut self, next: String) {
        self.next_checkpoint_ref = Some(next);
    }

    fn coerce_zero_running_totals(&mut self, previous: &Self) {
        carry_forward(&mut self.total_slashed, previous.total_slashed);
        carry_forward(&mut self.total_claimed_rewards, previous.total_claimed_rewards);
        carry_forward(
            &mut self.total_finalized_minipools,
            previous.total_finalized_minipools,
        );
    }

    fn compute_averages(&mut self) {
        if self.nodes_with_stake >= 1 {
            self.average_staked_per_node = self.total_staked.div_count(self.nodes_with_stake);
        }
        if self.oracle_nodes >= 1 {
            self.average_oracle_node_bond =
                self.total_oracle_node_bond.div_count(self.oracle_nodes);
        }
    }
}
