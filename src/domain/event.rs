//! Inbound ledger events.
//!
//! These are the decoded shapes delivered by the ingestion host. Decoding of
//! the external ledger's log encoding happens upstream.

use crate::domain::{Address, Amount, EventId, EventMeta};
use serde::{Deserialize, Serialize};

/// The balance oracle reached consensus on new protocol-wide balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshotUpdated {
    pub meta: EventMeta,
    /// Total underlying held by the protocol.
    pub total_underlying: Amount,
    /// Underlying currently staked by validators.
    pub staking_underlying: Amount,
    /// Total supply of the yield-bearing token.
    pub token_supply: Amount,
}

/// The node-collateral price was updated (in underlying units, scaled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdated {
    pub meta: EventMeta,
    pub price: Amount,
}

/// A transfer of the yield-bearing token. Mints come from the zero address,
/// burns go to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransferred {
    pub meta: EventMeta,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistered {
    pub meta: EventMeta,
    pub node: Address,
}

/// Collateral staked, withdrawn or slashed on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeChanged {
    pub meta: EventMeta,
    pub node: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaimed {
    pub meta: EventMeta,
    pub claimant: Address,
    pub claiming_contract: Address,
    pub amount: Amount,
}

/// A node created a minipool, or destroyed one that never started staking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinipoolCreated {
    pub meta: EventMeta,
    pub minipool: Address,
    pub node: Address,
}

/// A minipool moved to its next lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinipoolChanged {
    pub meta: EventMeta,
    pub minipool: Address,
}

/// A node joined the oracle DAO, posting `bond` as collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleNodeJoined {
    pub meta: EventMeta,
    pub node: Address,
    pub bond: Amount,
}

/// A node left, or was kicked from, the oracle DAO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleNodeRemoved {
    pub meta: EventMeta,
    pub node: Address,
}

/// Every event the indexer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    BalanceSnapshotUpdated(BalanceSnapshotUpdated),
    PriceUpdated(PriceUpdated),
    TokenTransferred(TokenTransferred),
    NodeRegistered(NodeRegistered),
    StakeDeposited(StakeChanged),
    StakeWithdrawn(StakeChanged),
    StakeSlashed(StakeChanged),
    RewardClaimed(RewardClaimed),
    MinipoolCreated(MinipoolCreated),
    MinipoolDestroyed(MinipoolCreated),
    MinipoolStaking(MinipoolChanged),
    MinipoolWithdrawable(MinipoolChanged),
    MinipoolFinalized(MinipoolChanged),
    OracleNodeJoined(OracleNodeJoined),
    OracleNodeLeft(OracleNodeRemoved),
    OracleNodeKicked(OracleNodeRemoved),
}

impl LedgerEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            LedgerEvent::BalanceSnapshotUpdated(e) => &e.meta,
            LedgerEvent::PriceUpdated(e) => &e.meta,
            LedgerEvent::TokenTransferred(e) => &e.meta,
            LedgerEvent::NodeRegistered(e) => &e.meta,
            LedgerEvent::StakeDeposited(e)
            | LedgerEvent::StakeWithdrawn(e)
            | LedgerEvent::StakeSlashed(e) => &e.meta,
            LedgerEvent::RewardClaimed(e) => &e.meta,
            LedgerEvent::MinipoolCreated(e) | LedgerEvent::MinipoolDestroyed(e) => &e.meta,
            LedgerEvent::MinipoolStaking(e)
            | LedgerEvent::MinipoolWithdrawable(e)
            | LedgerEvent::MinipoolFinalized(e) => &e.meta,
            LedgerEvent::OracleNodeJoined(e) => &e.meta,
            LedgerEvent::OracleNodeLeft(e) | LedgerEvent::OracleNodeKicked(e) => &e.meta,
        }
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.meta().event_id()
    }

    /// Stable name used in logs and the processed-events audit table.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::BalanceSnapshotUpdated(_) => "balance_snapshot_updated",
            LedgerEvent::PriceUpdated(_) => "price_updated",
            LedgerEvent::TokenTransferred(_) => "token_transferred",
            LedgerEvent::NodeRegistered(_) => "node_registered",
            LedgerEvent::StakeDeposited(_) => "stake_deposited",
            LedgerEvent::StakeWithdrawn(_) => "stake_withdrawn",
            LedgerEvent::StakeSlashed(_) => "stake_slashed",
            LedgerEvent::RewardClaimed(_) => "reward_claimed",
            LedgerEvent::MinipoolCreated(_) => "minipool_created",
            LedgerEvent::MinipoolDestroyed(_) => "minipool_destroyed",
            LedgerEvent::MinipoolStaking(_) => "minipool_staking",
            LedgerEvent::MinipoolWithdrawable(_) => "minipool_withdrawable",
            LedgerEvent::MinipoolFinalized(_) => "minipool_finalized",
            LedgerEvent::OracleNodeJoined(_) => "oracle_node_joined",
            LedgerEvent::OracleNodeLeft(_) => "oracle_node_left",
            LedgerEvent::OracleNodeKicked(_) => "oracle_node_kicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_json_shape() {
        let json = serde_json::json!({
            "type": "token_transferred",
            "meta": {"block_number": 5, "block_time": 1000, "log_index": 2, "tx_hash": "0xaa"},
            "from": "0x0000000000000000000000000000000000000000",
            "to": "0x00000000000000000000000000000000000000b0",
            "amount": "100"
        });
        let event: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.kind(), "token_transferred");
        assert_eq!(event.event_id().unwrap().as_str(), "0xaa-2");
        match event {
            LedgerEvent::TokenTransferred(t) => {
                assert!(t.from.is_zero());
                assert_eq!(t.amount, Amount::from(100));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_stake_variants_share_payload() {
        let payload = StakeChanged {
            meta: EventMeta::new(1, 1, 0, "0x01"),
            node: Address::parse("0x00000000000000000000000000000000000000c0").unwrap(),
            amount: Amount::from(7),
        };
        let slashed = LedgerEvent::StakeSlashed(payload.clone());
        let json = serde_json::to_value(&slashed).unwrap();
        assert_eq!(json["type"], "stake_slashed");
        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, slashed);
        assert_eq!(back.meta(), &payload.meta);
    }

    #[test]
    fn test_oracle_node_kind_follows_variant_name() {
        let json = serde_json::json!({
            "type": "oracle_node_kicked",
            "meta": {"block_number": 9, "block_time": 90, "log_index": 0, "tx_hash": "0x09"},
            "node": "0x00000000000000000000000000000000000000d0"
        });
        let event: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.kind(), "oracle_node_kicked");
        assert!(matches!(event, LedgerEvent::OracleNodeKicked(_)));
    }
}
