//! The protocol root and pool-level state.

use crate::domain::{Address, Amount, Entity, EventMeta};
use serde::{Deserialize, Serialize};

/// Well-known id of the singleton protocol root.
pub const PROTOCOL_ROOT_ID: &str = "LIQUID-STAKING-PROTOCOL-ROOT";

/// Well-known id of the singleton pool snapshot.
pub const POOL_SNAPSHOT_ID: &str = "LIQUID-STAKING-POOL";

/// Registry of every known participant and node plus the chain heads.
///
/// Loaded (or created) at the start of each event and passed explicitly
/// through processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRoot {
    pub id: String,
    /// Append-only, insertion ordered.
    pub participants: Vec<Address>,
    /// Append-only, insertion ordered.
    pub nodes: Vec<Address>,
    pub last_network_checkpoint_ref: Option<String>,
    pub last_node_checkpoint_ref: Option<String>,
}

impl ProtocolRoot {
    pub fn new() -> Self {
        Self {
            id: PROTOCOL_ROOT_ID.to_string(),
            participants: Vec::new(),
            nodes: Vec::new(),
            last_network_checkpoint_ref: None,
            last_node_checkpoint_ref: None,
        }
    }

    /// Register a participant. The zero address and duplicates are ignored.
    ///
    /// Returns true if the participant was newly added.
    pub fn add_participant(&mut self, id: &Address) -> bool {
        if id.is_zero() || self.participants.contains(id) {
            return false;
        }
        self.participants.push(id.clone());
        true
    }

    /// Register a node. Returns true if the node was newly added.
    pub fn add_node(&mut self, id: &Address) -> bool {
        if id.is_zero() || self.nodes.contains(id) {
            return false;
        }
        self.nodes.push(id.clone());
        true
    }
}

impl Default for ProtocolRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for ProtocolRoot {
    const KIND: &'static str = "protocol_root";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Latest pool-level figures, refreshed on every transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub id: String,
    pub exchange_rate: Amount,
    pub pool_balance: Amount,
    pub excess_pool_balance: Amount,
    pub underlying_in_token_contract: Amount,
    /// Sum of all minted tokens seen so far.
    pub minted_supply: Amount,
    pub block_number: u64,
    pub block_time: i64,
}

impl PoolSnapshot {
    pub fn new(meta: &EventMeta) -> Self {
        Self {
            id: POOL_SNAPSHOT_ID.to_string(),
            exchange_rate: Amount::ZERO,
            pool_balance: Amount::ZERO,
            excess_pool_balance: Amount::ZERO,
            underlying_in_token_contract: Amount::ZERO,
            minted_supply: Amount::ZERO,
            block_number: meta.block_number,
            block_time: meta.block_time,
        }
    }
}

impl Entity for PoolSnapshot {
    const KIND: &'static str = "pool_snapshot";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn test_add_participant_dedups_and_keeps_order() {
        let mut root = ProtocolRoot::new();
        assert!(root.add_participant(&addr(2)));
        assert!(root.add_participant(&addr(1)));
        assert!(!root.add_participant(&addr(2)));
        assert_eq!(root.participants, vec![addr(2), addr(1)]);
    }

    #[test]
    fn test_zero_address_never_registered() {
        let mut root = ProtocolRoot::new();
        assert!(!root.add_participant(&Address::zero()));
        assert!(!root.add_node(&Address::zero()));
        assert!(root.participants.is_empty());
        assert!(root.nodes.is_empty());
    }
}
