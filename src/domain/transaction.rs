//! Indexed token transfers and reward claims.

use crate::domain::{Address, Amount, Entity};
use serde::{Deserialize, Serialize};

/// A recorded transfer of the yield-bearing token.
///
/// Its existence under the event id is what makes transfer handling idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub id: String,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Rate applied to both sides of the transfer.
    pub exchange_rate: Amount,
    pub block_number: u64,
    pub block_time: i64,
    pub tx_hash: String,
}

impl Entity for TokenTransaction {
    const KIND: &'static str = "token_transaction";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Who claimed a reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimerType {
    Node,
    ProtocolDao,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaim {
    pub id: String,
    pub claimant: Address,
    pub claiming_contract: Address,
    pub claimer_type: ClaimerType,
    pub amount: Amount,
    /// `amount` valued at the latest committed collateral price.
    pub underlying_amount: Amount,
    pub block_number: u64,
    pub block_time: i64,
}

impl Entity for RewardClaim {
    const KIND: &'static str = "reward_claim";

    fn id(&self) -> &str {
        &self.id
    }
}
