//! Token holders and their per-checkpoint snapshots.

use crate::domain::{Address, Amount, Entity, EventMeta, SignedAmount};
use serde::{Deserialize, Serialize};

/// A holder of the yield-bearing token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Address,
    pub token_balance: Amount,
    /// `token_balance` valued in the underlying asset at the last known rate.
    pub underlying_balance: Amount,
    /// Lifetime reward (or loss). Adjusted every checkpoint, never reset.
    pub cumulative_reward: SignedAmount,
    /// Id of the most recent [`ParticipantCheckpoint`] for this participant.
    pub last_checkpoint_ref: Option<String>,
    pub first_seen_block: u64,
    pub first_seen_time: i64,
}

impl Participant {
    pub fn new(id: Address, meta: &EventMeta) -> Self {
        Self {
            id,
            token_balance: Amount::ZERO,
            underlying_balance: Amount::ZERO,
            cumulative_reward: SignedAmount::ZERO,
            last_checkpoint_ref: None,
            first_seen_block: meta.block_number,
            first_seen_time: meta.block_time,
        }
    }

    pub fn has_balance(&self) -> bool {
        !self.token_balance.is_zero()
    }
}

impl Entity for Participant {
    const KIND: &'static str = "participant";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// A participant's balances at one network checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCheckpoint {
    /// `"{networkCheckpointId} - {participantId}"`.
    pub id: String,
    pub participant: Address,
    pub network_checkpoint: String,
    pub token_balance: Amount,
    pub underlying_balance: Amount,
    /// Rate the balances were valued at.
    pub exchange_rate: Amount,
    pub reward_since_previous: SignedAmount,
    /// `Participant::cumulative_reward` right after this delta was applied.
    pub cumulative_reward: SignedAmount,
    pub block_number: u64,
    pub block_time: i64,
}

impl Entity for ParticipantCheckpoint {
    const KIND: &'static str = "participant_checkpoint";

    fn id(&self) -> &str {
        &self.id
    }
}
