//! Protocol-wide checkpoints and the chain contract they share.

use crate::domain::{Amount, Entity, EventMeta, SignedAmount};
use serde::{Deserialize, Serialize};

/// A record that is a link in a doubly-linked, append-only checkpoint chain.
pub trait ChainCheckpoint: Entity {
    fn previous_ref(&self) -> Option<&str>;

    fn next_ref(&self) -> Option<&str>;

    fn set_next_ref(&mut self, next: String);

    /// Replace every running total that is still at its default with the
    /// value carried by `previous`. Since-previous deltas and point-in-time
    /// observations are left alone.
    fn coerce_zero_running_totals(&mut self, previous: &Self);

    /// Recompute the checkpoint-level averages from the totals.
    fn compute_averages(&mut self);
}

/// Overwrite `current` with `previous` when `current` is at its default and
/// `previous` is not.
pub fn carry_forward<T: Copy + Default + PartialEq>(current: &mut T, previous: T) {
    if *current == T::default() && previous != T::default() {
        *current = previous;
    }
}

/// Protocol-wide snapshot produced by each balance update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCheckpoint {
    pub id: String,
    pub previous_checkpoint_ref: Option<String>,
    pub next_checkpoint_ref: Option<String>,

    /// Token to underlying rate effective at this checkpoint.
    pub exchange_rate: Amount,
    pub underlying_waiting_in_pool: Amount,
    pub underlying_in_token_contract: Amount,
    pub underlying_actively_staking: Amount,
    pub underlying_in_protocol: Amount,
    pub token_supply: Amount,

    // Point-in-time observations.
    pub total_underlying: Amount,
    pub participants_with_balance: u64,

    // Since the previous checkpoint.
    pub total_reward_since_previous: SignedAmount,
    pub participants_with_reward_since_previous: u64,
    pub average_reward_since_previous: SignedAmount,

    // Running totals.
    pub total_reward: SignedAmount,
    pub participants_with_reward: u64,
    pub checkpoints_with_reward: u64,
    pub average_reward_per_participant: SignedAmount,
    pub average_checkpoints_with_reward_per_participant: u64,
    pub average_reward_per_checkpoint: SignedAmount,

    pub block_number: u64,
    pub block_time: i64,
}

impl NetworkCheckpoint {
    /// A fresh checkpoint shell with every aggregate at its default.
    pub fn new(
        id: String,
        previous_checkpoint_ref: Option<String>,
        meta: &EventMeta,
        exchange_rate: Amount,
    ) -> Self {
        Self {
            id,
            previous_checkpoint_ref,
            next_checkpoint_ref: None,
            exchange_rate,
            underlying_waiting_in_pool: Amount::ZERO,
            underlying_in_token_contract: Amount::ZERO,
            underlying_actively_staking: Amount::ZERO,
            underlying_in_protocol: Amount::ZERO,
            token_supply: Amount::ZERO,
            total_underlying: Amount::ZERO,
            participants_with_balance: 0,
            total_reward_since_previous: SignedAmount::ZERO,
            participants_with_reward_since_previous: 0,
            average_reward_since_previous: SignedAmount::ZERO,
            total_reward: SignedAmount::ZERO,
            participants_with_reward: 0,
            checkpoints_with_reward: 0,
            average_reward_per_participant: SignedAmount::ZERO,
            average_checkpoints_with_reward_per_participant: 0,
            average_reward_per_checkpoint: SignedAmount::ZERO,
            block_number: meta.block_number,
            block_time: meta.block_time,
        }
    }
}

impl Entity for NetworkCheckpoint {
    const KIND: &'static str = "network_checkpoint";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ChainCheckpoint for NetworkCheckpoint {
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
        carry_forward(&mut self.total_reward, previous.total_reward);
        carry_forward(&mut self.participants_with_reward, previous.participants_with_reward);
        carry_forward(&mut self.checkpoints_with_reward, previous.checkpoints_with_reward);
    }

    fn compute_averages(&mut self) {
        // Since previous: split over the participants that earned, or report
        // the total as-is when nobody had a positive delta.
        if self.total_reward_since_previous.is_positive() {
            self.average_reward_since_previous = self
                .total_reward_since_previous
                .checked_div_count(self.participants_with_reward_since_previous)
                .unwrap_or(self.total_reward_since_previous);
        }

        if let Some(avg) = self
            .total_reward
            .checked_div_count(self.participants_with_reward)
        {
            self.average_reward_per_participant = avg;
        }

        if self.checkpoints_with_reward >= 1 && self.participants_with_reward >= 1 {
            self.average_checkpoints_with_reward_per_participant =
                self.checkpoints_with_reward / self.participants_with_reward;
        }

        if self.total_reward.is_positive()
            && self.average_checkpoints_with_reward_per_participant >= 1
        {
            if let Some(avg) = self
                .average_reward_per_participant
                .checked_div_count(self.average_checkpoints_with_reward_per_participant)
            {
                self.average_reward_per_checkpoint = avg;
            }
        }
    }
}
