//! Validator pools owned by nodes and their lifecycle.

use crate::domain::{Address, Entity, EventMeta};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a minipool.
///
/// The normal path is `Initialized -> Staking -> Withdrawable -> Finalized`.
/// `Destroyed` branches off `Initialized` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinipoolStatus {
    Initialized,
    Staking,
    Withdrawable,
    Finalized,
    Destroyed,
}

/// What applying a status change to a minipool would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The minipool moves to the target stage.
    Advance,
    /// The minipool is already at or past the target stage.
    AlreadyApplied,
    /// The target stage is not reachable from the current one.
    Invalid,
}

impl MinipoolStatus {
    fn stage(self) -> Option<u8> {
        match self {
            MinipoolStatus::Initialized => Some(0),
            MinipoolStatus::Staking => Some(1),
            MinipoolStatus::Withdrawable => Some(2),
            MinipoolStatus::Finalized => Some(3),
            MinipoolStatus::Destroyed => None,
        }
    }

    pub fn transition_to(self, target: MinipoolStatus) -> Transition {
        if target == MinipoolStatus::Destroyed {
            return match self {
                MinipoolStatus::Initialized => Transition::Advance,
                MinipoolStatus::Destroyed => Transition::AlreadyApplied,
                _ => Transition::Invalid,
            };
        }
        match (self.stage(), target.stage()) {
            (Some(current), Some(wanted)) if current >= wanted => Transition::AlreadyApplied,
            (Some(current), Some(wanted)) if current + 1 == wanted => Transition::Advance,
            _ => Transition::Invalid,
        }
    }
}

impl std::fmt::Display for MinipoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MinipoolStatus::Initialized => "initialized",
            MinipoolStatus::Staking => "staking",
            MinipoolStatus::Withdrawable => "withdrawable",
            MinipoolStatus::Finalized => "finalized",
            MinipoolStatus::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minipool {
    pub id: Address,
    pub node: Address,
    pub status: MinipoolStatus,
    pub created_block: u64,
    pub created_time: i64,
    /// Block of the last status change.
    pub status_block: u64,
    pub status_time: i64,
}

impl Minipool {
    pub fn new(id: Address, node: Address, meta: &EventMeta) -> Self {
        Self {
            id,
            node,
            status: MinipoolStatus::Initialized,
            created_block: meta.block_number,
            created_time: meta.block_time,
            status_block: meta.block_number,
            status_time: meta.block_time,
        }
    }

    pub fn set_status(&mut self, status: MinipoolStatus, meta: &EventMeta) {
        self.status = status;
        self.status_block = meta.block_number;
        self.status_time = meta.block_time;
    }
}

impl Entity for Minipool {
    const KIND: &'static str = "minipool";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::MinipoolStatus::*;

    #[test]
    fn test_lifecycle_advances_one_stage_at_a_time() {
        assert_eq!(Initialized.transition_to(Staking), Transition::Advance);
        assert_eq!(Staking.transition_to(Withdrawable), Transition::Advance);
        assert_eq!(Withdrawable.transition_to(Finalized), Transition::Advance);
        assert_eq!(Initialized.transition_to(Withdrawable), Transition::Invalid);
    }

    #[test]
    fn test_replayed_or_stale_transitions_are_already_applied() {
        assert_eq!(Staking.transition_to(Staking), Transition::AlreadyApplied);
        assert_eq!(Finalized.transition_to(Withdrawable), Transition::AlreadyApplied);
    }

    #[test]
    fn test_destroy_only_from_initialized() {
        assert_eq!(Initialized.transition_to(Destroyed), Transition::Advance);
        assert_eq!(Destroyed.transition_to(Destroyed), Transition::AlreadyApplied);
        assert_eq!(Staking.transition_to(Destroyed), Transition::Invalid);
        assert_eq!(Destroyed.transition_to(Staking), Transition::Invalid);
    }
}
