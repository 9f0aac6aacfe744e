//! Folds per-member results into checkpoint-level sums.

use crate::domain::{
    Amount, MinipoolCounts, NetworkCheckpoint, Node, NodeNetworkCheckpoint, SignedAmount,
};

/// Accumulates participant results for one network checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointTotals {
    pub total_underlying: Amount,
    pub participants_with_balance: u64,
    pub total_reward_since_previous: SignedAmount,
    pub participants_with_reward_since_previous: u64,
    pub total_reward: SignedAmount,
    pub participants_with_reward: u64,
}

impl CheckpointTotals {
    /// A participant without balance: only its historical reward counts.
    pub fn record_dormant(&mut self, cumulative_reward: SignedAmount) {
        self.record_cumulative(cumulative_reward);
    }

    /// A participant that received a checkpoint this cycle.
    pub fn record_active(
        &mut self,
        underlying_balance: Amount,
        reward_since_previous: SignedAmount,
        cumulative_reward: SignedAmount,
    ) {
        self.total_underlying = self.total_underlying.saturating_add(underlying_balance);
        self.participants_with_balance += 1;

        self.total_reward_since_previous = self
            .total_reward_since_previous
            .saturating_add(reward_since_previous);
        if reward_since_previous.is_positive() {
            self.participants_with_reward_since_previous += 1;
        }

        self.record_cumulative(cumulative_reward);
    }

    fn record_cumulative(&mut self, cumulative_reward: SignedAmount) {
        if cumulative_reward.is_zero() {
            return;
        }
        self.total_reward = self.total_reward.saturating_add(cumulative_reward);
        self.participants_with_reward += 1;
    }

    /// Write the sums into `checkpoint`. `checkpoints_with_reward` continues
    /// from `previous`.
    pub fn apply(&self, checkpoint: &mut NetworkCheckpoint, previous: Option<&NetworkCheckpoint>) {
        checkpoint.total_underlying = self.total_underlying;
        checkpoint.participants_with_balance = self.participants_with_balance;
        checkpoint.total_reward_since_previous = self.total_reward_since_previous;
        checkpoint.participants_with_reward_since_previous =
            self.participants_with_reward_since_previous;
        checkpoint.total_reward = self.total_reward;
        checkpoint.participants_with_reward = self.participants_with_reward;

        let carried = previous.map(|p| p.checkpoints_with_reward).unwrap_or(0);
        checkpoint.checkpoints_with_reward =
            carried.saturating_add(self.participants_with_reward_since_previous);
    }
}

/// Accumulates node state for one node network checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeTotals {
    pub nodes_registered: u64,
    pub nodes_with_stake: u64,
    pub total_staked: Amount,
    pub total_staked_value: Amount,
    pub total_slashed: Amount,
    pub total_claimed_rewards: Amount,
    pub minipools: MinipoolCounts,
    pub nodes_with_active_minipools: u64,
    pub oracle_nodes: u64,
    pub total_oracle_node_bond: Amount,
}

impl NodeTotals {
    pub fn record(&mut self, node: &Node, staked_value: Amount) {
        self.nodes_registered += 1;
        if !node.staked.is_zero() {
            self.nodes_with_stake += 1;
        }
        self.total_staked = self.total_staked.saturating_add(node.staked);
        self.total_staked_value = self.total_staked_value.saturating_add(staked_value);
        self.total_slashed = self.total_slashed.saturating_add(node.total_slashed);
        self.total_claimed_rewards = self
            .total_claimed_rewards
            .saturating_add(node.total_claimed_rewards);

        let counts = &node.minipools;
        self.minipools.queued += counts.queued;
        self.minipools.staking += counts.staking;
        self.minipools.withdrawable += counts.withdrawable;
        self.minipools.total_finalized += counts.total_finalized;
        if counts.active() > 0 {
            self.nodes_with_active_minipools += 1;
        }
        if node.is_oracle_node {
            self.oracle_nodes += 1;
            self.total_oracle_node_bond = self
                .total_oracle_node_bond
                .saturating_add(node.oracle_node_bond);
        }
    }

    pub fn apply(&self, checkpoint: &mut NodeNetworkCheckpoint) {
        checkpoint.nodes_registered = self.nodes_registered;
        checkpoint.nodes_with_stake = self.nodes_with_stake;
        checkpoint.total_staked = self.total_staked;
        checkpoint.total_staked_value = self.total_staked_value;
        checkpoint.total_slashed = self.total_slashed;
        checkpoint.total_claimed_rewards = self.total_claimed_rewards;
        checkpoint.queued_minipools = self.minipools.queued;
        checkpoint.staking_minipools = self.minipools.staking;
        checkpoint.withdrawable_minipools = self.minipools.withdrawable;
        checkpoint.total_finalized_minipools = self.minipools.total_finalized;
        checkpoint.nodes_with_active_minipools = self.nodes_with_active_minipools;
        checkpoint.oracle_nodes = self.oracle_nodes;
        checkpoint.total_oracle_node_bond = self.total_oracle_node_bond;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, EventMeta};

    fn sa(v: &str) -> SignedAmount {
        SignedAmount::from_str_canonical(v).unwrap()
    }

    #[test]
    fn test_dormant_participants_count_toward_history_only() {
        let mut totals = CheckpointTotals::default();
        totals.record_active(Amount::from(300), sa("100"), sa("100"));
        totals.record_dormant(sa("40"));
        totals.record_dormant(SignedAmount::ZERO);

        assert_eq!(totals.total_underlying, Amount::from(300));
        assert_eq!(totals.participants_with_balance, 1);
        assert_eq!(totals.total_reward, sa("140"));
        assert_eq!(totals.participants_with_reward, 2);
        assert_eq!(totals.participants_with_reward_since_previous, 1);
    }

    #[test]
    fn test_losses_do_not_count_as_rewarded() {
        let mut totals = CheckpointTotals::default();
        totals.record_active(Amount::from(10), sa("-5"), sa("-5"));
        assert_eq!(totals.total_reward_since_previous, sa("-5"));
        assert_eq!(totals.participants_with_reward_since_previous, 0);
        assert_eq!(totals.participants_with_reward, 1);
    }

    #[test]
    fn test_node_totals_fold_minipools_and_oracle_members() {
        let meta = EventMeta::new(1, 1, 0, "0x1");
        let mut oracle = Node::new(Address::parse(&format!("0x{:040x}", 1)).unwrap(), &meta);
        oracle.is_oracle_node = true;
        oracle.oracle_node_bond = Amount::from(1_750);
        oracle.minipools.staking = 2;
        oracle.minipools.total_finalized = 1;

        let mut retired = Node::new(Address::parse(&format!("0x{:040x}", 2)).unwrap(), &meta);
        retired.minipools.total_finalized = 3;

        let mut totals = NodeTotals::default();
        totals.record(&oracle, Amount::ZERO);
        totals.record(&retired, Amount::ZERO);

        let mut checkpoint =
            NodeNetworkCheckpoint::new("n".to_string(), None, &meta, Amount::from(1));
        totals.apply(&mut checkpoint);
        assert_eq!(checkpoint.staking_minipools, 2);
        assert_eq!(checkpoint.total_finalized_minipools, 4);
        assert_eq!(checkpoint.nodes_with_active_minipools, 1);
        assert_eq!(checkpoint.oracle_nodes, 1);
        assert_eq!(checkpoint.total_oracle_node_bond, Amount::from(1_750));
    }

    #[test]
    fn test_checkpoints_with_reward_continue_from_previous() {
        let meta = EventMeta::new(1, 1, 0, "0x1");
        let mut previous = NetworkCheckpoint::new("a".to_string(), None, &meta, Amount::from(1));
        previous.checkpoints_with_reward = 4;

        let mut totals = CheckpointTotals::default();
        totals.record_active(Amount::from(1), sa("1"), sa("1"));
        totals.record_active(Amount::from(1), sa("2"), sa("2"));

        let mut current =
            NetworkCheckpoint::new("b".to_string(), Some("a".to_string()), &meta, Amount::from(1));
        totals.apply(&mut current, Some(&previous));
        assert_eq!(current.checkpoints_with_reward, 6);
    }
}
