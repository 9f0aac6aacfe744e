//! Reward attribution between two balance observations.
//!
//! A naive `current_underlying - previous_underlying` would count principal
//! moved in or out as yield. The calculator splits on how the token balance
//! moved and values the moved tokens at the *previous* rate, so only the
//! appreciation of the retained (or received) position is attributed.

use crate::domain::{signed_diff, Amount, SignedAmount};

/// A participant's position at one point in the checkpoint history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceObservation {
    pub token_balance: Amount,
    pub underlying_balance: Amount,
    pub exchange_rate: Amount,
}

impl BalanceObservation {
    pub fn new(token_balance: Amount, underlying_balance: Amount, exchange_rate: Amount) -> Self {
        Self {
            token_balance,
            underlying_balance,
            exchange_rate,
        }
    }
}

/// Value `tokens` in the underlying asset: `tokens * rate / scale`, truncating.
pub fn to_underlying(tokens: Amount, rate: Amount, scale: Amount) -> Amount {
    tokens.mul_div(rate, scale)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDeltaCalculator {
    scale: Amount,
}

impl RewardDeltaCalculator {
    /// `scale` is one unit of the underlying asset in rate terms.
    pub fn new(scale: Amount) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> Amount {
        self.scale
    }

    /// A rate that is unknown (zero) is treated as one unit.
    pub fn effective_rate(&self, rate: Amount) -> Amount {
        if rate.is_zero() {
            self.scale
        } else {
            rate
        }
    }

    /// Signed reward accrued between `previous` and `current`.
    ///
    /// Zero when there is no previous token balance to compare against.
    pub fn compute(
        &self,
        current: &BalanceObservation,
        previous: &BalanceObservation,
    ) -> SignedAmount {
        if previous.token_balance.is_zero() {
            return SignedAmount::ZERO;
        }

        let previous_rate = self.effective_rate(previous.exchange_rate);
        let current_underlying = SignedAmount::from_amount(current.underlying_balance);
        let previous_underlying = SignedAmount::from_amount(previous.underlying_balance);

        if current.token_balance == previous.token_balance {
            return signed_diff(current.underlying_balance, previous.underlying_balance);
        }

        if current.token_balance < previous.token_balance {
            let transferred = previous.token_balance.saturating_sub(current.token_balance);
            let transferred_value =
                SignedAmount::from_amount(to_underlying(transferred, previous_rate, self.scale));
            // current - (previous - transferred_value)
            return current_underlying
                .saturating_sub(previous_underlying.saturating_sub(transferred_value));
        }

        let received = current.token_balance.saturating_sub(previous.token_balance);
        let received_value =
            SignedAmount::from_amount(to_underlying(received, previous_rate, self.scale));
        current_underlying
            .saturating_sub(received_value)
            .saturating_sub(previous_underlying)
    }
}
