use crate::domain::{Amount, Participant};
use crate::engine::reward::to_underlying;

/// What [`apply_transfer`] did to a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEffect {
    Applied,
    /// The debit exceeded the balance; the balance was floored at zero.
    Floored,
    /// The participant is the zero address; nothing changed.
    Ignored,
}

/// Credit or debit `amount` tokens and revalue the balance at `rate`.
///
/// Debits never drive the balance negative. Must be called with the same
/// `rate` for both sides of a transfer.
pub fn apply_transfer(
    participant: &mut Participant,
    amount: Amount,
    rate: Amount,
    scale: Amount,
    is_credit: bool,
) -> TransferEffect {
    if participant.id.is_zero() {
        return TransferEffect::Ignored;
    }

    let effect = if is_credit {
        participant.token_balance = participant.token_balance.saturating_add(amount);
        TransferEffect::Applied
    } else if amount > participant.token_balance {
        participant.token_balance = Amount::ZERO;
        TransferEffect::Floored
    } else {
        participant.token_balance = participant.token_balance.saturating_sub(amount);
        TransferEffect::Applied
    };

    revalue(participant, rate, scale);
    effect
}

/// Recompute `underlying_balance` from the token balance. Zero when either the
/// rate or the balance is zero.
pub fn revalue(participant: &mut Participant, rate: Amount, scale: Amount) {
    participant.underlying_balance = if rate.is_zero() || participant.token_balance.is_zero() {
        Amount::ZERO
    } else {
        to_underlying(participant.token_balance, rate, scale)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, EventMeta};

    fn participant(n: u8) -> Participant {
        let id = Address::parse(&format!("0x{:040x}", n)).unwrap();
        Participant::new(id, &EventMeta::new(1, 1, 0, "0xaa"))
    }

    fn amt(v: u64) -> Amount {
        Amount::from(v)
    }

    #[test]
    fn test_credit_then_debit() {
        let mut p = participant(1);
        assert_eq!(apply_transfer(&mut p, amt(100), amt(2), amt(1), true), TransferEffect::Applied);
        assert_eq!(p.token_balance, amt(100));
        assert_eq!(p.underlying_balance, amt(200));

        assert_eq!(apply_transfer(&mut p, amt(40), amt(2), amt(1), false), TransferEffect::Applied);
        assert_eq!(p.token_balance, amt(60));
        assert_eq!(p.underlying_balance, amt(120));
    }

    #[test]
    fn test_overdraw_floors_at_zero() {
        let mut p = participant(1);
        apply_transfer(&mut p, amt(10), amt(2), amt(1), true);
        assert_eq!(apply_transfer(&mut p, amt(11), amt(2), amt(1), false), TransferEffect::Floored);
        assert!(p.token_balance.is_zero());
        assert!(p.underlying_balance.is_zero());
    }

    #[test]
    fn test_balance_never_negative_over_mixed_sequence() {
        let mut p = participant(3);
        let ops = [(5u64, true), (9, false), (3, true), (1, false), (100, false), (7, true)];
        for (amount, credit) in ops {
            apply_transfer(&mut p, amt(amount), amt(1), amt(1), credit);
            assert!(p.token_balance <= amt(15));
        }
        assert_eq!(p.token_balance, amt(7));
    }

    #[test]
    fn test_zero_address_is_ignored() {
        let mut p = Participant::new(Address::zero(), &EventMeta::new(1, 1, 0, "0xaa"));
        assert_eq!(apply_transfer(&mut p, amt(5), amt(1), amt(1), true), TransferEffect::Ignored);
        assert!(p.token_balance.is_zero());
    }

    #[test]
    fn test_unknown_rate_values_at_zero() {
        let mut p = participant(2);
        apply_transfer(&mut p, amt(50), Amount::ZERO, amt(1), true);
        assert_eq!(p.token_balance, amt(50));
        assert!(p.underlying_balance.is_zero());
    }
}
