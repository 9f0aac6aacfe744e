//! Fixed-point integer amounts backed by alloy-primitives.
//!
//! All balances are wei-denominated integers. Exchange rates are integers
//! scaled by a configurable unit (one whole unit of the underlying asset,
//! `10^18` on mainnet). Values are persisted as canonical decimal strings.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an amount string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: {0}")]
pub struct AmountParseError(pub String);

/// Non-negative fixed-point integer amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub fn new(value: U256) -> Self {
        Amount(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Amount(U256::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    /// Subtract, flooring at zero instead of underflowing.
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    /// `self * numerator / denominator`, truncating. Zero when the denominator is zero.
    pub fn mul_div(self, numerator: Amount, denominator: Amount) -> Amount {
        self.0
            .saturating_mul(numerator.0)
            .checked_div(denominator.0)
            .map(Amount)
            .unwrap_or(Amount::ZERO)
    }

    /// Truncating division by a count. Zero when `count` is zero.
    pub fn div_count(self, count: u64) -> Amount {
        self.0
            .checked_div(U256::from(count))
            .map(Amount)
            .unwrap_or(Amount::ZERO)
    }

    /// Parse from a decimal string.
    ///
    /// # Errors
    /// Returns an error if the string is not a non-negative decimal integer.
    pub fn from_str_canonical(s: &str) -> Result<Self, AmountParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError(s.to_string()));
        }
        U256::from_str_radix(trimmed, 10)
            .map(Amount)
            .map_err(|_| AmountParseError(s.to_string()))
    }

    pub fn to_canonical_string(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str_canonical(&s).map_err(serde::de::Error::custom)
    }
}

/// Signed fixed-point integer amount, used for reward deltas and running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignedAmount(I256);

impl SignedAmount {
    pub const ZERO: SignedAmount = SignedAmount(I256::ZERO);

    pub fn new(value: I256) -> Self {
        SignedAmount(value)
    }

    /// Lift an unsigned amount. Saturates at `I256::MAX`.
    pub fn from_amount(amount: Amount) -> Self {
        SignedAmount(I256::try_from(amount.0).unwrap_or(I256::MAX))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn saturating_add(self, rhs: SignedAmount) -> SignedAmount {
        SignedAmount(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: SignedAmount) -> SignedAmount {
        SignedAmount(self.0.saturating_sub(rhs.0))
    }

    /// Truncating division by a count. `None` when `count` is zero.
    pub fn checked_div_count(self, count: u64) -> Option<SignedAmount> {
        let divisor = I256::try_from(U256::from(count)).ok()?;
        self.0.checked_div(divisor).map(SignedAmount)
    }

    /// Parse from a decimal string with an optional leading `-`.
    ///
    /// # Errors
    /// Returns an error if the string is not a decimal integer.
    pub fn from_str_canonical(s: &str) -> Result<Self, AmountParseError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError(s.to_string()));
        }
        I256::from_dec_str(trimmed)
            .map(SignedAmount)
            .map_err(|_| AmountParseError(s.to_string()))
    }

    pub fn to_canonical_string(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SignedAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<Amount> for SignedAmount {
    fn from(value: Amount) -> Self {
        SignedAmount::from_amount(value)
    }
}

impl Serialize for SignedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for SignedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SignedAmount::from_str_canonical(&s).map_err(serde::de::Error::custom)
    }
}

/// Signed difference `a - b` of two unsigned amounts.
pub fn signed_diff(a: Amount, b: Amount) -> SignedAmount {
    SignedAmount::from_amount(a).saturating_sub(SignedAmount::from_amount(b))
}
