//! Domain primitives: Address, EventId, EventMeta.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The sentinel address used for mints (as sender) and burns (as receiver).
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Separator between a network checkpoint id and a member id.
const CHECKPOINT_MEMBER_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be 20 bytes of hex: {0}")]
    InvalidHex(String),
}

/// Account address: `0x`-prefixed, 20 bytes, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address.
    ///
    /// # Errors
    /// Returns an error if the string is not `0x` followed by 40 hex characters.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
        match hex::decode(body) {
            Ok(bytes) if bytes.len() == 20 => Ok(Address(format!("0x{}", body.to_lowercase()))),
            _ => Err(AddressParseError::InvalidHex(s.to_string())),
        }
    }

    pub fn zero() -> Self {
        Address(ZERO_ADDRESS.to_string())
    }

    /// True for the mint/burn sentinel, which never becomes a participant.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an event-derived entity: `"{txHash}-{logIndex}"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(tx_hash: &str, log_index: u64) -> Self {
        EventId(format!("{}-{}", tx_hash.trim().to_lowercase(), log_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a per-member checkpoint: `"{networkCheckpointId} - {memberId}"`.
pub fn member_checkpoint_id(network_checkpoint_id: &str, member: &Address) -> String {
    format!(
        "{}{}{}",
        network_checkpoint_id,
        CHECKPOINT_MEMBER_SEPARATOR,
        member.as_str()
    )
}

/// Block and transaction metadata carried by every ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub block_number: u64,
    /// Block timestamp in seconds since Unix epoch.
    pub block_time: i64,
    pub log_index: u64,
    pub tx_hash: String,
}

impl EventMeta {
    pub fn new(
        block_number: u64,
        block_time: i64,
        log_index: u64,
        tx_hash: impl Into<String>,
    ) -> Self {
        Self {
            block_number,
            block_time,
            log_index,
            tx_hash: tx_hash.into(),
        }
    }

    /// The id shared by every entity derived from this event.
    ///
    /// Returns `None` when the transaction hash is missing.
    pub fn event_id(&self) -> Option<EventId> {
        if self.tx_hash.trim().is_empty() {
            return None;
        }
        Some(EventId::new(&self.tx_hash, self.log_index))
    }
}
