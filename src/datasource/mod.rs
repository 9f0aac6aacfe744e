//! Read-only oracle over the external ledger contracts.

use crate::domain::Amount;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod rpc;

pub use mock::MockOracle;
pub use rpc::JsonRpcOracle;

/// Point-in-time reads of protocol contract state.
///
/// Every read is pinned to a block so that all values used while processing
/// one event come from the same ledger state.
#[async_trait]
pub trait OracleReader: Send + Sync + fmt::Debug {
    /// Token to underlying rate, scaled by one unit of the underlying asset.
    async fn get_exchange_rate(&self, block: u64) -> Result<Amount, OracleError>;

    /// Underlying asset waiting in the deposit pool.
    async fn get_pool_balance(&self, block: u64) -> Result<Amount, OracleError>;

    /// Portion of the pool balance not yet assigned to nodes.
    async fn get_excess_pool_balance(&self, block: u64) -> Result<Amount, OracleError>;

    /// Underlying collateral held by the token contract.
    async fn get_total_collateral(&self, block: u64) -> Result<Amount, OracleError>;

    /// All four reads at `block`.
    async fn snapshot(&self, block: u64) -> Result<OracleSnapshot, OracleError> {
        Ok(OracleSnapshot {
            block,
            exchange_rate: self.get_exchange_rate(block).await?,
            pool_balance: self.get_pool_balance(block).await?,
            excess_pool_balance: self.get_excess_pool_balance(block).await?,
            total_collateral: self.get_total_collateral(block).await?,
        })
    }
}

/// A consistent set of oracle reads taken at one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleSnapshot {
    pub block: u64,
    pub exchange_rate: Amount,
    pub pool_balance: Amount,
    pub excess_pool_balance: Amount,
    pub total_collateral: Amount,
}

impl OracleSnapshot {
    /// Underlying held by the token contract itself, net of the excess
    /// that is still counted in the pool. Floors at zero.
    pub fn underlying_in_token_contract(&self) -> Amount {
        self.total_collateral.saturating_sub(self.excess_pool_balance)
    }
}

/// Error type for oracle reads.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// Network error (e.g., connection refused, timeout)
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP error from the RPC endpoint
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    /// Malformed response or RPC-level error
    #[error("Parse error: {0}")]
    Parse(String),
    /// The oracle has no value for the requested block
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_error_display() {
        let err = OracleError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = OracleError::Http {
            status: 503,
            message: "Service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Service unavailable");

        let err = OracleError::Unavailable("block 7".to_string());
        assert_eq!(err.to_string(), "Oracle unavailable: block 7");
    }

    #[test]
    fn test_oracle_error_is_std_error() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(OracleError::Parse("bad word".to_string()));
        assert_eq!(err.to_string(), "Parse error: bad word");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_underlying_in_token_contract_floors_at_zero() {
        let mut snapshot = OracleSnapshot {
            block: 1,
            exchange_rate: Amount::from(1),
            pool_balance: Amount::from(10),
            excess_pool_balance: Amount::from(4),
            total_collateral: Amount::from(30),
        };
        assert_eq!(snapshot.underlying_in_token_contract(), Amount::from(26));

        snapshot.excess_pool_balance = Amount::from(40);
        assert!(snapshot.underlying_in_token_contract().is_zero());
    }

    #[tokio::test]
    async fn test_snapshot_reads_every_value_at_one_block() {
        let oracle = MockOracle::new()
            .with_exchange_rate(Amount::from(3))
            .with_pool_balance(Amount::from(11))
            .with_excess_pool_balance(Amount::from(5))
            .with_total_collateral(Amount::from(90));

        let snapshot = oracle.snapshot(42).await.unwrap();
        assert_eq!(snapshot.block, 42);
        assert_eq!(snapshot.exchange_rate, Amount::from(3));
        assert_eq!(snapshot.pool_balance, Amount::from(11));
        assert_eq!(snapshot.excess_pool_balance, Amount::from(5));
        assert_eq!(snapshot.total_collateral, Amount::from(90));
        assert_eq!(oracle.reads_at(), vec![42, 42, 42, 42]);
    }
}
