//! Mock oracle for testing without network calls.

use super::{OracleError, OracleReader};
use crate::domain::Amount;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Oracle returning predefined values.
///
/// Values are keyed by the block they take effect at; a read at block `n`
/// sees the latest value set at or before `n`.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    exchange_rates: BTreeMap<u64, Amount>,
    pool_balances: BTreeMap<u64, Amount>,
    excess_pool_balances: BTreeMap<u64, Amount>,
    total_collateral: BTreeMap<u64, Amount>,
    unavailable: Arc<AtomicBool>,
    reads: Arc<Mutex<Vec<u64>>>,
}

impl MockOracle {
    /// Create a new mock oracle with every value at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exchange rate from genesis.
    pub fn with_exchange_rate(self, rate: Amount) -> Self {
        self.with_exchange_rate_from(0, rate)
    }

    /// Set the exchange rate effective from `block` onward.
    pub fn with_exchange_rate_from(mut self, block: u64, rate: Amount) -> Self {
        self.exchange_rates.insert(block, rate);
        self
    }

    pub fn with_pool_balance(mut self, balance: Amount) -> Self {
        self.pool_balances.insert(0, balance);
        self
    }

    pub fn with_excess_pool_balance(mut self, balance: Amount) -> Self {
        self.excess_pool_balances.insert(0, balance);
        self
    }

    pub fn with_total_collateral(mut self, collateral: Amount) -> Self {
        self.total_collateral.insert(0, collateral);
        self
    }

    /// Start with every read failing.
    pub fn unavailable(self) -> Self {
        self.unavailable.store(true, Ordering::SeqCst);
        self
    }

    /// Toggle failure mode on a shared instance.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Blocks of every read so far, in call order.
    pub fn reads_at(&self) -> Vec<u64> {
        self.reads.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn read(&self, values: &BTreeMap<u64, Amount>, block: u64) -> Result<Amount, OracleError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OracleError::Unavailable(format!("mock oracle down at block {}", block)));
        }
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(block);
        }
        Ok(values
            .range(..=block)
            .next_back()
            .map(|(_, v)| *v)
            .unwrap_or(Amount::ZERO))
    }
}

#[async_trait]
impl OracleReader for MockOracle {
    async fn get_exchange_rate(&self, block: u64) -> Result<Amount, OracleError> {
        self.read(&self.exchange_rates, block)
    }

    async fn get_pool_balance(&self, block: u64) -> Result<Amount, OracleError> {
        self.read(&self.pool_balances, block)
    }

    async fn get_excess_pool_balance(&self, block: u64) -> Result<Amount, OracleError> {
        self.read(&self.excess_pool_balances, block)
    }

    async fn get_total_collateral(&self, block: u64) -> Result<Amount, OracleError> {
        self.read(&self.total_collateral, block)
    }
}
