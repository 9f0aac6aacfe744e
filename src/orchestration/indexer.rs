use crate::config::Config;
use crate::datasource::{OracleError, OracleReader};
use crate::db::{EntityStore, ProcessedEvent, StoreError, UnitOfWork};
use crate::domain::{
    sort_events_canonical, Address, Amount, EventId, EventMeta, LedgerEvent, MinipoolStatus,
    ProtocolRoot, StakeKind, PROTOCOL_ROOT_ID,
};
use crate::engine::ChainError;
use crate::orchestration::{balances, minipools, nodes, rewards, transfers};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result of handing one event to the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Every record the event produced was committed.
    Indexed,
    /// The event was seen before; nothing changed.
    AlreadyIndexed,
    /// The event was aborted without writing anything and may be replayed.
    Skipped(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("missing required context: {0}")]
    MissingRequiredContext(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    /// One unit of the underlying asset in rate terms.
    pub rate_scale: Amount,
    pub dao_claim_contract: Option<Address>,
}

impl From<&Config> for IndexerSettings {
    fn from(config: &Config) -> Self {
        Self {
            rate_scale: config.rate_scale,
            dao_claim_contract: config.dao_claim_contract.clone(),
        }
    }
}

/// Everything a handler needs besides the unit of work and the root.
pub(crate) struct EventContext<'a> {
    pub meta: &'a EventMeta,
    pub event_id: &'a EventId,
    pub settings: &'a IndexerSettings,
    pub oracle: &'a dyn OracleReader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub event_id: Option<String>,
    pub kind: &'static str,
    pub outcome: EventOutcome,
}

/// Applies ledger events one at a time.
///
/// Each event is processed in its own [`UnitOfWork`]: either everything it
/// produced is committed in one batch, or nothing is. Callers must not run
/// two `process` calls concurrently against the same store.
#[derive(Debug, Clone)]
pub struct Indexer {
    store: Arc<dyn EntityStore>,
    oracle: Arc<dyn OracleReader>,
    settings: IndexerSettings,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn EntityStore>,
        oracle: Arc<dyn OracleReader>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            store,
            oracle,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Process a single event.
    ///
    /// Missing context (no tx hash, oracle unavailable, unusable values) is
    /// reported as [`EventOutcome::Skipped`]. Only store failures are errors.
    pub async fn process(&self, event: &LedgerEvent) -> Result<EventOutcome, IndexError> {
        let meta = event.meta();
        let Some(event_id) = event.event_id() else {
            warn!(
                kind = event.kind(),
                block = meta.block_number,
                "event without tx hash, skipping"
            );
            return Ok(EventOutcome::Skipped("event has no transaction hash".to_string()));
        };

        let mut uow = UnitOfWork::new(self.store.as_ref());
        let mut root = match uow.load::<ProtocolRoot>(PROTOCOL_ROOT_ID).await? {
            Some(root) => root,
            None => {
                debug!("protocol root not found, starting a new one");
                ProtocolRoot::new()
            }
        };

        let ctx = EventContext {
            meta,
            event_id: &event_id,
            settings: &self.settings,
            oracle: self.oracle.as_ref(),
        };

        let result = match event {
            LedgerEvent::BalanceSnapshotUpdated(e) => {
                balances::handle_balance_snapshot(&ctx, &mut uow, &mut root, e).await
            }
            LedgerEvent::TokenTransferred(e) => {
                transfers::handle_transfer(&ctx, &mut uow, &mut root, e).await
            }
            LedgerEvent::PriceUpdated(e) => {
                nodes::handle_price_updated(&ctx, &mut uow, &mut root, e).await
            }
            LedgerEvent::NodeRegistered(e) => {
                nodes::handle_node_registered(&ctx, &mut uow, &mut root, e).await
            }
            LedgerEvent::StakeDeposited(e) => {
                nodes::handle_stake(&ctx, &mut uow, &mut root, e, StakeKind::Deposited).await
            }
            LedgerEvent::StakeWithdrawn(e) => {
                nodes::handle_stake(&ctx, &mut uow, &mut root, e, StakeKind::Withdrawn).await
            }
            LedgerEvent::StakeSlashed(e) => {
                nodes::handle_stake(&ctx, &mut uow, &mut root, e, StakeKind::Slashed).await
            }
            LedgerEvent::RewardClaimed(e) => {
                rewards::handle_reward_claimed(&ctx, &mut uow, &mut root, e).await
            }
            LedgerEvent::MinipoolCreated(e) => {
                minipools::handle_minipool_created(&ctx, &mut uow, e).await
            }
            LedgerEvent::MinipoolDestroyed(e) => {
                minipools::handle_minipool_destroyed(&ctx, &mut uow, e).await
            }
            LedgerEvent::MinipoolStaking(e) => {
                minipools::handle_minipool_changed(&ctx, &mut uow, e, MinipoolStatus::Staking)
                    .await
            }
            LedgerEvent::MinipoolWithdrawable(e) => {
                let target = MinipoolStatus::Withdrawable;
                minipools::handle_minipool_changed(&ctx, &mut uow, e, target).await
            }
            LedgerEvent::MinipoolFinalized(e) => {
                let target = MinipoolStatus::Finalized;
                minipools::handle_minipool_changed(&ctx, &mut uow, e, target).await
            }
            LedgerEvent::OracleNodeJoined(e) => {
                minipools::handle_oracle_node_joined(&ctx, &mut uow, e).await
            }
            LedgerEvent::OracleNodeLeft(e) | LedgerEvent::OracleNodeKicked(e) => {
                minipools::handle_oracle_node_removed(&ctx, &mut uow, e).await
            }
        };

        match result {
            Ok(EventOutcome::Indexed) => {
                uow.save(&root)?;
                let written = uow
                    .commit(ProcessedEvent {
                        event_id: event_id.to_string(),
                        kind: event.kind().to_string(),
                        outcome: "indexed".to_string(),
                        block_number: meta.block_number,
                        log_index: meta.log_index,
                    })
                    .await?;
                info!(event_id = %event_id, kind = event.kind(), written, "event indexed");
                Ok(EventOutcome::Indexed)
            }
            Ok(EventOutcome::AlreadyIndexed) => {
                debug!(event_id = %event_id, kind = event.kind(), "event already indexed");
                Ok(EventOutcome::AlreadyIndexed)
            }
            Ok(EventOutcome::Skipped(reason)) => {
                warn!(event_id = %event_id, kind = event.kind(), %reason, "event skipped");
                Ok(EventOutcome::Skipped(reason))
            }
            Err(IndexError::MissingRequiredContext(reason)) => {
                warn!(event_id = %event_id, kind = event.kind(), %reason, "event skipped");
                Ok(EventOutcome::Skipped(reason))
            }
            Err(IndexError::Oracle(e)) => {
                warn!(
                    event_id = %event_id,
                    kind = event.kind(),
                    error = %e,
                    "oracle read failed, event skipped"
                );
                Ok(EventOutcome::Skipped(format!("oracle: {}", e)))
            }
            Err(e) => Err(e),
        }
    }

    /// Sort a batch canonically and process it sequentially.
    ///
    /// Stops at the first store error; events before it stay committed.
    pub async fn process_batch(
        &self,
        mut events: Vec<LedgerEvent>,
    ) -> Result<Vec<BatchItem>, IndexError> {
        sort_events_canonical(&mut events);

        let mut items = Vec::with_capacity(events.len());
        for event in &events {
            let outcome = self.process(event).await?;
            items.push(BatchItem {
                event_id: event.event_id().map(|id| id.to_string()),
                kind: event.kind(),
                outcome,
            });
        }
        Ok(items)
    }
}
