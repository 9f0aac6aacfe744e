//! Node registry, collateral movements and the node checkpoint chain.

use crate::db::{StoreError, UnitOfWork};
use crate::domain::{
    member_checkpoint_id, Amount, Node, NodeCheckpoint, NodeNetworkCheckpoint, NodeRegistered,
    PriceUpdated, ProtocolRoot, StakeChanged, StakeKind, StakeTransaction,
};
use crate::engine::{to_underlying, CheckpointChainManager, NodeTotals};
use crate::orchestration::indexer::{EventContext, EventOutcome, IndexError};
use tracing::{debug, warn};

pub(crate) async fn handle_node_registered(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &NodeRegistered,
) -> Result<EventOutcome, IndexError> {
    if event.node.is_zero() {
        return Err(IndexError::MissingRequiredContext(
            "node registered with the zero address".to_string(),
        ));
    }
    if uow.exists::<Node>(event.node.as_str()).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }

    root.add_node(&event.node);
    uow.save(&Node::new(event.node.clone(), ctx.meta))?;
    Ok(EventOutcome::Indexed)
}

pub(crate) async fn handle_stake(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &StakeChanged,
    kind: StakeKind,
) -> Result<EventOutcome, IndexError> {
    let id = ctx.event_id.as_str();
    if uow.exists::<StakeTransaction>(id).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }

    let Some(mut node) = uow.load::<Node>(event.node.as_str()).await? else {
        return Ok(EventOutcome::Skipped(format!(
            "stake {} for unregistered node {}",
            kind, event.node
        )));
    };

    match kind {
        StakeKind::Deposited => node.staked = node.staked.saturating_add(event.amount),
        StakeKind::Withdrawn | StakeKind::Slashed => {
            if event.amount > node.staked {
                warn!(node = %node.id, %kind, amount = %event.amount, "stake floored at zero");
            }
            node.staked = node.staked.saturating_sub(event.amount);
            if kind == StakeKind::Slashed {
                node.total_slashed = node.total_slashed.saturating_add(event.amount);
            }
        }
    }

    let price = latest_price(uow, root).await?;
    uow.save(&StakeTransaction {
        id: id.to_string(),
        node: node.id.clone(),
        kind,
        amount: event.amount,
        underlying_amount: to_underlying(event.amount, price, ctx.settings.rate_scale),
        block_number: ctx.meta.block_number,
        block_time: ctx.meta.block_time,
    })?;
    uow.save(&node)?;
    Ok(EventOutcome::Indexed)
}

/// Build a node network checkpoint at the new price.
pub(crate) async fn handle_price_updated(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &PriceUpdated,
) -> Result<EventOutcome, IndexError> {
    let id = ctx.event_id.as_str();
    if CheckpointChainManager::is_indexed::<NodeNetworkCheckpoint>(uow, id).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }
    if event.price.is_zero() {
        return Err(IndexError::MissingRequiredContext(format!(
            "zero collateral price at block {}",
            ctx.meta.block_number
        )));
    }

    let shell = NodeNetworkCheckpoint::new(
        id.to_string(),
        root.last_node_checkpoint_ref.clone(),
        ctx.meta,
        event.price,
    );
    let Some(mut pending) = CheckpointChainManager::create(uow, shell).await? else {
        return Ok(EventOutcome::AlreadyIndexed);
    };

    let previous = CheckpointChainManager::load_previous(uow, pending.checkpoint()).await?;
    let expected = pending.checkpoint().previous_checkpoint_ref.as_ref();
    if let (Some(expected), None) = (expected, &previous) {
        let message = format!("node chain head {} has no record", expected);
        return Err(StoreError::Corrupt(message).into());
    }

    let mut totals = NodeTotals::default();
    for node_id in &root.nodes {
        let Some(mut node) = uow.load::<Node>(node_id.as_str()).await? else {
            warn!(node = %node_id, "listed node has no record, skipping");
            continue;
        };

        let checkpoint = pending.checkpoint();
        let staked_value = to_underlying(node.staked, checkpoint.price, ctx.settings.rate_scale);
        let node_checkpoint = NodeCheckpoint {
            id: member_checkpoint_id(&checkpoint.id, &node.id),
            node: node.id.clone(),
            network_checkpoint: checkpoint.id.clone(),
            staked: node.staked,
            staked_value,
            total_slashed: node.total_slashed,
            total_claimed_rewards: node.total_claimed_rewards,
            minipools: node.minipools,
            is_oracle_node: node.is_oracle_node,
            oracle_node_bond: node.oracle_node_bond,
            block_number: checkpoint.block_number,
            block_time: checkpoint.block_time,
        };
        node.last_checkpoint_ref = Some(node_checkpoint.id.clone());

        totals.record(&node, staked_value);
        uow.save(&node_checkpoint)?;
        uow.save(&node)?;
    }
    totals.apply(pending.checkpoint_mut());

    let finalized = pending.populated().finalize(previous)?;
    CheckpointChainManager::persist(uow, &finalized)?;
    root.last_node_checkpoint_ref = Some(finalized.checkpoint().id.clone());

    debug!(
        checkpoint = %finalized.checkpoint().id,
        nodes = finalized.checkpoint().nodes_registered,
        total_staked = %finalized.checkpoint().total_staked,
        "node checkpoint finalized"
    );
    Ok(EventOutcome::Indexed)
}

/// Collateral price at the head of the node chain, zero before the first update.
pub(crate) async fn latest_price(
    uow: &UnitOfWork<'_>,
    root: &ProtocolRoot,
) -> Result<Amount, StoreError> {
    let Some(head) = &root.last_node_checkpoint_ref else {
        return Ok(Amount::ZERO);
    };
    Ok(uow
        .load::<NodeNetworkCheckpoint>(head)
        .await?
        .map(|cp| cp.price)
        .unwrap_or(Amount::ZERO))
}
