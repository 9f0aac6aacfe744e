//! Minipool lifecycle and oracle DAO membership on nodes.

use crate::db::UnitOfWork;
use crate::domain::{
    Address, Amount, Minipool, MinipoolChanged, MinipoolCreated, MinipoolStatus, Node,
    OracleNodeJoined, OracleNodeRemoved, Transition,
};
use crate::orchestration::indexer::{EventContext, EventOutcome, IndexError};
use tracing::debug;

pub(crate) async fn handle_minipool_created(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    event: &MinipoolCreated,
) -> Result<EventOutcome, IndexError> {
    if event.minipool.is_zero() || event.node.is_zero() {
        return Err(IndexError::MissingRequiredContext(
            "minipool created with the zero address".to_string(),
        ));
    }
    if uow.exists::<Minipool>(event.minipool.as_str()).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }
    let Some(mut node) = uow.load::<Node>(event.node.as_str()).await? else {
        return Ok(EventOutcome::Skipped(format!(
            "minipool {} for unregistered node {}",
            event.minipool, event.node
        )));
    };

    let minipool = Minipool::new(event.minipool.clone(), node.id.clone(), ctx.meta);
    node.minipools.shift(MinipoolStatus::Destroyed, MinipoolStatus::Initialized);
    uow.save(&minipool)?;
    uow.save(&node)?;
    Ok(EventOutcome::Indexed)
}

pub(crate) async fn handle_minipool_destroyed(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    event: &MinipoolCreated,
) -> Result<EventOutcome, IndexError> {
    let outcome = advance(ctx, uow, &event.minipool, MinipoolStatus::Destroyed).await?;
    if let EventOutcome::Indexed = outcome {
        debug!(minipool = %event.minipool, node = %event.node, "minipool destroyed");
    }
    Ok(outcome)
}

pub(crate) async fn handle_minipool_changed(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    event: &MinipoolChanged,
    target: MinipoolStatus,
) -> Result<EventOutcome, IndexError> {
    advance(ctx, uow, &event.minipool, target).await
}

/// Move a minipool to `target` and its owner's counters with it.
async fn advance(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    minipool_id: &Address,
    target: MinipoolStatus,
) -> Result<EventOutcome, IndexError> {
    let Some(mut minipool) = uow.load::<Minipool>(minipool_id.as_str()).await? else {
        return Ok(EventOutcome::Skipped(format!(
            "minipool {} {} before it was created",
            minipool_id, target
        )));
    };

    match minipool.status.transition_to(target) {
        Transition::AlreadyApplied => return Ok(EventOutcome::AlreadyIndexed),
        Transition::Invalid => {
            return Ok(EventOutcome::Skipped(format!(
                "minipool {} cannot move from {} to {}",
                minipool.id, minipool.status, target
            )));
        }
        Transition::Advance => {}
    }

    let Some(mut node) = uow.load::<Node>(minipool.node.as_str()).await? else {
        return Ok(EventOutcome::Skipped(format!(
            "minipool {} belongs to unknown node {}",
            minipool.id, minipool.node
        )));
    };

    node.minipools.shift(minipool.status, target);
    minipool.set_status(target, ctx.meta);
    uow.save(&minipool)?;
    uow.save(&node)?;
    Ok(EventOutcome::Indexed)
}

pub(crate) async fn handle_oracle_node_joined(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    event: &OracleNodeJoined,
) -> Result<EventOutcome, IndexError> {
    set_oracle_membership(ctx, uow, &event.node, Some(event.bond)).await
}

pub(crate) async fn handle_oracle_node_removed(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    event: &OracleNodeRemoved,
) -> Result<EventOutcome, IndexError> {
    set_oracle_membership(ctx, uow, &event.node, None).await
}

/// `bond` is `Some` on join and `None` on leave or kick.
async fn set_oracle_membership(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    node_id: &Address,
    bond: Option<Amount>,
) -> Result<EventOutcome, IndexError> {
    // Membership changes leave no per-event record; replays are detected
    // through the processed-events audit.
    if uow.is_processed(ctx.event_id.as_str()).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }
    let Some(mut node) = uow.load::<Node>(node_id.as_str()).await? else {
        return Ok(EventOutcome::Skipped(format!(
            "oracle DAO change for unregistered node {}",
            node_id
        )));
    };

    node.is_oracle_node = bond.is_some();
    node.oracle_node_bond = bond.unwrap_or_default();
    node.oracle_node_block_time = Some(ctx.meta.block_time);
    uow.save(&node)?;
    Ok(EventOutcome::Indexed)
}
