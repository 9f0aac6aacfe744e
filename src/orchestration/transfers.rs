use crate::db::UnitOfWork;
use crate::domain::{
    Address, Participant, PoolSnapshot, ProtocolRoot, TokenTransaction, TokenTransferred,
    POOL_SNAPSHOT_ID,
};
use crate::engine::{apply_transfer, TransferEffect};
use crate::orchestration::indexer::{EventContext, EventOutcome, IndexError};
use tracing::warn;

/// Debit the sender, credit the receiver, record the transaction and refresh
/// the pool snapshot. Both sides use the same oracle snapshot.
pub(crate) async fn handle_transfer(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &TokenTransferred,
) -> Result<EventOutcome, IndexError> {
    let id = ctx.event_id.as_str();
    if uow.exists::<TokenTransaction>(id).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }

    let snapshot = ctx.oracle.snapshot(ctx.meta.block_number).await?;
    let rate = snapshot.exchange_rate;
    let scale = ctx.settings.rate_scale;

    for (address, is_credit) in [(&event.from, false), (&event.to, true)] {
        if address.is_zero() {
            continue;
        }
        let mut participant = load_or_create_participant(ctx, uow, address).await?;
        root.add_participant(address);

        if apply_transfer(&mut participant, event.amount, rate, scale, is_credit)
            == TransferEffect::Floored
        {
            warn!(
                participant = %address,
                amount = %event.amount,
                event_id = %ctx.event_id,
                "debit exceeds balance, floored at zero"
            );
        }
        uow.save(&participant)?;
    }

    uow.save(&TokenTransaction {
        id: id.to_string(),
        from: event.from.clone(),
        to: event.to.clone(),
        amount: event.amount,
        exchange_rate: rate,
        block_number: ctx.meta.block_number,
        block_time: ctx.meta.block_time,
        tx_hash: ctx.meta.tx_hash.to_lowercase(),
    })?;

    let mut pool = uow
        .load::<PoolSnapshot>(POOL_SNAPSHOT_ID)
        .await?
        .unwrap_or_else(|| PoolSnapshot::new(ctx.meta));
    pool.exchange_rate = rate;
    pool.pool_balance = snapshot.pool_balance;
    pool.excess_pool_balance = snapshot.excess_pool_balance;
    pool.underlying_in_token_contract = snapshot.underlying_in_token_contract();
    if event.from.is_zero() {
        pool.minted_supply = pool.minted_supply.saturating_add(event.amount);
    }
    pool.block_number = ctx.meta.block_number;
    pool.block_time = ctx.meta.block_time;
    uow.save(&pool)?;

    Ok(EventOutcome::Indexed)
}

async fn load_or_create_participant(
    ctx: &EventContext<'_>,
    uow: &UnitOfWork<'_>,
    address: &Address,
) -> Result<Participant, IndexError> {
    match uow.load::<Participant>(address.as_str()).await? {
        Some(participant) => Ok(participant),
        None => Ok(Participant::new(address.clone(), ctx.meta)),
    }
}
