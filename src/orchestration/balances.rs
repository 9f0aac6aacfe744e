//! Network checkpoints: one per balance snapshot.
//!
//! Every known participant is revalued at the new rate. Those holding tokens
//! get a [`ParticipantCheckpoint`] with the reward attributed since their
//! previous one; those without keep contributing their lifetime reward to the
//! protocol-wide running totals.

use crate::db::{StoreError, UnitOfWork};
use crate::domain::{
    member_checkpoint_id, Amount, BalanceSnapshotUpdated, NetworkCheckpoint, Participant,
    ParticipantCheckpoint, ProtocolRoot,
};
use crate::engine::{
    revalue, BalanceObservation, CheckpointChainManager, CheckpointTotals, RewardDeltaCalculator,
};
use crate::orchestration::indexer::{EventContext, EventOutcome, IndexError};
use tracing::{debug, warn};

pub(crate) async fn handle_balance_snapshot(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &BalanceSnapshotUpdated,
) -> Result<EventOutcome, IndexError> {
    let id = ctx.event_id.as_str();
    if CheckpointChainManager::is_indexed::<NetworkCheckpoint>(uow, id).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }

    let snapshot = ctx.oracle.snapshot(ctx.meta.block_number).await?;
    if snapshot.exchange_rate.is_zero() {
        return Err(IndexError::MissingRequiredContext(format!(
            "exchange rate unavailable at block {}",
            ctx.meta.block_number
        )));
    }

    let mut shell = NetworkCheckpoint::new(
        id.to_string(),
        root.last_network_checkpoint_ref.clone(),
        ctx.meta,
        snapshot.exchange_rate,
    );
    shell.underlying_waiting_in_pool = snapshot.pool_balance;
    shell.underlying_in_token_contract = snapshot.underlying_in_token_contract();
    shell.underlying_actively_staking = event.staking_underlying;
    shell.underlying_in_protocol = event.total_underlying;
    shell.token_supply = event.token_supply;

    let Some(mut pending) = CheckpointChainManager::create(uow, shell).await? else {
        return Ok(EventOutcome::AlreadyIndexed);
    };

    let previous = CheckpointChainManager::load_previous(uow, pending.checkpoint()).await?;
    let expected = pending.checkpoint().previous_checkpoint_ref.as_ref();
    if let (Some(expected), None) = (expected, &previous) {
        let message = format!("chain head {} has no record", expected);
        return Err(StoreError::Corrupt(message).into());
    }

    let calculator = RewardDeltaCalculator::new(ctx.settings.rate_scale);
    let fallback_rate = previous
        .as_ref()
        .map(|p| p.exchange_rate)
        .unwrap_or(Amount::ZERO);

    let totals = checkpoint_participants(
        uow,
        root,
        pending.checkpoint(),
        &calculator,
        fallback_rate,
    )
    .await?;
    totals.apply(pending.checkpoint_mut(), previous.as_ref());

    let finalized = pending.populated().finalize(previous)?;
    CheckpointChainManager::persist(uow, &finalized)?;
    root.last_network_checkpoint_ref = Some(finalized.checkpoint().id.clone());

    debug!(
        checkpoint = %finalized.checkpoint().id,
        participants_with_balance = finalized.checkpoint().participants_with_balance,
        total_reward = %finalized.checkpoint().total_reward,
        "network checkpoint finalized"
    );
    Ok(EventOutcome::Indexed)
}

/// Revalue every participant at `checkpoint`'s rate, stage their checkpoints
/// and fold them into totals.
async fn checkpoint_participants(
    uow: &mut UnitOfWork<'_>,
    root: &ProtocolRoot,
    checkpoint: &NetworkCheckpoint,
    calculator: &RewardDeltaCalculator,
    fallback_rate: Amount,
) -> Result<CheckpointTotals, IndexError> {
    let mut totals = CheckpointTotals::default();

    for participant_id in &root.participants {
        if participant_id.is_zero() {
            continue;
        }

        let Some(mut participant) = uow.load::<Participant>(participant_id.as_str()).await? else {
            warn!(participant = %participant_id, "listed participant has no record, skipping");
            continue;
        };

        if !participant.has_balance() {
            totals.record_dormant(participant.cumulative_reward);
            continue;
        }

        revalue(&mut participant, checkpoint.exchange_rate, calculator.scale());
        let current = BalanceObservation::new(
            participant.token_balance,
            participant.underlying_balance,
            checkpoint.exchange_rate,
        );

        let previous = match &participant.last_checkpoint_ref {
            Some(reference) => uow.load::<ParticipantCheckpoint>(reference).await?,
            None => None,
        };
        // No previous checkpoint means no history: the delta is zero.
        let previous = previous
            .map(|cp| {
                let rate = if cp.exchange_rate.is_zero() {
                    fallback_rate
                } else {
                    cp.exchange_rate
                };
                BalanceObservation::new(cp.token_balance, cp.underlying_balance, rate)
            })
            .unwrap_or_default();

        let reward = calculator.compute(&current, &previous);
        participant.cumulative_reward = participant.cumulative_reward.saturating_add(reward);

        let participant_checkpoint = ParticipantCheckpoint {
            id: member_checkpoint_id(&checkpoint.id, &participant.id),
            participant: participant.id.clone(),
            network_checkpoint: checkpoint.id.clone(),
            token_balance: participant.token_balance,
            underlying_balance: participant.underlying_balance,
            exchange_rate: checkpoint.exchange_rate,
            reward_since_previous: reward,
            cumulative_reward: participant.cumulative_reward,
            block_number: checkpoint.block_number,
            block_time: checkpoint.block_time,
        };
        participant.last_checkpoint_ref = Some(participant_checkpoint.id.clone());

        totals.record_active(
            participant.underlying_balance,
            reward,
            participant.cumulative_reward,
        );
        uow.save(&participant_checkpoint)?;
        uow.save(&participant)?;
    }

    Ok(totals)
}
