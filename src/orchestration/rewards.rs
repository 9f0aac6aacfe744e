use crate::db::UnitOfWork;
use crate::domain::{ClaimerType, Node, ProtocolRoot, RewardClaim, RewardClaimed};
use crate::engine::to_underlying;
use crate::orchestration::indexer::{EventContext, EventOutcome, IndexError};
use crate::orchestration::nodes::latest_price;

pub(crate) async fn handle_reward_claimed(
    ctx: &EventContext<'_>,
    uow: &mut UnitOfWork<'_>,
    root: &mut ProtocolRoot,
    event: &RewardClaimed,
) -> Result<EventOutcome, IndexError> {
    let id = ctx.event_id.as_str();
    if uow.exists::<RewardClaim>(id).await? {
        return Ok(EventOutcome::AlreadyIndexed);
    }
    if event.amount.is_zero() {
        return Err(IndexError::MissingRequiredContext(
            "reward claim with zero amount".to_string(),
        ));
    }

    let node = if root.nodes.contains(&event.claimant) {
        uow.load::<Node>(event.claimant.as_str()).await?
    } else {
        None
    };

    let claimer_type = match (&node, &ctx.settings.dao_claim_contract) {
        (Some(_), _) => ClaimerType::Node,
        (None, Some(dao)) if *dao == event.claiming_contract => ClaimerType::ProtocolDao,
        _ => ClaimerType::Other,
    };

    if let Some(mut node) = node {
        node.total_claimed_rewards = node.total_claimed_rewards.saturating_add(event.amount);
        uow.save(&node)?;
    }

    let price = latest_price(uow, root).await?;
    uow.save(&RewardClaim {
        id: id.to_string(),
        claimant: event.claimant.clone(),
        claiming_contract: event.claiming_contract.clone(),
        claimer_type,
        amount: event.amount,
        underlying_amount: to_underlying(event.amount, price, ctx.settings.rate_scale),
        block_number: ctx.meta.block_number,
        block_time: ctx.meta.block_time,
    })?;

    Ok(EventOutcome::Indexed)
}
