//! Node registry, collateral and reward-claim indexing.

use stakeledger::datasource::MockOracle;
use stakeledger::db::{load_entity, EntityStore, MemoryStore, WriteBatch};
use stakeledger::domain::{
    member_checkpoint_id, Address, Amount, ClaimerType, Entity, EventMeta, LedgerEvent, Minipool,
    MinipoolChanged, MinipoolCreated, MinipoolStatus, Node, NodeCheckpoint, NodeNetworkCheckpoint,
    NodeRegistered, OracleNodeJoined, OracleNodeRemoved, PriceUpdated, ProtocolRoot, RewardClaim,
    RewardClaimed, StakeChanged, StakeKind, StakeTransaction, PROTOCOL_ROOT_ID,
};
use stakeledger::orchestration::{EventOutcome, Indexer, IndexerSettings};
use std::sync::Arc;

fn addr(n: u8) -> Address {
    Address::parse(&format!("0x{:040x}", n)).unwrap()
}

fn amt(v: u64) -> Amount {
    Amount::from(v)
}

fn meta(block: u64, log_index: u64) -> EventMeta {
    EventMeta::new(
        block,
        1_700_000_000 + block as i64 * 12,
        log_index,
        format!("0x{:064x}", block * 1_000 + log_index),
    )
}

fn event_id(block: u64, log_index: u64) -> String {
    meta(block, log_index).event_id().unwrap().to_string()
}

fn registered(block: u64, node: &Address) -> LedgerEvent {
    LedgerEvent::NodeRegistered(NodeRegistered {
        meta: meta(block, 0),
        node: node.clone(),
    })
}

fn stake(block: u64, node: &Address, amount: u64, kind: StakeKind) -> LedgerEvent {
    let change = StakeChanged {
        meta: meta(block, 0),
        node: node.clone(),
        amount: amt(amount),
    };
    match kind {
        StakeKind::Deposited => LedgerEvent::StakeDeposited(change),
        StakeKind::Withdrawn => LedgerEvent::StakeWithdrawn(change),
        StakeKind::Slashed => LedgerEvent::StakeSlashed(change),
    }
}

fn price(block: u64, value: u64) -> LedgerEvent {
    LedgerEvent::PriceUpdated(PriceUpdated {
        meta: meta(block, 1),
        price: amt(value),
    })
}

fn claim(block: u64, claimant: &Address, contract: &Address, amount: u64) -> LedgerEvent {
    LedgerEvent::RewardClaimed(RewardClaimed {
        meta: meta(block, 2),
        claimant: claimant.clone(),
        claiming_contract: contract.clone(),
        amount: amt(amount),
    })
}

fn minipool_created(block: u64, node: &Address, minipool: &Address) -> LedgerEvent {
    LedgerEvent::MinipoolCreated(MinipoolCreated {
        meta: meta(block, 3),
        minipool: minipool.clone(),
        node: node.clone(),
    })
}

fn minipool_destroyed(block: u64, node: &Address, minipool: &Address) -> LedgerEvent {
    LedgerEvent::MinipoolDestroyed(MinipoolCreated {
        meta: meta(block, 3),
        minipool: minipool.clone(),
        node: node.clone(),
    })
}

fn minipool_to(block: u64, minipool: &Address, status: MinipoolStatus) -> LedgerEvent {
    let change = MinipoolChanged {
        meta: meta(block, 4),
        minipool: minipool.clone(),
    };
    match status {
        MinipoolStatus::Staking => LedgerEvent::MinipoolStaking(change),
        MinipoolStatus::Withdrawable => LedgerEvent::MinipoolWithdrawable(change),
        MinipoolStatus::Finalized => LedgerEvent::MinipoolFinalized(change),
        other => panic!("no event moves a minipool to {}", other),
    }
}

fn oracle_joined(block: u64, node: &Address, bond: u64) -> LedgerEvent {
    LedgerEvent::OracleNodeJoined(OracleNodeJoined {
        meta: meta(block, 5),
        node: node.clone(),
        bond: amt(bond),
    })
}

fn oracle_removed(block: u64, node: &Address, kicked: bool) -> LedgerEvent {
    let removed = OracleNodeRemoved {
        meta: meta(block, 5),
        node: node.clone(),
    };
    if kicked {
        LedgerEvent::OracleNodeKicked(removed)
    } else {
        LedgerEvent::OracleNodeLeft(removed)
    }
}

async fn load<T: Entity>(store: &MemoryStore, id: &str) -> T {
    load_entity(store, id).await.unwrap().unwrap()
}

async fn load_node(store: &MemoryStore, id: &Address) -> Node {
    load(store, id.as_str()).await
}

fn indexer(store: Arc<dyn EntityStore>, dao: Option<Address>) -> Indexer {
    Indexer::new(
        store,
        Arc::new(MockOracle::new().with_exchange_rate(amt(1))),
        IndexerSettings {
            rate_scale: amt(1),
            dao_claim_contract: dao,
        },
    )
}

async fn run(indexer: &Indexer, events: Vec<LedgerEvent>) {
    for event in events {
        let outcome = indexer.process(&event).await.unwrap();
        assert_eq!(outcome, EventOutcome::Indexed, "event {:?}", event.event_id());
    }
}

#[tokio::test]
async fn price_update_checkpoints_every_node() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);
    let b = addr(11);

    run(
        &indexer,
        vec![
            registered(1, &a),
            registered(2, &b),
            stake(3, &a, 1_000, StakeKind::Deposited),
            stake(4, &b, 500, StakeKind::Deposited),
            price(5, 2),
        ],
    )
    .await;

    let head: NodeNetworkCheckpoint = load(&store, &event_id(5, 1)).await;
    assert_eq!(head.nodes_registered, 2);
    assert_eq!(head.nodes_with_stake, 2);
    assert_eq!(head.total_staked, amt(1_500));
    assert_eq!(head.total_staked_value, amt(3_000));
    assert_eq!(head.average_staked_per_node, amt(750));
    assert!(head.previous_checkpoint_ref.is_none());

    let member: NodeCheckpoint = load_entity(store.as_ref(), &member_checkpoint_id(&head.id, &a))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.staked_value, amt(2_000));

    let node: Node = load_entity(store.as_ref(), a.as_str()).await.unwrap().unwrap();
    assert_eq!(node.last_checkpoint_ref.as_deref(), Some(member.id.as_str()));
}

#[tokio::test]
async fn slash_and_withdraw_floor_at_zero() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);

    run(
        &indexer,
        vec![
            registered(1, &a),
            stake(2, &a, 1_000, StakeKind::Deposited),
            price(3, 2),
            stake(4, &a, 100, StakeKind::Slashed),
            stake(5, &a, 5_000, StakeKind::Withdrawn),
            price(6, 3),
        ],
    )
    .await;

    let node: Node = load_entity(store.as_ref(), a.as_str()).await.unwrap().unwrap();
    assert!(node.staked.is_zero());
    assert_eq!(node.total_slashed, amt(100));

    // Valued at the price in force when the slash happened.
    let slash: StakeTransaction = load(&store, &event_id(4, 0)).await;
    assert_eq!(slash.kind, StakeKind::Slashed);
    assert_eq!(slash.underlying_amount, amt(200));

    let head: NodeNetworkCheckpoint = load(&store, &event_id(6, 1)).await;
    assert_eq!(head.nodes_with_stake, 0);
    assert_eq!(head.total_slashed, amt(100));
    assert!(head.average_staked_per_node.is_zero());
    assert_eq!(head.previous_checkpoint_ref, Some(event_id(3, 1)));

    let previous: NodeNetworkCheckpoint = load(&store, &event_id(3, 1)).await;
    assert_eq!(previous.next_checkpoint_ref, Some(head.id.clone()));
}

#[tokio::test]
async fn stake_for_unregistered_node_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);

    let outcome = indexer
        .process(&stake(2, &addr(42), 10, StakeKind::Deposited))
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert!(store.dump().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_registration_is_already_indexed() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);

    run(&indexer, vec![registered(1, &a)]).await;
    let outcome = indexer.process(&registered(9, &a)).await.unwrap();
    assert_eq!(outcome, EventOutcome::AlreadyIndexed);

    let root: ProtocolRoot = load_entity(store.as_ref(), PROTOCOL_ROOT_ID).await.unwrap().unwrap();
    assert_eq!(root.nodes, vec![a]);
}

#[tokio::test]
async fn zero_price_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);

    let outcome = indexer.process(&price(3, 0)).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert_eq!(store.count(NodeNetworkCheckpoint::KIND).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_node_cycle_carries_slash_and_claim_totals() {
    let store = Arc::new(MemoryStore::new());
    let seed_meta = meta(1, 1);
    let mut previous = NodeNetworkCheckpoint::new(event_id(1, 1), None, &seed_meta, amt(2));
    previous.total_slashed = amt(50);
    previous.total_claimed_rewards = amt(7);

    let mut root = ProtocolRoot::new();
    root.last_node_checkpoint_ref = Some(previous.id.clone());

    let mut batch = WriteBatch::new();
    batch.upsert(&previous).unwrap();
    batch.upsert(&root).unwrap();
    store.commit(batch).await.unwrap();

    let indexer = indexer(store.clone(), None);
    run(&indexer, vec![price(4, 3)]).await;

    let head: NodeNetworkCheckpoint = load(&store, &event_id(4, 1)).await;
    assert_eq!(head.total_slashed, amt(50));
    assert_eq!(head.total_claimed_rewards, amt(7));
    assert_eq!(head.nodes_registered, 0);
}

#[tokio::test]
async fn reward_claims_are_classified() {
    let store = Arc::new(MemoryStore::new());
    let dao = addr(200);
    let distributor = addr(201);
    let indexer = indexer(store.clone(), Some(dao.clone()));
    let a = addr(10);
    let member = addr(77);

    run(
        &indexer,
        vec![
            registered(1, &a),
            price(2, 4),
            claim(3, &a, &distributor, 25),
            claim(4, &member, &dao, 10),
            claim(5, &member, &distributor, 3),
        ],
    )
    .await;

    let node_claim: RewardClaim = load(&store, &event_id(3, 2)).await;
    assert_eq!(node_claim.claimer_type, ClaimerType::Node);
    assert_eq!(node_claim.underlying_amount, amt(100));

    let dao_claim: RewardClaim = load(&store, &event_id(4, 2)).await;
    assert_eq!(dao_claim.claimer_type, ClaimerType::ProtocolDao);

    let other: RewardClaim = load(&store, &event_id(5, 2)).await;
    assert_eq!(other.claimer_type, ClaimerType::Other);

    let node: Node = load_entity(store.as_ref(), a.as_str()).await.unwrap().unwrap();
    assert_eq!(node.total_claimed_rewards, amt(25));

    // Replay leaves the node total alone.
    let outcome = indexer.process(&claim(3, &a, &distributor, 25)).await.unwrap();
    assert_eq!(outcome, EventOutcome::AlreadyIndexed);
    let node: Node = load_entity(store.as_ref(), a.as_str()).await.unwrap().unwrap();
    assert_eq!(node.total_claimed_rewards, amt(25));
}

#[tokio::test]
async fn zero_amount_claim_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);

    let outcome = indexer.process(&claim(3, &addr(1), &addr(2), 0)).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Skipped(_)));
}

#[tokio::test]
async fn minipool_lifecycle_moves_node_counters() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);
    let (m1, m2, m3) = (addr(101), addr(102), addr(103));

    run(
        &indexer,
        vec![
            registered(1, &a),
            minipool_created(2, &a, &m1),
            minipool_created(3, &a, &m2),
            minipool_created(4, &a, &m3),
            minipool_to(5, &m1, MinipoolStatus::Staking),
            minipool_to(6, &m2, MinipoolStatus::Staking),
            minipool_to(7, &m2, MinipoolStatus::Withdrawable),
            minipool_to(8, &m2, MinipoolStatus::Finalized),
            minipool_destroyed(9, &a, &m3),
        ],
    )
    .await;

    let node = load_node(&store, &a).await;
    assert_eq!(node.minipools.queued, 0);
    assert_eq!(node.minipools.staking, 1);
    assert_eq!(node.minipools.withdrawable, 0);
    assert_eq!(node.minipools.total_finalized, 1);

    let destroyed: Minipool = load_entity(store.as_ref(), m3.as_str()).await.unwrap().unwrap();
    assert_eq!(destroyed.status, MinipoolStatus::Destroyed);
    assert_eq!(destroyed.status_block, 9);
    assert_eq!(destroyed.node, a);
}

#[tokio::test]
async fn minipool_replays_and_invalid_moves_change_nothing() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);
    let m = addr(101);

    run(
        &indexer,
        vec![
            registered(1, &a),
            minipool_created(2, &a, &m),
            minipool_to(3, &m, MinipoolStatus::Staking),
        ],
    )
    .await;
    let before = store.dump().unwrap();

    let replayed = indexer.process(&minipool_created(2, &a, &m)).await.unwrap();
    assert_eq!(replayed, EventOutcome::AlreadyIndexed);
    let stale = indexer
        .process(&minipool_to(3, &m, MinipoolStatus::Staking))
        .await
        .unwrap();
    assert_eq!(stale, EventOutcome::AlreadyIndexed);

    // A staking minipool can be neither destroyed nor finalized directly.
    let destroy = indexer.process(&minipool_destroyed(4, &a, &m)).await.unwrap();
    assert!(matches!(destroy, EventOutcome::Skipped(_)));
    let finalize = indexer
        .process(&minipool_to(5, &m, MinipoolStatus::Finalized))
        .await
        .unwrap();
    assert!(matches!(finalize, EventOutcome::Skipped(_)));

    assert_eq!(store.dump().unwrap(), before);
}

#[tokio::test]
async fn minipool_for_unknown_node_or_minipool_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);

    let orphan = indexer
        .process(&minipool_created(2, &addr(42), &addr(101)))
        .await
        .unwrap();
    assert!(matches!(orphan, EventOutcome::Skipped(_)));

    let unknown = indexer
        .process(&minipool_to(3, &addr(102), MinipoolStatus::Staking))
        .await
        .unwrap();
    assert!(matches!(unknown, EventOutcome::Skipped(_)));
    assert!(store.dump().unwrap().is_empty());
}

#[tokio::test]
async fn oracle_membership_follows_join_and_removal() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);
    let b = addr(11);

    run(
        &indexer,
        vec![
            registered(1, &a),
            registered(2, &b),
            oracle_joined(2, &a, 1_750),
            oracle_joined(3, &b, 1_750),
            oracle_removed(4, &b, true),
        ],
    )
    .await;

    let node_a = load_node(&store, &a).await;
    assert!(node_a.is_oracle_node);
    assert_eq!(node_a.oracle_node_bond, amt(1_750));
    assert_eq!(node_a.oracle_node_block_time, Some(1_700_000_000 + 2 * 12));

    let node_b = load_node(&store, &b).await;
    assert!(!node_b.is_oracle_node);
    assert!(node_b.oracle_node_bond.is_zero());
    assert_eq!(node_b.oracle_node_block_time, Some(1_700_000_000 + 4 * 12));

    // A replayed join after the kick must not restore membership.
    let replay = indexer.process(&oracle_joined(3, &b, 1_750)).await.unwrap();
    assert_eq!(replay, EventOutcome::AlreadyIndexed);
    assert!(!load_node(&store, &b).await.is_oracle_node);

    run(&indexer, vec![oracle_joined(5, &b, 2_000), oracle_removed(6, &b, false)]).await;
    assert!(!load_node(&store, &b).await.is_oracle_node);

    let unknown = indexer.process(&oracle_joined(7, &addr(99), 1)).await.unwrap();
    assert!(matches!(unknown, EventOutcome::Skipped(_)));
}

#[tokio::test]
async fn node_checkpoint_sums_minipools_and_oracle_bonds() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(store.clone(), None);
    let a = addr(10);
    let b = addr(11);
    let (m1, m2) = (addr(101), addr(102));

    run(
        &indexer,
        vec![
            registered(1, &a),
            registered(2, &b),
            minipool_created(3, &a, &m1),
            minipool_created(4, &b, &m2),
            minipool_to(5, &m1, MinipoolStatus::Staking),
            minipool_to(6, &m1, MinipoolStatus::Withdrawable),
            minipool_to(7, &m1, MinipoolStatus::Finalized),
            oracle_joined(8, &a, 1_000),
            oracle_joined(9, &b, 3_000),
            price(10, 2),
        ],
    )
    .await;

    let head: NodeNetworkCheckpoint = load(&store, &event_id(10, 1)).await;
    assert_eq!(head.queued_minipools, 1);
    assert_eq!(head.staking_minipools, 0);
    assert_eq!(head.total_finalized_minipools, 1);
    assert_eq!(head.nodes_with_active_minipools, 1);
    assert_eq!(head.oracle_nodes, 2);
    assert_eq!(head.total_oracle_node_bond, amt(4_000));
    assert_eq!(head.average_oracle_node_bond, amt(2_000));

    let member: NodeCheckpoint =
        load_entity(store.as_ref(), &member_checkpoint_id(&head.id, &a))
            .await
            .unwrap()
            .unwrap();
    assert_eq!(member.minipools.total_finalized, 1);
    assert!(member.is_oracle_node);
    assert_eq!(member.oracle_node_bond, amt(1_000));
}
