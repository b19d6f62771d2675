// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::actors::{
    addr_key, make_map_with_root, BURNT_FUNDS_ACTOR_ADDR, FIRST_NON_SINGLETON_ADDR,
    NETWORK_ACTOR_ADDR,
};
use crate::blocks::Tipset;
use crate::chain::ChainStore;
use fvm_ipld_blockstore::tracking::TrackingBlockstore;
use fvm_ipld_blockstore::MemoryBlockstore;
use std::sync::Arc;

fn addr(seed: &[u8]) -> Address {
    Address::new_actor(seed)
}

fn config_with(balances: &[(Address, i64)], miners: Vec<MinerConfig>) -> GenesisConfig {
    GenesisConfig {
        balances: balances
            .iter()
            .map(|(a, b)| (*a, TokenAmount::from_atto(*b)))
            .collect(),
        miners,
        timestamp: 7777,
    }
}

fn miner_of(owner: Address, seed: &[u8]) -> MinerConfig {
    MinerConfig {
        owner,
        worker: addr(&[seed, b"-worker".as_slice()].concat()),
        peer_id: seed.to_vec(),
    }
}

fn state_tree<'a>(store: &'a MemoryBlockstore, genesis: &CachingBlockHeader) -> StateTree<'a, MemoryBlockstore> {
    StateTree::new_from_root(store, &genesis.state_root).unwrap()
}

fn market_state(store: &MemoryBlockstore, tree: &StateTree<'_, MemoryBlockstore>) -> market::State {
    let act = tree.get_actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap();
    store.get_cbor_required(&act.state).unwrap()
}

fn init_state(store: &MemoryBlockstore, tree: &StateTree<'_, MemoryBlockstore>) -> init::State {
    let act = tree.get_actor(&INIT_ACTOR_ADDR).unwrap().unwrap();
    store.get_cbor_required(&act.state).unwrap()
}

fn miner_state(
    store: &MemoryBlockstore,
    tree: &StateTree<'_, MemoryBlockstore>,
    miner_addr: &Address,
) -> miner::State {
    let act = tree.get_actor(miner_addr).unwrap().unwrap();
    assert_eq!(act.code, *crate::actors::MINER_ACTOR_CODE_ID);
    store.get_cbor_required(&act.state).unwrap()
}

#[test]
fn construction_is_deterministic() {
    let owner = addr(b"owner");
    let config = config_with(&[(owner, 500)], vec![miner_of(owner, b"m0")]);

    let store_a = MemoryBlockstore::default();
    let store_b = MemoryBlockstore::default();
    let a = make_genesis(&store_a, &config).unwrap();
    let b = make_genesis(&store_b, &config).unwrap();

    assert_eq!(a.genesis.state_root, b.genesis.state_root);
    assert_eq!(a.genesis.cid(), b.genesis.cid());
}

#[test]
fn over_commitment_fails_before_any_write() {
    let store = MemoryBlockstore::default();
    let tracking = TrackingBlockstore::new(&store);

    let a = addr(b"a");
    let b = addr(b"b");
    let mut config = config_with(&[], vec![]);
    config
        .balances
        .insert(a, TOTAL_TOKEN_SUPPLY.clone() - TokenAmount::from_atto(1));
    config.balances.insert(b, TokenAmount::from_atto(2));

    let err = make_genesis(&tracking, &config).unwrap_err();
    assert!(matches!(err, GenesisError::Config(_)));
    assert_eq!(tracking.stats.borrow().w, 0);
}

#[test]
fn negative_balance_is_rejected() {
    let store = MemoryBlockstore::default();
    let config = config_with(&[(addr(b"a"), -1)], vec![]);
    let err = make_genesis(&store, &config).unwrap_err();
    assert!(matches!(err, GenesisError::Config(_)));
}

#[test]
fn unfunded_miner_owner_is_rejected() {
    let store = MemoryBlockstore::default();
    let config = config_with(&[(addr(b"a"), 100)], vec![miner_of(addr(b"other"), b"m0")]);
    let err = make_genesis(&store, &config).unwrap_err();
    assert!(matches!(err, GenesisError::Config(_)));
}

#[test]
fn accounts_get_sequential_ids_in_config_order() {
    let a = addr(b"a");
    let b = addr(b"b");
    let c = addr(b"c");
    let store = MemoryBlockstore::default();
    let config = config_with(&[(a, 1), (b, 2), (c, 3)], vec![]);
    let bootstrap = make_genesis(&store, &config).unwrap();

    let tree = state_tree(&store, &bootstrap.genesis);
    let init = init_state(&store, &tree);
    assert_eq!(init.next_id, FIRST_NON_SINGLETON_ADDR + 3);
    assert_eq!(
        init.resolve_address(&store, &a).unwrap(),
        Some(Address::new_id(FIRST_NON_SINGLETON_ADDR))
    );
    assert_eq!(
        init.resolve_address(&store, &b).unwrap(),
        Some(Address::new_id(FIRST_NON_SINGLETON_ADDR + 1))
    );
    assert_eq!(
        init.resolve_address(&store, &c).unwrap(),
        Some(Address::new_id(FIRST_NON_SINGLETON_ADDR + 2))
    );

    // exactly one address map entry per configured account
    let map = make_map_with_root::<_, ActorID>(&init.address_map, &store).unwrap();
    let mut entries = 0;
    map.for_each(|_, _| {
        entries += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(entries, 3);
}

#[test]
fn later_miners_observe_earlier_ones() {
    let a = addr(b"a");
    let b = addr(b"b");
    let store = MemoryBlockstore::default();
    let config = config_with(
        &[(a, 1), (b, 2)],
        vec![miner_of(a, b"m0"), miner_of(b, b"m1")],
    );
    let bootstrap = make_genesis(&store, &config).unwrap();
    let tree = state_tree(&store, &bootstrap.genesis);

    // accounts take 100..=101, miners 102..=103 in order
    let m0 = Address::new_id(FIRST_NON_SINGLETON_ADDR + 2);
    let m1 = Address::new_id(FIRST_NON_SINGLETON_ADDR + 3);

    let market = market_state(&store, &tree);
    assert_eq!(
        market.total_storage,
        StoragePower::from(2 * GENESIS_MINER_POWER)
    );
    let miners = make_map_with_root::<_, ()>(&market.miners, &store).unwrap();
    assert!(miners.contains_key(&addr_key(&m0)).unwrap());
    assert!(miners.contains_key(&addr_key(&m1)).unwrap());

    for m in [m0, m1] {
        let state = miner_state(&store, &tree, &m);
        assert_eq!(state.power, StoragePower::from(GENESIS_MINER_POWER));
    }
    assert_eq!(miner_state(&store, &tree, &m0).owner, a);
    assert_eq!(miner_state(&store, &tree, &m1).owner, b);
}

#[test]
fn supply_is_conserved() {
    let a = addr(b"a");
    let b = addr(b"b");
    let store = MemoryBlockstore::default();
    let config = config_with(&[(a, 1_000), (b, 2_000)], vec![miner_of(a, b"m0")]);
    let bootstrap = make_genesis(&store, &config).unwrap();
    let tree = state_tree(&store, &bootstrap.genesis);

    let mut total = TokenAmount::zero();
    tree.for_each(|_, act| {
        total += &act.balance;
        Ok(())
    })
    .unwrap();
    assert_eq!(total, *TOTAL_TOKEN_SUPPLY);
}

#[test]
fn end_to_end_scenario() {
    let owner = addr(b"A");
    let worker = addr(b"B");
    let store = MemoryBlockstore::default();
    let config = GenesisConfig {
        balances: [(owner, TokenAmount::from_atto(100))].into_iter().collect(),
        miners: vec![MinerConfig {
            owner,
            worker,
            peer_id: b"P".to_vec(),
        }],
        timestamp: 123_456,
    };

    let bootstrap = make_genesis(&store, &config).unwrap();
    let genesis = &bootstrap.genesis;
    let tree = state_tree(&store, genesis);

    // reserve holds everything the single account doesn't
    let network = tree.get_actor(&NETWORK_ACTOR_ADDR).unwrap().unwrap();
    assert_eq!(
        network.balance,
        TOTAL_TOKEN_SUPPLY.clone() - TokenAmount::from_atto(100)
    );
    let account = tree.get_actor(&owner).unwrap().unwrap();
    assert_eq!(account.balance, TokenAmount::from_atto(100));
    let burnt = tree.get_actor(&BURNT_FUNDS_ACTOR_ADDR).unwrap().unwrap();
    assert_eq!(burnt.balance, TokenAmount::zero());

    let miner_addr = Address::new_id(FIRST_NON_SINGLETON_ADDR + 1);
    let miner = miner_state(&store, &tree, &miner_addr);
    assert_eq!(miner.owner, owner);
    assert_eq!(miner.worker, worker);
    assert_eq!(miner.peer_id, b"P".to_vec());
    assert_eq!(miner.sector_size, GENESIS_SECTOR_SIZE);
    assert_eq!(miner.power, StoragePower::from(GENESIS_MINER_POWER));

    // header shape
    assert_eq!(genesis.epoch, 0);
    assert!(genesis.parents.is_empty());
    assert_eq!(genesis.weight, BigInt::zero());
    assert_eq!(genesis.timestamp, 123_456);
    let meta: TxMeta = store.get_cbor_required(&genesis.messages).unwrap();
    assert_eq!(meta.bls_message_root, meta.secp_message_root);

    // the persisted header is the chain head
    let cs = ChainStore::new(Arc::new(store), genesis.clone()).unwrap();
    let head = cs.heaviest_tipset();
    assert_eq!(head.key().to_cids(), vec![*genesis.cid()]);
    assert_eq!(head.min_timestamp(), 123_456);
    assert_eq!(head, Arc::new(Tipset::from(genesis.clone())));
}

#[test]
fn failed_replayed_message_is_fatal() {
    // storage updates may only come from registered miners; replaying one
    // from a plain account is rejected by the market actor, and any
    // non-success exit must abort construction
    let a = addr(b"a");
    let store = MemoryBlockstore::default();
    let config = config_with(&[(a, 10)], vec![]);

    let root = make_initial_state_tree(&store, &config).unwrap();
    let mut vm = VM::new(&root, &store, 0).unwrap();
    let params = RawBytes::serialize(market::UpdateStorageParams {
        delta: StoragePower::from(GENESIS_MINER_POWER),
    })
    .unwrap();

    let err = do_exec(
        &mut vm,
        STORAGE_MARKET_ACTOR_ADDR,
        a,
        market::Method::UpdateStorage as MethodNum,
        params,
    )
    .unwrap_err();
    match err {
        GenesisError::Execution {
            to,
            method,
            exit_code,
            ..
        } => {
            assert_eq!(to, STORAGE_MARKET_ACTOR_ADDR);
            assert_eq!(method, market::Method::UpdateStorage as MethodNum);
            assert_eq!(exit_code, ExitCode::USR_FORBIDDEN);
        }
        other => panic!("expected execution error, got {other}"),
    }
}

#[test]
fn duplicate_account_and_singleton_address_collides() {
    let store = MemoryBlockstore::default();
    let mut config = config_with(&[], vec![]);
    config
        .balances
        .insert(NETWORK_ACTOR_ADDR, TokenAmount::from_atto(5));

    let err = make_genesis(&store, &config).unwrap_err();
    assert!(matches!(
        err,
        GenesisError::DuplicateAddress(a) if a == NETWORK_ACTOR_ADDR
    ));
}
