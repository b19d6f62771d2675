// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actors::{
    init, make_empty_map, market, miner, Singleton, ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_ADDR,
    INIT_ACTOR_CODE_ID, MARKET_ACTOR_CODE_ID, STORAGE_MARKET_ACTOR_ADDR, TOTAL_TOKEN_SUPPLY,
};
use crate::blocks::{
    CachingBlockHeader, ElectionProof, RawBlockHeader, Ticket, TipsetKey, TxMeta, VRFProof,
};
use crate::interpreter::VM;
use crate::state_tree::StateTree;
use crate::utils::db::CborStoreExt as _;
use crate::vm::ActorState;
use cid::Cid;
use fvm_ipld_amt::Amt;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::bigint::BigInt;
use fvm_shared::crypto::signature::Signature;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::message::Message;
use fvm_shared::sector::{SectorSize, StoragePower};
use fvm_shared::{ActorID, MethodNum};
use indexmap::IndexMap;
use num_traits::Zero;
use thiserror::Error;
use tracing::{debug, info};

/// Storage announced by each genesis miner, and the power it is credited
/// with before a real proof-of-storage workflow exists.
pub const GENESIS_MINER_POWER: i64 = 5000;

/// Gas limit applied to messages replayed during genesis construction.
pub const GENESIS_GAS_LIMIT: u64 = 1_000_000;

/// Sector size registered for genesis miners.
pub const GENESIS_SECTOR_SIZE: SectorSize = SectorSize::_2KiB;

#[derive(Debug, Error)]
pub enum GenesisError {
    /// The configuration is malformed or over-commits the token supply.
    /// Reported before any blockstore work begins.
    #[error("invalid genesis config: {0}")]
    Config(String),
    /// Two genesis actors were assigned the same address.
    #[error("duplicate actor address at genesis: {0}")]
    DuplicateAddress(Address),
    /// A replayed genesis message did not exit cleanly.
    #[error("genesis message (method {method} on {to}) failed: {exit_code:?}: {message}")]
    Execution {
        to: Address,
        method: MethodNum,
        exit_code: ExitCode,
        message: String,
    },
    /// Blockstore or serialization failure.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Per-miner genesis configuration. Miners are processed strictly in the
/// order given, and the creating message is sent from the owner address,
/// which must hold a configured balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerConfig {
    pub owner: Address,
    pub worker: Address,
    pub peer_id: Vec<u8>,
}

/// Immutable input to genesis construction. Account IDs are handed out in
/// the iteration order of `balances`, which for [`IndexMap`] is insertion
/// order.
#[derive(Debug, Clone, Default)]
pub struct GenesisConfig {
    pub balances: IndexMap<Address, TokenAmount>,
    pub miners: Vec<MinerConfig>,
    /// Genesis block timestamp, in seconds since the Unix epoch. The only
    /// time input to the whole pipeline.
    pub timestamp: u64,
}

/// The output of genesis construction: the persisted genesis block header.
#[derive(Debug)]
pub struct GenesisBootstrap {
    pub genesis: CachingBlockHeader,
}

/// Constructs the genesis state and block for the given configuration.
/// Construction is all-or-nothing; on error no genesis block is produced,
/// and any blockstore content already written is unreferenced.
pub fn make_genesis<DB>(store: &DB, config: &GenesisConfig) -> Result<GenesisBootstrap, GenesisError>
where
    DB: Blockstore,
{
    validate_config(config)?;

    let state_root = make_initial_state_tree(store, config)?;
    debug!("Initial state root: {state_root}");

    let state_root = setup_storage_miners(store, state_root, &config.miners)?;
    debug!("State root after miner bootstrap: {state_root}");

    let genesis = make_genesis_block(store, state_root, config)?;
    info!("Genesis block created: {}", genesis.cid());

    Ok(GenesisBootstrap { genesis })
}

/// Checks configuration shape and balance accounting. Performs no blockstore
/// reads or writes; a rejected configuration leaves no side effects.
pub fn validate_config(config: &GenesisConfig) -> Result<(), GenesisError> {
    let mut total = TokenAmount::zero();
    for (addr, balance) in &config.balances {
        if balance < &TokenAmount::zero() {
            return Err(GenesisError::Config(format!(
                "negative balance {balance} configured for {addr}"
            )));
        }
        total += balance;
    }

    if total > *TOTAL_TOKEN_SUPPLY {
        return Err(GenesisError::Config(format!(
            "configured balances {} exceed the total token supply {}",
            total, *TOTAL_TOKEN_SUPPLY
        )));
    }

    for (i, m) in config.miners.iter().enumerate() {
        if !config.balances.contains_key(&m.owner) {
            return Err(GenesisError::Config(format!(
                "miner config {i}: owner {} holds no configured balance",
                m.owner
            )));
        }
        if m.peer_id.is_empty() {
            return Err(GenesisError::Config(format!("miner config {i}: empty peer id")));
        }
    }

    Ok(())
}

/// Builds the init actor state, assigning each configured address a
/// sequential ID starting at the reserved offset.
fn setup_init_actor<DB>(store: &DB, addrs: &[Address]) -> Result<ActorState, GenesisError>
where
    DB: Blockstore,
{
    let empty = make_empty_map::<_, ActorID>(store)
        .flush()
        .map_err(anyhow::Error::from)?;
    let mut state = init::State::new(empty);

    for addr in addrs {
        state
            .map_address_to_new_id(store, addr)
            .map_err(anyhow::Error::from)?;
    }

    let head = store.put_cbor_default(&state)?;
    Ok(ActorState::new(
        *INIT_ACTOR_CODE_ID,
        head,
        TokenAmount::zero(),
        0,
    ))
}

/// Builds the storage market actor with an empty miners map and zero total
/// storage.
fn setup_storage_market_actor<DB>(store: &DB) -> Result<ActorState, GenesisError>
where
    DB: Blockstore,
{
    let empty = make_empty_map::<_, ()>(store)
        .flush()
        .map_err(anyhow::Error::from)?;
    let head = store.put_cbor_default(&market::State::new(empty))?;
    Ok(ActorState::new(
        *MARKET_ACTOR_CODE_ID,
        head,
        TokenAmount::zero(),
        0,
    ))
}

/// Seeds the state tree with the builtin singletons and one account actor
/// per configured balance, and returns the flushed root.
fn make_initial_state_tree<DB>(store: &DB, config: &GenesisConfig) -> Result<Cid, GenesisError>
where
    DB: Blockstore,
{
    let mut state_tree = StateTree::new(store);

    let empty_object = store.put_cbor_default(&[(); 0])?;

    // Whatever the accounts don't hold, the network reserve does.
    // validate_config has already ruled out over-commitment.
    let configured: TokenAmount = config.balances.values().fold(TokenAmount::zero(), |a, b| a + b);
    let reserve = TOTAL_TOKEN_SUPPLY.clone() - configured;

    let addrs: Vec<Address> = config.balances.keys().copied().collect();
    for singleton in Singleton::ALL {
        let actor = match singleton {
            Singleton::Init => setup_init_actor(store, &addrs)?,
            Singleton::Network => {
                ActorState::new(*ACCOUNT_ACTOR_CODE_ID, empty_object, reserve.clone(), 0)
            }
            Singleton::StorageMarket => setup_storage_market_actor(store)?,
            Singleton::BurntFunds => {
                ActorState::new(*ACCOUNT_ACTOR_CODE_ID, empty_object, TokenAmount::zero(), 0)
            }
        };
        create_actor(&mut state_tree, &singleton.address(), actor)?;
    }

    for (addr, balance) in &config.balances {
        create_actor(
            &mut state_tree,
            addr,
            ActorState::new(*ACCOUNT_ACTOR_CODE_ID, empty_object, balance.clone(), 0),
        )?;
    }

    Ok(state_tree.flush()?)
}

/// Inserts an actor at a fresh address. Two genesis actors landing on the
/// same address is a fatal construction error.
fn create_actor<DB>(
    state_tree: &mut StateTree<'_, DB>,
    addr: &Address,
    actor: ActorState,
) -> Result<(), GenesisError>
where
    DB: Blockstore,
{
    if state_tree.get_actor(addr)?.is_some() {
        return Err(GenesisError::DuplicateAddress(*addr));
    }
    state_tree.set_actor(addr, actor)?;
    Ok(())
}

/// Creates and powers up the configured miners by replaying synthetic
/// messages through the interpreter, in configuration order. Returns the
/// canonical genesis state root.
fn setup_storage_miners<DB>(
    store: &DB,
    state_root: Cid,
    miners: &[MinerConfig],
) -> Result<Cid, GenesisError>
where
    DB: Blockstore,
{
    let mut vm = VM::new(&state_root, store, 0)?;

    for m in miners {
        let params = RawBytes::serialize(market::CreateStorageMinerParams {
            owner: m.owner,
            worker: m.worker,
            sector_size: GENESIS_SECTOR_SIZE,
            peer_id: m.peer_id.clone(),
        })
        .map_err(anyhow::Error::from)?;
        let ret = do_exec(
            &mut vm,
            STORAGE_MARKET_ACTOR_ADDR,
            m.owner,
            market::Method::CreateStorageMiner as MethodNum,
            params,
        )?;
        let miner_addr = Address::from_bytes(&ret).map_err(|e| GenesisError::Execution {
            to: STORAGE_MARKET_ACTOR_ADDR,
            method: market::Method::CreateStorageMiner as MethodNum,
            exit_code: ExitCode::OK,
            message: format!("unparseable miner address in return value: {e}"),
        })?;
        info!("Created genesis miner {miner_addr} (owner {})", m.owner);

        let params = RawBytes::serialize(market::UpdateStorageParams {
            delta: StoragePower::from(GENESIS_MINER_POWER),
        })
        .map_err(anyhow::Error::from)?;
        do_exec(
            &mut vm,
            STORAGE_MARKET_ACTOR_ADDR,
            miner_addr,
            market::Method::UpdateStorage as MethodNum,
            params,
        )?;

        // Deferred interpreter writes must land before the state body can be
        // read back.
        vm.flush()?;
        bootstrap_miner_power(vm.state_tree_mut(), &miner_addr)?;
    }

    Ok(vm.flush()?)
}

/// Overwrites the miner's power with the fixed bootstrap figure, bypassing
/// the interpreter. Stand-in for a proof-of-storage submission flow that
/// does not exist at genesis time; touches only the given miner's record
/// and state body.
fn bootstrap_miner_power<DB>(
    state_tree: &mut StateTree<'_, DB>,
    miner_addr: &Address,
) -> Result<(), GenesisError>
where
    DB: Blockstore,
{
    let store = state_tree.store();
    let mut actor = state_tree
        .get_actor(miner_addr)?
        .ok_or_else(|| anyhow::anyhow!("genesis miner {miner_addr} disappeared"))?;
    let mut state: miner::State = store.get_cbor_required(&actor.state)?;

    state.power = StoragePower::from(GENESIS_MINER_POWER);

    actor.state = store.put_cbor_default(&state)?;
    state_tree.set_actor(miner_addr, actor)?;
    Ok(())
}

/// Applies a message through the interpreter with genesis gas settings.
/// A non-zero exit code is fatal.
fn do_exec<DB>(
    vm: &mut VM<'_, DB>,
    to: Address,
    from: Address,
    method: MethodNum,
    params: RawBytes,
) -> Result<RawBytes, GenesisError>
where
    DB: Blockstore,
{
    let sequence = vm
        .state_tree()
        .get_actor(&from)?
        .ok_or_else(|| anyhow::anyhow!("genesis message sender {from} does not exist"))?
        .sequence;

    let msg = Message {
        version: 0,
        from,
        to,
        sequence,
        value: TokenAmount::zero(),
        method_num: method,
        params,
        gas_limit: GENESIS_GAS_LIMIT,
        gas_fee_cap: TokenAmount::zero(),
        gas_premium: TokenAmount::zero(),
    };

    let ret = vm.apply_implicit_message(&msg)?;
    if let Some(err) = ret.act_error {
        return Err(GenesisError::Execution {
            to,
            method,
            exit_code: ret.msg_receipt.exit_code,
            message: err.to_string(),
        });
    }

    Ok(ret.msg_receipt.return_data)
}

/// Assembles and persists the genesis block header around the final state
/// root. The genesis block carries no messages; both message list roots are
/// the empty AMT.
fn make_genesis_block<DB>(
    store: &DB,
    state_root: Cid,
    config: &GenesisConfig,
) -> Result<CachingBlockHeader, GenesisError>
where
    DB: Blockstore,
{
    let empty_root = Amt::<Cid, _>::new(store)
        .flush()
        .map_err(anyhow::Error::from)?;
    let messages = store.put_cbor_default(&TxMeta {
        bls_message_root: empty_root,
        secp_message_root: empty_root,
    })?;

    let header = RawBlockHeader {
        miner_address: INIT_ACTOR_ADDR,
        ticket: Some(Ticket::new(VRFProof::new(b"vrf proof".to_vec()))),
        election_proof: Some(ElectionProof {
            win_count: 0,
            vrfproof: VRFProof::new(b"the Genesis block".to_vec()),
        }),
        parents: TipsetKey::default(),
        weight: BigInt::zero(),
        epoch: 0,
        state_root,
        message_receipts: empty_root,
        messages,
        bls_aggregate: Some(Signature::new_bls(b"signatureeee".to_vec())),
        timestamp: config.timestamp,
        signature: Some(Signature::new_bls(b"block signatureeee".to_vec())),
        fork_signal: 0,
    };

    let (cid, data) = header.car_block()?;
    store.put_keyed(&cid, &data).map_err(anyhow::Error::from)?;

    Ok(CachingBlockHeader::new(header))
}

#[cfg(test)]
mod tests;
