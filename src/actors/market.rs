// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actor_error;
use crate::actors::{
    addr_key, make_map_with_root, INIT_ACTOR_ADDR, MINER_ACTOR_CODE_ID,
};
use crate::state_tree::StateTree;
use crate::utils::db::CborStoreExt;
use crate::vm::{ActorError, ActorState};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::{SectorSize, StoragePower};
use fvm_shared::{MethodNum, METHOD_CONSTRUCTOR};
use num_derive::FromPrimitive;
use num_traits::{FromPrimitive, Zero};

use super::miner;

/// State of the storage market actor: the set of registered miners and the
/// network-wide storage aggregate.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// HAMT keyed by miner address; empty at genesis
    pub miners: Cid,
    /// Total storage announced across all miners
    #[serde(with = "bigint_ser")]
    pub total_storage: StoragePower,
}

impl State {
    pub fn new(empty_map: Cid) -> Self {
        Self {
            miners: empty_map,
            total_storage: StoragePower::zero(),
        }
    }
}

/// Storage market actor methods.
#[derive(FromPrimitive)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    CreateStorageMiner = 2,
    UpdateStorage = 3,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug)]
pub struct CreateStorageMinerParams {
    pub owner: Address,
    pub worker: Address,
    pub sector_size: SectorSize,
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
}

#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug)]
pub struct UpdateStorageParams {
    #[serde(with = "bigint_ser")]
    pub delta: StoragePower,
}

/// Storage market actor.
pub struct Actor;

impl Actor {
    /// Creates a new storage miner actor: allocates an ID through the init
    /// actor, installs the miner's state, and registers it in the miners map.
    /// Returns the new miner's address bytes.
    fn create_storage_miner<BS: Blockstore>(
        state_tree: &mut StateTree<'_, BS>,
        market_addr: &Address,
        caller: &Address,
        params: CreateStorageMinerParams,
    ) -> Result<RawBytes, ActorError> {
        if caller != &params.owner {
            return Err(actor_error!(USR_FORBIDDEN;
                "miner creation must come from the owner, got {}", caller));
        }

        let store = state_tree.store();

        // Allocate an ID for the new miner through the init actor.
        let mut init_actor = state_tree
            .get_actor(&INIT_ACTOR_ADDR)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load init actor: {}", e))?
            .ok_or_else(|| actor_error!(USR_ILLEGAL_STATE; "init actor not found"))?;
        let mut init_state: super::init::State = store
            .get_cbor_required(&init_actor.state)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load init state: {}", e))?;
        let miner_addr = init_state.allocate_new_actor_id();
        init_actor.state = store
            .put_cbor_default(&init_state)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to store init state: {}", e))?;
        state_tree
            .set_actor(&INIT_ACTOR_ADDR, init_actor)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to update init actor: {}", e))?;

        // Install the miner actor itself.
        let miner_state = miner::State::new(
            params.owner,
            params.worker,
            params.peer_id,
            params.sector_size,
        );
        let head = store
            .put_cbor_default(&miner_state)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to store miner state: {}", e))?;
        let miner_actor = ActorState::new(*MINER_ACTOR_CODE_ID, head, TokenAmount::zero(), 0);
        state_tree
            .set_actor(&miner_addr, miner_actor)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to install miner: {}", e))?;

        // Register the miner with the market.
        Self::mutate_state(state_tree, market_addr, |st, store| {
            let mut miners = make_map_with_root::<_, ()>(&st.miners, store)
                .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load miners map: {}", e))?;
            miners
                .set(addr_key(&miner_addr), ())
                .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to register miner: {}", e))?;
            st.miners = miners
                .flush()
                .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to flush miners map: {}", e))?;
            Ok(())
        })?;

        Ok(RawBytes::new(miner_addr.to_bytes()))
    }

    /// Adjusts the network-wide storage total. May only be called by a
    /// registered miner.
    fn update_storage<BS: Blockstore>(
        state_tree: &mut StateTree<'_, BS>,
        market_addr: &Address,
        caller: &Address,
        params: UpdateStorageParams,
    ) -> Result<RawBytes, ActorError> {
        Self::mutate_state(state_tree, market_addr, |st, store| {
            let miners = make_map_with_root::<_, ()>(&st.miners, store)
                .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load miners map: {}", e))?;
            let registered = miners
                .contains_key(&addr_key(caller))
                .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to check miner: {}", e))?;
            if !registered {
                return Err(actor_error!(USR_FORBIDDEN;
                    "storage update from unregistered miner {}", caller));
            }

            st.total_storage += &params.delta;
            Ok(())
        })?;

        Ok(RawBytes::default())
    }

    /// Loads the market state, applies `f`, and writes the state back,
    /// updating the market actor's state root.
    fn mutate_state<BS, F>(
        state_tree: &mut StateTree<'_, BS>,
        market_addr: &Address,
        f: F,
    ) -> Result<(), ActorError>
    where
        BS: Blockstore,
        F: FnOnce(&mut State, &BS) -> Result<(), ActorError>,
    {
        let store = state_tree.store();
        let mut actor = state_tree
            .get_actor(market_addr)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load market actor: {}", e))?
            .ok_or_else(|| actor_error!(USR_ILLEGAL_STATE; "market actor not found"))?;
        let mut st: State = store
            .get_cbor_required(&actor.state)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load market state: {}", e))?;

        f(&mut st, store)?;

        actor.state = store
            .put_cbor_default(&st)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to store market state: {}", e))?;
        state_tree
            .set_actor(market_addr, actor)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to update market actor: {}", e))
    }

    /// Method dispatch for the storage market actor.
    pub fn invoke_method<BS: Blockstore>(
        state_tree: &mut StateTree<'_, BS>,
        market_addr: &Address,
        caller: &Address,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError> {
        match Method::from_u64(method) {
            Some(Method::Constructor) => Err(actor_error!(USR_FORBIDDEN;
                "the storage market actor is constructed at genesis")),
            Some(Method::CreateStorageMiner) => {
                let params = params
                    .deserialize()
                    .map_err(|e| actor_error!(USR_SERIALIZATION; "invalid params: {}", e))?;
                Self::create_storage_miner(state_tree, market_addr, caller, params)
            }
            Some(Method::UpdateStorage) => {
                let params = params
                    .deserialize()
                    .map_err(|e| actor_error!(USR_SERIALIZATION; "invalid params: {}", e))?;
                Self::update_storage(state_tree, market_addr, caller, params)
            }
            None => Err(actor_error!(USR_UNHANDLED_MESSAGE;
                "invalid method {} for storage market actor", method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{
        init, make_empty_map, INIT_ACTOR_CODE_ID, MARKET_ACTOR_CODE_ID,
        STORAGE_MARKET_ACTOR_ADDR,
    };
    use fvm_ipld_blockstore::MemoryBlockstore;
    use fvm_shared::error::ExitCode;
    use fvm_shared::ActorID;

    fn setup(store: &MemoryBlockstore) -> StateTree<'_, MemoryBlockstore> {
        let mut tree = StateTree::new(store);

        let empty_addresses = make_empty_map::<_, ActorID>(store).flush().unwrap();
        let init_head = store
            .put_cbor_default(&init::State::new(empty_addresses))
            .unwrap();
        tree.set_actor(
            &INIT_ACTOR_ADDR,
            ActorState::new(*INIT_ACTOR_CODE_ID, init_head, TokenAmount::zero(), 0),
        )
        .unwrap();

        let empty_miners = make_empty_map::<_, ()>(store).flush().unwrap();
        let market_head = store.put_cbor_default(&State::new(empty_miners)).unwrap();
        tree.set_actor(
            &STORAGE_MARKET_ACTOR_ADDR,
            ActorState::new(*MARKET_ACTOR_CODE_ID, market_head, TokenAmount::zero(), 0),
        )
        .unwrap();

        tree
    }

    fn create_params(owner: Address) -> RawBytes {
        RawBytes::serialize(CreateStorageMinerParams {
            owner,
            worker: Address::new_id(201),
            sector_size: SectorSize::_2KiB,
            peer_id: b"peer".to_vec(),
        })
        .unwrap()
    }

    fn update_params(delta: i64) -> RawBytes {
        RawBytes::serialize(UpdateStorageParams {
            delta: StoragePower::from(delta),
        })
        .unwrap()
    }

    fn market_state(store: &MemoryBlockstore, tree: &StateTree<'_, MemoryBlockstore>) -> State {
        let act = tree.get_actor(&STORAGE_MARKET_ACTOR_ADDR).unwrap().unwrap();
        store.get_cbor_required(&act.state).unwrap()
    }

    #[test]
    fn create_from_non_owner_is_forbidden() {
        let store = MemoryBlockstore::default();
        let mut tree = setup(&store);

        let err = Actor::invoke_method(
            &mut tree,
            &STORAGE_MARKET_ACTOR_ADDR,
            &Address::new_id(300),
            Method::CreateStorageMiner as MethodNum,
            &create_params(Address::new_id(200)),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::USR_FORBIDDEN);
    }

    #[test]
    fn update_from_unregistered_miner_is_forbidden() {
        let store = MemoryBlockstore::default();
        let mut tree = setup(&store);

        let err = Actor::invoke_method(
            &mut tree,
            &STORAGE_MARKET_ACTOR_ADDR,
            &Address::new_id(300),
            Method::UpdateStorage as MethodNum,
            &update_params(5000),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::USR_FORBIDDEN);
        assert_eq!(market_state(&store, &tree).total_storage, StoragePower::zero());
    }

    #[test]
    fn create_then_update_adjusts_total_storage() {
        let store = MemoryBlockstore::default();
        let mut tree = setup(&store);
        let owner = Address::new_id(200);

        let ret = Actor::invoke_method(
            &mut tree,
            &STORAGE_MARKET_ACTOR_ADDR,
            &owner,
            Method::CreateStorageMiner as MethodNum,
            &create_params(owner),
        )
        .unwrap();
        let miner_addr = Address::from_bytes(&ret).unwrap();

        let st = market_state(&store, &tree);
        let miners = make_map_with_root::<_, ()>(&st.miners, &store).unwrap();
        assert!(miners.contains_key(&addr_key(&miner_addr)).unwrap());

        Actor::invoke_method(
            &mut tree,
            &STORAGE_MARKET_ACTOR_ADDR,
            &miner_addr,
            Method::UpdateStorage as MethodNum,
            &update_params(5000),
        )
        .unwrap();
        assert_eq!(
            market_state(&store, &tree).total_storage,
            StoragePower::from(5000)
        );
    }

    #[test]
    fn unknown_method_is_unhandled() {
        let store = MemoryBlockstore::default();
        let mut tree = setup(&store);

        let err = Actor::invoke_method(
            &mut tree,
            &STORAGE_MARKET_ACTOR_ADDR,
            &Address::new_id(300),
            42,
            &RawBytes::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::USR_UNHANDLED_MESSAGE);
    }
}
