// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod init;
pub mod market;
pub mod miner;

use std::sync::LazyLock;

use crate::utils::multihash::prelude::*;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::IPLD_RAW;
use fvm_ipld_hamt::{BytesKey, Error as HamtError, Hamt};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::ActorID;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bit width used for all builtin actor HAMTs and the state tree itself.
pub const HAMT_BIT_WIDTH: u32 = 5;

/// First actor ID handed out to non-singleton actors; lower IDs are reserved
/// for the builtin singletons.
pub const FIRST_NON_SINGLETON_ADDR: ActorID = 100;

/// The maximum supply of tokens that will ever exist (in whole token units).
pub const TOTAL_TOKENS: i64 = 2_000_000_000;

/// The maximum supply of tokens that will ever exist, in indivisible units.
pub static TOTAL_TOKEN_SUPPLY: LazyLock<TokenAmount> =
    LazyLock::new(|| TokenAmount::from_whole(TOTAL_TOKENS));

fn make_builtin(bz: &[u8]) -> Cid {
    Cid::new_v1(IPLD_RAW, MultihashCode::Identity.digest(bz))
}

pub static ACCOUNT_ACTOR_CODE_ID: LazyLock<Cid> =
    LazyLock::new(|| make_builtin(b"ember/1/account"));
pub static INIT_ACTOR_CODE_ID: LazyLock<Cid> = LazyLock::new(|| make_builtin(b"ember/1/init"));
pub static MARKET_ACTOR_CODE_ID: LazyLock<Cid> =
    LazyLock::new(|| make_builtin(b"ember/1/storagemarket"));
pub static MINER_ACTOR_CODE_ID: LazyLock<Cid> =
    LazyLock::new(|| make_builtin(b"ember/1/storageminer"));

pub const INIT_ACTOR_ADDR: Address = Address::new_id(0);
pub const NETWORK_ACTOR_ADDR: Address = Address::new_id(1);
pub const STORAGE_MARKET_ACTOR_ADDR: Address = Address::new_id(2);
pub const BURNT_FUNDS_ACTOR_ADDR: Address = Address::new_id(99);

/// The closed set of actors installed at well-known addresses at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Singleton {
    Init,
    Network,
    StorageMarket,
    BurntFunds,
}

impl Singleton {
    pub const ALL: [Singleton; 4] = [
        Singleton::Init,
        Singleton::Network,
        Singleton::StorageMarket,
        Singleton::BurntFunds,
    ];

    pub const fn address(self) -> Address {
        match self {
            Singleton::Init => INIT_ACTOR_ADDR,
            Singleton::Network => NETWORK_ACTOR_ADDR,
            Singleton::StorageMarket => STORAGE_MARKET_ACTOR_ADDR,
            Singleton::BurntFunds => BURNT_FUNDS_ACTOR_ADDR,
        }
    }

    pub fn from_address(addr: &Address) -> Option<Singleton> {
        Self::ALL.into_iter().find(|s| s.address() == *addr)
    }
}

/// Map type used within actors and the state tree. The underlying type is a HAMT.
pub type Map<'bs, BS, V> = Hamt<&'bs BS, V>;

/// Create an empty map configured with the builtin bit width.
pub fn make_empty_map<BS, V>(store: &BS) -> Map<'_, BS, V>
where
    BS: Blockstore,
    V: DeserializeOwned + Serialize,
{
    Hamt::new_with_bit_width(store, HAMT_BIT_WIDTH)
}

/// Load a map with a root CID.
pub fn make_map_with_root<'bs, BS, V>(
    root: &Cid,
    store: &'bs BS,
) -> Result<Map<'bs, BS, V>, HamtError>
where
    BS: Blockstore,
    V: DeserializeOwned + Serialize,
{
    Hamt::load_with_bit_width(root, store, HAMT_BIT_WIDTH)
}

/// HAMT key for an address (its canonical byte representation).
pub fn addr_key(addr: &Address) -> BytesKey {
    BytesKey(addr.to_bytes())
}
