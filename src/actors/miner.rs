// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::sector::{SectorSize, StoragePower};
use num_traits::Zero;

/// State of an individual storage miner actor.
//
// Sector bookkeeping is absent until a real proof-of-storage workflow lands;
// `power` is seeded out of band at genesis (see the genesis bootstrap).
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// Account that owns this miner and receives its rewards
    pub owner: Address,
    /// Worker account, signs block headers and messages on the miner's behalf
    pub worker: Address,
    /// Libp2p identity this miner is reachable at
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
    /// Size of each sector committed by this miner
    pub sector_size: SectorSize,
    /// Storage power claimed by this miner
    #[serde(with = "bigint_ser")]
    pub power: StoragePower,
}

impl State {
    pub fn new(owner: Address, worker: Address, peer_id: Vec<u8>, sector_size: SectorSize) -> Self {
        Self {
            owner,
            worker,
            peer_id,
            sector_size,
            power: StoragePower::zero(),
        }
    }
}
