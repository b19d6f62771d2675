// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use crate::blocks::{CachingBlockHeader, Tipset};
use crate::utils::db::CborStoreExt as _;
use anyhow::Context as _;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::Mutex;
use tracing::info;

/// Stores chain data such as the genesis block header and tracks the current
/// heaviest tipset, the chain head that consumers poll.
pub struct ChainStore<DB> {
    db: Arc<DB>,
    genesis_block_header: CachingBlockHeader,
    heaviest: Mutex<Arc<Tipset>>,
}

impl<DB> ChainStore<DB>
where
    DB: Blockstore,
{
    /// Creates a store rooted at the given genesis header. The header is
    /// persisted and becomes the initial heaviest tipset.
    pub fn new(db: Arc<DB>, genesis_block_header: CachingBlockHeader) -> anyhow::Result<Self> {
        let (cid, data) = genesis_block_header.car_block()?;
        db.put_keyed(&cid, &data)?;

        let heaviest = Arc::new(Tipset::from(genesis_block_header.clone()));
        Ok(Self {
            db,
            genesis_block_header,
            heaviest: Mutex::new(heaviest),
        })
    }

    pub fn blockstore(&self) -> &DB {
        &self.db
    }

    /// Returns the genesis block header.
    pub fn genesis(&self) -> &CachingBlockHeader {
        &self.genesis_block_header
    }

    /// Returns the currently tracked heaviest tipset, the chain head.
    pub fn heaviest_tipset(&self) -> Arc<Tipset> {
        self.heaviest.lock().clone()
    }

    /// Replaces the tracked heaviest tipset. Block headers of the tipset must
    /// already be persisted.
    pub fn set_heaviest_tipset(&self, ts: Arc<Tipset>) -> anyhow::Result<()> {
        for header in ts.block_headers() {
            self.db
                .get_cbor_required::<crate::blocks::RawBlockHeader>(header.cid())
                .context("tipset header not persisted")?;
        }
        info!("New heaviest tipset! {} (EPOCH = {})", ts.key(), ts.epoch());
        *self.heaviest.lock() = ts;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{RawBlockHeader, Ticket, TipsetKey, VRFProof};
    use cid::Cid;
    use fvm_ipld_blockstore::MemoryBlockstore;
    use fvm_shared::address::Address;
    use fvm_shared::bigint::BigInt;
    use num_traits::Zero;

    fn genesis_header(timestamp: u64) -> CachingBlockHeader {
        CachingBlockHeader::new(RawBlockHeader {
            miner_address: Address::new_id(0),
            ticket: Some(Ticket::new(VRFProof::new(b"vrf proof".to_vec()))),
            election_proof: None,
            parents: TipsetKey::default(),
            weight: BigInt::zero(),
            epoch: 0,
            state_root: Cid::default(),
            message_receipts: Cid::default(),
            messages: Cid::default(),
            bls_aggregate: None,
            timestamp,
            signature: None,
            fork_signal: 0,
        })
    }

    #[test]
    fn head_starts_at_genesis() {
        let db = Arc::new(MemoryBlockstore::default());
        let genesis = genesis_header(100);
        let cs = ChainStore::new(db, genesis.clone()).unwrap();

        let head = cs.heaviest_tipset();
        assert_eq!(head.epoch(), 0);
        assert_eq!(head.min_timestamp(), 100);
        assert_eq!(head.key().to_cids(), vec![*genesis.cid()]);
    }

    #[test]
    fn genesis_header_is_persisted() {
        let db = Arc::new(MemoryBlockstore::default());
        let genesis = genesis_header(100);
        let cs = ChainStore::new(db.clone(), genesis.clone()).unwrap();

        let loaded = CachingBlockHeader::load(&*db, *cs.genesis().cid())
            .unwrap()
            .unwrap();
        assert_eq!(loaded, genesis);
    }

    #[test]
    fn set_heaviest_rejects_unpersisted_headers() {
        let db = Arc::new(MemoryBlockstore::default());
        let cs = ChainStore::new(db, genesis_header(100)).unwrap();

        let other = Tipset::from(genesis_header(200));
        assert!(cs.set_heaviest_tipset(Arc::new(other)).is_err());
    }
}
