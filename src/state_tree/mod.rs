// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::RefCell;
use std::collections::HashMap;

use crate::actors::{addr_key, HAMT_BIT_WIDTH};
use crate::vm::ActorState;
use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_hamt::Hamt;
use fvm_shared::address::Address;

/// State tree implementation using HAMT. This structure is not threadsafe and
/// should only be used in sync contexts.
///
/// The root CID produced by [`StateTree::flush`] is a pure function of the set
/// of (address, actor) pairs: the backing HAMT is insertion-order independent,
/// and the write-back cache is drained into it wholesale on flush.
pub struct StateTree<'db, S> {
    hamt: Hamt<&'db S, ActorState>,
    store: &'db S,

    /// Actor state cache; entries are written back to the HAMT on flush.
    /// `None` marks a deletion.
    actor_cache: RefCell<HashMap<Address, Option<ActorState>>>,
}

impl<'db, S> StateTree<'db, S>
where
    S: Blockstore,
{
    /// Create an empty state tree over the given store.
    pub fn new(store: &'db S) -> Self {
        Self {
            hamt: Hamt::new_with_bit_width(store, HAMT_BIT_WIDTH),
            store,
            actor_cache: Default::default(),
        }
    }

    /// Constructor for a HAMT state tree given an IPLD store and a root CID.
    pub fn new_from_root(store: &'db S, c: &Cid) -> anyhow::Result<Self> {
        let hamt = Hamt::load_with_bit_width(c, store, HAMT_BIT_WIDTH)
            .with_context(|| format!("failed to load state tree root {c}"))?;
        Ok(Self {
            hamt,
            store,
            actor_cache: Default::default(),
        })
    }

    /// Retrieve store reference to modify db.
    pub fn store(&self) -> &'db S {
        self.store
    }

    /// Get actor state from an address.
    pub fn get_actor(&self, addr: &Address) -> anyhow::Result<Option<ActorState>> {
        if let Some(state) = self.actor_cache.borrow().get(addr) {
            return Ok(state.clone());
        }

        let act = self.hamt.get(&addr_key(addr))?.cloned();
        if let Some(act_s) = &act {
            self.actor_cache
                .borrow_mut()
                .insert(*addr, Some(act_s.clone()));
        }

        Ok(act)
    }

    /// Set actor state for an address, replacing any previous record.
    pub fn set_actor(&mut self, addr: &Address, actor: ActorState) -> anyhow::Result<()> {
        self.actor_cache.borrow_mut().insert(*addr, Some(actor));
        Ok(())
    }

    /// Delete the actor for an address.
    pub fn delete_actor(&mut self, addr: &Address) -> anyhow::Result<()> {
        self.actor_cache.borrow_mut().insert(*addr, None);
        Ok(())
    }

    /// Mutate and set actor state for an address.
    pub fn mutate_actor<F>(&mut self, addr: &Address, mutate: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut ActorState) -> anyhow::Result<()>,
    {
        let mut act = self
            .get_actor(addr)?
            .with_context(|| format!("actor for address {addr} does not exist"))?;

        mutate(&mut act)?;
        self.set_actor(addr, act)
    }

    /// Flush the cache into the HAMT and return the root CID.
    pub fn flush(&mut self) -> anyhow::Result<Cid> {
        for (addr, state) in self.actor_cache.borrow().iter() {
            match state {
                None => {
                    self.hamt.delete(&addr_key(addr))?;
                }
                Some(state) => {
                    self.hamt.set(addr_key(addr), state.clone())?;
                }
            }
        }

        Ok(self.hamt.flush()?)
    }

    /// Iterate over all (address, actor) pairs materialized in the HAMT.
    /// Callers must flush first for cached writes to be visible.
    pub fn for_each<F>(&self, mut f: F) -> anyhow::Result<()>
    where
        F: FnMut(Address, &ActorState) -> anyhow::Result<()>,
    {
        self.hamt.for_each(|k, v| f(Address::from_bytes(&k.0)?, v))?;
        Ok(())
    }
}
