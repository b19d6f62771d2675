// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actors::{addr_key, make_map_with_root, FIRST_NON_SINGLETON_ADDR};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::Error as HamtError;
use fvm_shared::address::Address;
use fvm_shared::ActorID;

/// State of the init actor: allocates actor IDs and records which raw
/// address each ID was handed out for.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// HAMT of raw address bytes to the allocated actor ID
    pub address_map: Cid,
    /// Next actor ID to hand out; starts above the singleton range
    pub next_id: ActorID,
}

impl State {
    pub fn new(address_map: Cid) -> Self {
        Self {
            address_map,
            next_id: FIRST_NON_SINGLETON_ADDR,
        }
    }

    /// Assigns the next available ID to the given address and records the
    /// mapping in the address map.
    pub fn map_address_to_new_id<BS: Blockstore>(
        &mut self,
        store: &BS,
        addr: &Address,
    ) -> Result<Address, HamtError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut map = make_map_with_root::<_, ActorID>(&self.address_map, store)?;
        map.set(addr_key(addr), id)?;
        self.address_map = map.flush()?;

        Ok(Address::new_id(id))
    }

    /// Assigns the next available ID without recording an address mapping.
    /// Used for actors created by other actors, which have no counterpart
    /// raw address to map.
    pub fn allocate_new_actor_id(&mut self) -> Address {
        let id = self.next_id;
        self.next_id += 1;
        Address::new_id(id)
    }

    /// Look up the ID previously allocated for an address, if any.
    pub fn resolve_address<BS: Blockstore>(
        &self,
        store: &BS,
        addr: &Address,
    ) -> Result<Option<Address>, HamtError> {
        let map = make_map_with_root::<_, ActorID>(&self.address_map, store)?;
        Ok(map.get(&addr_key(addr))?.copied().map(Address::new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::make_empty_map;
    use fvm_ipld_blockstore::MemoryBlockstore;
    use fvm_shared::ActorID;

    #[test]
    fn sequential_id_allocation() {
        let store = MemoryBlockstore::default();
        let empty = make_empty_map::<_, ActorID>(&store).flush().unwrap();
        let mut state = State::new(empty);

        let a = Address::new_actor(b"a");
        let b = Address::new_actor(b"b");

        let id_a = state.map_address_to_new_id(&store, &a).unwrap();
        let id_b = state.map_address_to_new_id(&store, &b).unwrap();
        assert_eq!(id_a, Address::new_id(FIRST_NON_SINGLETON_ADDR));
        assert_eq!(id_b, Address::new_id(FIRST_NON_SINGLETON_ADDR + 1));

        // anonymous allocation advances the counter but not the map
        let id_c = state.allocate_new_actor_id();
        assert_eq!(id_c, Address::new_id(FIRST_NON_SINGLETON_ADDR + 2));
        assert_eq!(state.next_id, FIRST_NON_SINGLETON_ADDR + 3);

        assert_eq!(state.resolve_address(&store, &a).unwrap(), Some(id_a));
        assert_eq!(state.resolve_address(&store, &b).unwrap(), Some(id_b));
        assert_eq!(
            state
                .resolve_address(&store, &Address::new_actor(b"c"))
                .unwrap(),
            None
        );
    }
}
