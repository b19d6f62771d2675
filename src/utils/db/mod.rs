// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_encoding::CborStore;
use multihash_codetable::Code;
use serde::{de::DeserializeOwned, Serialize};

/// Extension methods for inserting and retrieving IPLD data with CIDs
pub trait CborStoreExt: CborStore {
    /// Default multihash code is `Blake2b256`
    fn default_code() -> Code {
        Code::Blake2b256
    }

    /// A wrapper of [`CborStore::put_cbor`] that omits code parameter to match
    /// the most common use case in the code base.
    fn put_cbor_default<S: Serialize>(&self, obj: &S) -> anyhow::Result<Cid> {
        self.put_cbor(obj, Self::default_code())
    }

    /// Get an object from the block store, erroring if it is absent.
    fn get_cbor_required<T>(&self, key: &Cid) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_cbor(key)?
            .with_context(|| format!("object {key} not found in block store"))
    }
}

impl<T: CborStore> CborStoreExt for T {}
