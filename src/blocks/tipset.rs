// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;
use std::sync::OnceLock;

use crate::blocks::{CachingBlockHeader, Error};
use crate::utils::encoding::blake2b_256;
use cid::Cid;
use fvm_shared::clock::ChainEpoch;
use serde::{Deserialize, Serialize};

/// An immutable set of block CIDs forming a unique key for a tipset.
///
/// Equal keys will have equivalent iteration order. The genesis block has an
/// empty parent key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self(cids)
    }

    pub fn into_cids(self) -> Vec<Cid> {
        self.0
    }

    pub fn to_cids(&self) -> Vec<Cid> {
        self.0.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cid> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .0
            .iter()
            .map(|cid| cid.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{s}}}")
    }
}

impl FromIterator<Cid> for TipsetKey {
    fn from_iter<I: IntoIterator<Item = Cid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A non-empty group of blocks at the same epoch with the same parents.
#[derive(Clone, Debug)]
pub struct Tipset {
    headers: Vec<CachingBlockHeader>,
    key: OnceLock<TipsetKey>,
}

impl PartialEq for Tipset {
    fn eq(&self, other: &Self) -> bool {
        self.headers == other.headers
    }
}

impl Eq for Tipset {}

impl From<CachingBlockHeader> for Tipset {
    fn from(header: CachingBlockHeader) -> Self {
        Self {
            headers: vec![header],
            key: OnceLock::new(),
        }
    }
}

impl Tipset {
    /// Builds a new tipset from a collection of blocks. The blocks must be
    /// distinct, at the same epoch, and share the same parent set. Blocks are
    /// sorted canonically, by ticket then CID.
    pub fn new(headers: Vec<CachingBlockHeader>) -> Result<Self, Error> {
        let first = headers.first().ok_or(Error::NoBlocks)?;
        for header in &headers[1..] {
            if header.epoch != first.epoch {
                return Err(Error::InvalidTipset(format!(
                    "epoch mismatch: {} != {}",
                    header.epoch, first.epoch
                )));
            }
            if header.parents != first.parents {
                return Err(Error::InvalidTipset("parent mismatch".to_string()));
            }
        }

        let mut headers = headers;
        headers.sort_by_cached_key(|h| {
            let ticket_hash = h.ticket.as_ref().map(|t| blake2b_256(t.vrfproof.as_bytes()));
            (ticket_hash, h.cid().to_bytes())
        });
        headers.dedup_by(|a, b| a.cid() == b.cid());

        Ok(Self {
            headers,
            key: OnceLock::new(),
        })
    }

    /// Returns the first block of the tipset in canonical order.
    pub fn min_ticket_block(&self) -> &CachingBlockHeader {
        // Invariant: the headers vector is non-empty and sorted.
        &self.headers[0]
    }

    pub fn block_headers(&self) -> &[CachingBlockHeader] {
        &self.headers
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.min_ticket_block().epoch
    }

    /// Returns the smallest timestamp of all blocks in the tipset.
    pub fn min_timestamp(&self) -> u64 {
        self.headers
            .iter()
            .map(|header| header.timestamp)
            .min()
            .unwrap_or_default()
    }

    /// Returns the tipset's key, the ordered CIDs of its blocks.
    pub fn key(&self) -> &TipsetKey {
        self.key
            .get_or_init(|| self.headers.iter().map(|h| *h.cid()).collect())
    }

    pub fn parents(&self) -> &TipsetKey {
        &self.min_ticket_block().parents
    }
}
