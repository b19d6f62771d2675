// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::blocks::VRFProof;
use fvm_ipld_encoding::tuple::*;

/// Proof of a winning leader-election round, carried in a block header.
#[derive(
    Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple, Hash, PartialOrd, Ord,
)]
pub struct ElectionProof {
    pub win_count: i64,
    /// A proof output by running a VRF on the election randomness
    pub vrfproof: VRFProof,
}
