// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Deterministic genesis construction for a Filecoin-style ledger.
//!
//! Given a static [`genesis::GenesisConfig`] of account balances and miner
//! definitions, [`genesis::make_genesis`] builds the network's starting
//! state tree, bootstraps the configured miners through the interpreter,
//! and assembles the resulting state root into the persisted genesis block.
//! Every node running the construction with the same configuration derives
//! bit-identical state roots and block CIDs.

pub mod actors;
pub mod blocks;
pub mod chain;
pub mod genesis;
pub mod interpreter;
pub mod state_tree;
pub mod utils;
pub mod vm;
