// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actor_error;
use crate::actors::{market, MARKET_ACTOR_CODE_ID};
use crate::state_tree::StateTree;
use crate::vm::ActorError;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::message::Message;
use fvm_shared::receipt::Receipt;
use fvm_shared::MethodNum;
use num_traits::Zero;
use tracing::warn;

/// Result of a message application: the receipt that would land on chain plus
/// the actor error, if any, for diagnostics.
#[derive(Debug)]
pub struct ApplyRet {
    /// Message receipt for the transaction
    pub msg_receipt: Receipt,
    /// Actor error from the transaction, if one exists
    pub act_error: Option<ActorError>,
}

impl ApplyRet {
    fn error(err: ActorError) -> Self {
        Self {
            msg_receipt: Receipt {
                return_data: RawBytes::default(),
                exit_code: err.exit_code(),
                gas_used: 0,
                events_root: None,
            },
            act_error: Some(err),
        }
    }
}

/// Interpreter which handles execution of state transitioning messages.
///
/// Writes are buffered in the state tree until [`VM::flush`] is called, so
/// callers that need to inspect intermediate state through the store must
/// flush first.
pub struct VM<'db, DB> {
    state: StateTree<'db, DB>,
    epoch: ChainEpoch,
}

impl<'db, DB> VM<'db, DB>
where
    DB: Blockstore,
{
    pub fn new(root: &Cid, store: &'db DB, epoch: ChainEpoch) -> anyhow::Result<Self> {
        let state = StateTree::new_from_root(store, root)?;
        Ok(VM { state, epoch })
    }

    /// Flush buffered writes into the store and return the state root.
    pub fn flush(&mut self) -> anyhow::Result<Cid> {
        self.state.flush()
    }

    pub fn state_tree(&self) -> &StateTree<'db, DB> {
        &self.state
    }

    pub fn state_tree_mut(&mut self) -> &mut StateTree<'db, DB> {
        &mut self.state
    }

    /// Returns `ChainEpoch` this interpreter is applying messages at.
    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }

    /// Applies a message without charging gas, as used for system messages
    /// and genesis bootstrap. Sender checks still apply: the sender must
    /// exist, its sequence must match, and its sequence is advanced.
    pub fn apply_implicit_message(&mut self, msg: &Message) -> anyhow::Result<ApplyRet> {
        let from_act = match self.state.get_actor(&msg.from)? {
            Some(act) => act,
            None => {
                return Ok(ApplyRet::error(actor_error!(SYS_SENDER_INVALID;
                    "sender {} does not exist", msg.from)));
            }
        };

        if msg.sequence != from_act.sequence {
            return Ok(ApplyRet::error(actor_error!(SYS_SENDER_STATE_INVALID;
                "actor sequence invalid: {} != {}", msg.sequence, from_act.sequence)));
        }

        self.state.mutate_actor(&msg.from, |act| {
            act.sequence += 1;
            Ok(())
        })?;

        if let Err(err) = self.transfer(&msg.from, &msg.to, &msg.value) {
            return Ok(ApplyRet::error(err));
        }

        match self.invoke(msg.from, msg.to, msg.method_num, &msg.params) {
            Ok(return_data) => Ok(ApplyRet {
                msg_receipt: Receipt {
                    return_data,
                    exit_code: ExitCode::OK,
                    gas_used: 0,
                    events_root: None,
                },
                act_error: None,
            }),
            Err(err) => {
                warn!(
                    "[from={}, to={}, seq={}, m={}] send error: {}",
                    msg.from, msg.to, msg.sequence, msg.method_num, err
                );
                Ok(ApplyRet::error(err))
            }
        }
    }

    /// Moves value between actors. The receiving actor must already exist.
    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        value: &TokenAmount,
    ) -> Result<(), ActorError> {
        if value.is_zero() {
            return Ok(());
        }
        if value < &TokenAmount::zero() {
            return Err(actor_error!(SYS_ASSERTION_FAILED;
                "attempted to transfer negative value {}", value));
        }

        let state_err =
            |e: anyhow::Error| actor_error!(USR_ILLEGAL_STATE; "transfer failed: {}", e);

        let mut from_act = self
            .state
            .get_actor(from)
            .map_err(state_err)?
            .ok_or_else(|| actor_error!(SYS_SENDER_INVALID; "sender {} does not exist", from))?;
        from_act.deduct_funds(value)?;
        self.state.set_actor(from, from_act).map_err(state_err)?;

        let mut to_act = self
            .state
            .get_actor(to)
            .map_err(state_err)?
            .ok_or_else(|| {
                actor_error!(SYS_INVALID_RECEIVER; "receiver {} does not exist", to)
            })?;
        to_act.deposit_funds(value);
        self.state.set_actor(to, to_act).map_err(state_err)?;

        Ok(())
    }

    /// Dispatches a method invocation to the receiving actor's code.
    fn invoke(
        &mut self,
        from: Address,
        to: Address,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError> {
        let to_act = self
            .state
            .get_actor(&to)
            .map_err(|e| actor_error!(USR_ILLEGAL_STATE; "failed to load receiver: {}", e))?
            .ok_or_else(|| actor_error!(SYS_INVALID_RECEIVER; "receiver {} does not exist", to))?;

        if method == fvm_shared::METHOD_SEND {
            return Ok(RawBytes::default());
        }

        if to_act.code == *MARKET_ACTOR_CODE_ID {
            market::Actor::invoke_method(&mut self.state, &to, &from, method, params)
        } else {
            Err(actor_error!(SYS_INVALID_RECEIVER;
                "no method {} on actor with code {}", method, to_act.code))
        }
    }
}
