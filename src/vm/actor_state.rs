// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::actor_error;
use crate::vm::ActorError;
use cid::Cid;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::econ::TokenAmount;
use num_traits::Zero;

/// State of all actor implementations, keyed by address in the state tree.
///
/// The actor's own data lives behind `state`, a CID of an actor-specific
/// CBOR object; mutating an actor means replacing the whole record.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, PartialEq, Eq, Debug)]
pub struct ActorState {
    /// Identifier for the type of the actor
    pub code: Cid,
    /// CID of the root of optional actor-specific data
    pub state: Cid,
    /// Sequence of the actor (nonce of the next expected message)
    pub sequence: u64,
    /// Tokens available to the actor
    pub balance: TokenAmount,
}

impl ActorState {
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }

    /// Safely deducts funds from an actor.
    pub fn deduct_funds(&mut self, amt: &TokenAmount) -> Result<(), ActorError> {
        if &self.balance < amt {
            return Err(actor_error!(USR_INSUFFICIENT_FUNDS;
                "not enough funds: {} < {}", self.balance, amt));
        }
        self.balance -= amt;
        Ok(())
    }

    /// Deposits funds into an actor.
    pub fn deposit_funds(&mut self, amt: &TokenAmount) {
        debug_assert!(amt >= &TokenAmount::zero());
        self.balance += amt;
    }
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            code: Cid::default(),
            state: Cid::default(),
            sequence: 0,
            balance: TokenAmount::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduct_and_deposit() {
        let mut act = ActorState::new(
            Cid::default(),
            Cid::default(),
            TokenAmount::from_atto(10),
            0,
        );
        act.deduct_funds(&TokenAmount::from_atto(4)).unwrap();
        assert_eq!(act.balance, TokenAmount::from_atto(6));

        // overdraft is rejected and leaves the balance untouched
        assert!(act.deduct_funds(&TokenAmount::from_atto(7)).is_err());
        assert_eq!(act.balance, TokenAmount::from_atto(6));

        act.deposit_funds(&TokenAmount::from_atto(1));
        assert_eq!(act.balance, TokenAmount::from_atto(7));
    }
}
