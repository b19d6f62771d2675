// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod actor_state;
mod errors;

pub use self::actor_state::ActorState;
pub use self::errors::ActorError;
