// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::error::ExitCode;
use thiserror::Error;

/// The error type returned by actor method invocations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ActorError(exit_code: {exit_code:?}, msg: {msg})")]
pub struct ActorError {
    /// The exit code for this invocation; this must not be `ExitCode::OK`.
    exit_code: ExitCode,
    /// Message for debugging purposes
    msg: String,
}

impl ActorError {
    pub fn new(exit_code: ExitCode, msg: String) -> Self {
        debug_assert!(!exit_code.is_success());
        Self { exit_code, msg }
    }

    /// Returns the exit code of the error.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Error message of the actor error.
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

/// Convenience macro for generating `ActorError`s, e.g.
/// `actor_error!(USR_ILLEGAL_STATE; "failed to load state: {}", err)`.
#[macro_export]
macro_rules! actor_error {
    ( $code:ident; $msg:literal ) => {
        $crate::vm::ActorError::new(
            fvm_shared::error::ExitCode::$code,
            $msg.to_string(),
        )
    };
    ( $code:ident; $msg:literal $(, $ex:expr)+ ) => {
        $crate::vm::ActorError::new(
            fvm_shared::error::ExitCode::$code,
            format!($msg $(, $ex)*),
        )
    };
}
