//! Control-plane error types.
//!
//! Three families, none of them fatal to the process:
//!
//! - [`StoreError`]: the write left the process and failed (reported, never
//!   retried)
//! - [`ValidationError`]: rejected locally before any network call
//! - [`AuthError`]: session gate refused the operator

use smarthid_proto::{OperationMode, ProtoError};
use thiserror::Error;

pub use crate::store::StoreError;

/// Which command a rejection is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Keyboard text.
    Text,
    /// Ducky script.
    Script,
    /// LED color.
    Led,
    /// Mode change.
    Mode,
    /// Pointer move sample.
    PointerMove,
    /// Coalescer click with auto-release.
    Click,
    /// Quick-action click without auto-release.
    QuickClick,
    /// Scroll pulse.
    Scroll,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Script => "script",
            Self::Led => "LED color",
            Self::Mode => "mode",
            Self::PointerMove => "pointer move",
            Self::Click => "click",
            Self::QuickClick => "quick click",
            Self::Scroll => "scroll",
        })
    }
}

/// Input rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only payload.
    #[error("nothing to send: {command} is empty")]
    NothingToSend {
        /// Command that was empty.
        command: CommandKind,
    },

    /// Command belongs to a different operation mode.
    #[error("wrong mode: {command} needs {required}, current mode is {current}")]
    WrongMode {
        /// Command that was discarded.
        command: CommandKind,
        /// Mode the command requires.
        required: OperationMode,
        /// Mode currently active.
        current: OperationMode,
    },

    /// Operator input could not be parsed.
    #[error(transparent)]
    Invalid(#[from] ProtoError),
}

/// Session gate refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No successful login yet; a password is expected.
    #[error("login required ({remaining_attempts} attempts left)")]
    LoginRequired {
        /// Attempts left before lockout.
        remaining_attempts: u32,
    },

    /// Password did not match.
    #[error("wrong password ({remaining_attempts} attempts left)")]
    WrongPassword {
        /// Attempts left before lockout (saturates at 0).
        remaining_attempts: u32,
    },

    /// Too many failures; try again later.
    #[error("locked out for another {remaining_secs}s")]
    LockedOut {
        /// Whole seconds until the lockout lifts, rounded up.
        remaining_secs: u64,
    },
}

/// Coarse classification used for operator-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store unreachable, timed out, or refused.
    Transport,
    /// Empty input or wrong mode.
    Validation,
    /// Wrong password or lockout.
    Auth,
}

/// Any failure surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Store write or read failed.
    #[error("transport error: {0}")]
    Transport(#[from] StoreError),

    /// Rejected locally.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session gate refused.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
}

impl ControlError {
    /// Family of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
        }
    }

    /// True when a network call was attempted.
    ///
    /// Validation and auth failures are decided locally, so the store is
    /// never touched for them.
    pub fn touched_store(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<ProtoError> for ControlError {
    fn from(err: ProtoError) -> Self {
        Self::Validation(ValidationError::Invalid(err))
    }
}
