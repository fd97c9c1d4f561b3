//! Vocabulary parse errors.

use thiserror::Error;

/// Errors raised while interpreting operator input or store values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// String is not one of the known operation modes.
    #[error("unknown operation mode: {0:?}")]
    UnknownMode(String),

    /// String is neither a palette token nor a `#RRGGBB` color.
    #[error("invalid LED color: {0:?}")]
    InvalidLedColor(String),

    /// Unknown mouse button name.
    #[error("unknown mouse button: {0:?}")]
    UnknownButton(String),

    /// Unknown scroll direction name.
    #[error("unknown scroll direction: {0:?}")]
    UnknownScroll(String),
}
