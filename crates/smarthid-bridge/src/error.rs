//! Bridge error types.

use smarthid_core::StoreError;
use thiserror::Error;

/// Errors that stop the bridge or its console.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid configuration (bad URL, unusable HTTP client).
    #[error("configuration error: {0}")]
    Config(String),

    /// First-run defaults could not be written.
    #[error("failed to seed store defaults: {0}")]
    Seed(#[source] StoreError),

    /// Console input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// True when the bridge cannot start at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Seed(_))
    }
}
