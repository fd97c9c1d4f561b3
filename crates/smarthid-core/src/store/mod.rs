//! Shared store abstraction.
//!
//! The store is a remote, path-addressable JSON tree with three operations
//! and no transactions:
//!
//! - `get(path)`: current value, `None` when absent
//! - `set(path, value)`: overwrite the subtree
//! - `update(path, fields)`: merge top-level fields into the object at `path`
//!   (not recursive)
//!
//! Independent writers are not ordered against each other. Everything above
//! this trait must tolerate any interleaving of writes and must treat missing
//! fields as their documented defaults.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process tree with an operation journal, for tests and
//!   simulation
//! - [`ChaoticStore`]: wraps another store and fails a seeded fraction of
//!   operations
//! - `RestStore` (in `smarthid-bridge`): the production REST client

mod chaotic;
mod memory;

use async_trait::async_trait;
pub use chaotic::ChaoticStore;
pub use memory::{MemoryStore, StoreOp};
use serde_json::{Map, Value};
use smarthid_proto::HidPath;

/// Errors from the shared store. All of them are transport-level: the store
/// has no notion of invalid values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached (DNS, connect, reset).
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// Request did not complete in time.
    #[error("store request timed out")]
    Timeout,

    /// Store answered with an error status (auth, rules, quota).
    #[error("store rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Body or reason returned by the store.
        message: String,
    },

    /// Store answered with something that is not JSON.
    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Remote key-value store reachable by path.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Reads the value at `path`. Absent and `null` both read as `None`.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrites the value at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merges `fields` into the object at `path`, one level deep.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: SharedStore + ?Sized> SharedStore for std::sync::Arc<S> {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(path, value).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        (**self).update(path, fields).await
    }
}

/// A single write produced by a state machine for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    /// Overwrite the value at a path.
    Set {
        /// Target path
        path: HidPath,
        /// New value
        value: Value,
    },

    /// Merge top-level fields into the object at a path.
    Update {
        /// Target path
        path: HidPath,
        /// Fields to merge
        fields: Map<String, Value>,
    },
}

impl StoreWrite {
    /// Path this write targets.
    pub fn path(&self) -> HidPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } => *path,
        }
    }

    /// Executes the write against a store.
    pub async fn apply<S: SharedStore + ?Sized>(self, store: &S) -> Result<(), StoreError> {
        match self {
            Self::Set { path, value } => store.set(path.as_str(), value).await,
            Self::Update { path, fields } => store.update(path.as_str(), fields).await,
        }
    }
}

/// Outcome of [`seed_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Paths that were absent and received their default.
    pub seeded: Vec<HidPath>,
    /// Paths that already held a value and were left alone.
    pub existing: Vec<HidPath>,
}

/// Writes first-run defaults for every top-level path that is absent.
///
/// Only a `null`/missing value counts as absent; an empty string or `false`
/// already written by someone else is kept. Two bridges seeding at once may
/// both write the default, which is harmless since the defaults are equal.
///
/// # Errors
///
/// Returns the first store error. The bridge treats this as fatal at startup.
pub async fn seed_defaults<S: SharedStore + ?Sized>(store: &S) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    for path in HidPath::SEEDED {
        let Some(default) = path.default_value() else {
            continue;
        };

        if store.get(path.as_str()).await?.is_some() {
            report.existing.push(path);
            continue;
        }

        store.set(path.as_str(), default).await?;
        tracing::info!(%path, "seeded default value");
        report.seeded.push(path);
    }

    Ok(report)
}
