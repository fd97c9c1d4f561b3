//! Failure-injecting store wrapper.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};

use super::{SharedStore, StoreError};

/// Wraps a store and fails a seeded fraction of operations.
///
/// Failed operations never reach the inner store, which models a request
/// lost before the store saw it. The RNG is seeded so a failing run can be
/// replayed exactly.
#[derive(Debug)]
pub struct ChaoticStore<S> {
    inner: S,
    failure_rate: f64,
    rng: Mutex<ChaCha8Rng>,
}

impl<S: SharedStore> ChaoticStore<S> {
    /// Creates a wrapper failing `failure_rate` (0.0 to 1.0) of operations.
    pub fn new(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn roll(&self, op: &str, path: &str) -> Result<(), StoreError> {
        let hit = self.rng.lock().unwrap_or_else(PoisonError::into_inner).gen_bool(self.failure_rate);
        if hit {
            tracing::debug!(op, path, "injected store failure");
            return Err(StoreError::Unreachable(format!("injected failure on {op} {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: SharedStore> SharedStore for ChaoticStore<S> {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.roll("get", path)?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.roll("set", path)?;
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.roll("update", path)?;
        self.inner.update(path, fields).await
    }
}
