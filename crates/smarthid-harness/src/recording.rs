//! Store wrapper that timestamps every operation with virtual time.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use smarthid_core::{SharedStore, StoreError, StoreOp};

use crate::SimEnv;

/// One operation and when it reached the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    /// Virtual time since the environment origin.
    pub at: std::time::Duration,
    /// The operation.
    pub op: StoreOp,
}

impl Recorded {
    /// True for a `hid/mouseData` update carrying a position.
    pub fn is_pointer_sample(&self) -> bool {
        matches!(&self.op, StoreOp::Update { path, fields } if path == "hid/mouseData" && fields.contains_key("x"))
    }

    /// Value of a boolean field in a `hid/mouseData` update.
    pub fn mouse_flag(&self, field: &str) -> Option<bool> {
        match &self.op {
            StoreOp::Update { path, fields } if path == "hid/mouseData" => {
                fields.get(field).and_then(Value::as_bool)
            },
            _ => None,
        }
    }
}

/// Passes operations through to `inner`, logging each with its time.
///
/// Operations are logged before they are forwarded, so failed operations
/// appear too.
#[derive(Debug)]
pub struct RecordingStore<S> {
    inner: S,
    env: SimEnv,
    log: Mutex<Vec<Recorded>>,
}

impl<S: SharedStore> RecordingStore<S> {
    /// Wraps `inner`, timestamping against `env`.
    pub fn new(inner: S, env: SimEnv) -> Self {
        Self { inner, env, log: Mutex::new(Vec::new()) }
    }

    /// Wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<Recorded> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Writes only, in order.
    pub fn writes(&self) -> Vec<Recorded> {
        self.records().into_iter().filter(|r| r.op.is_write()).collect()
    }

    fn record(&self, op: StoreOp) {
        let at = self.env.elapsed();
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(Recorded { at, op });
    }
}

#[async_trait]
impl<S: SharedStore> SharedStore for RecordingStore<S> {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.record(StoreOp::Get { path: path.to_string() });
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.record(StoreOp::Set { path: path.to_string(), value: value.clone() });
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.record(StoreOp::Update { path: path.to_string(), fields: fields.clone() });
        self.inner.update(path, fields).await
    }
}
