//! In-memory store.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{SharedStore, StoreError};

/// One operation observed by a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// `get(path)`
    Get {
        /// Path read
        path: String,
    },
    /// `set(path, value)`
    Set {
        /// Path written
        path: String,
        /// Value written
        value: Value,
    },
    /// `update(path, fields)`
    Update {
        /// Path merged into
        path: String,
        /// Fields merged
        fields: Map<String, Value>,
    },
}

impl StoreOp {
    /// Path this operation touched.
    pub fn path(&self) -> &str {
        match self {
            Self::Get { path } | Self::Set { path, .. } | Self::Update { path, .. } => path,
        }
    }

    /// True for `set` and `update`.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get { .. })
    }
}

/// In-process JSON tree with the same semantics as the remote store.
///
/// Every operation is appended to a journal so tests can assert on exactly
/// what reached the store, and in which order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    root: Map<String, Value>,
    journal: Vec<StoreOp>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation received so far.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.lock().journal.clone()
    }

    /// Only the writes, in order.
    pub fn writes(&self) -> Vec<StoreOp> {
        self.lock().journal.iter().filter(|op| op.is_write()).cloned().collect()
    }

    /// Writes that targeted `path` exactly.
    pub fn writes_to(&self, path: &str) -> Vec<StoreOp> {
        self.writes().into_iter().filter(|op| op.path() == path).collect()
    }

    /// Forgets the journal, keeping the data.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Reads without journaling.
    pub fn peek(&self, path: &str) -> Option<Value> {
        lookup(&self.lock().root, path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let mut inner = self.lock();
        inner.journal.push(StoreOp::Get { path: path.to_string() });
        Ok(lookup(&inner.root, path).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.journal.push(StoreOp::Set { path: path.to_string(), value: value.clone() });

        let (parent, key) = split_last(path)?;
        let object = object_at(&mut inner.root, segments(parent))?;
        if value.is_null() {
            object.remove(key);
        } else {
            object.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.journal.push(StoreOp::Update { path: path.to_string(), fields: fields.clone() });

        let object = object_at(&mut inner.root, segments(path))?;
        for (key, value) in fields {
            if value.is_null() {
                object.remove(&key);
            } else {
                object.insert(key, value);
            }
        }
        Ok(())
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> + '_ {
    path.split('/').filter(|s| !s.is_empty())
}

fn split_last(path: &str) -> Result<(&str, &str), StoreError> {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some(split) => Ok(split),
        None if !trimmed.is_empty() => Ok(("", trimmed)),
        None => Err(StoreError::Rejected { status: 400, message: "cannot set the root".into() }),
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = segments(path);
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Walks to the object at `parts`, replacing any non-object on the way.
fn object_at<'a, 'p>(
    root: &'a mut Map<String, Value>,
    parts: impl Iterator<Item = &'p str>,
) -> Result<&'a mut Map<String, Value>, StoreError> {
    let mut current = root;
    for part in parts {
        let slot = current.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot
            .as_object_mut()
            .ok_or_else(|| StoreError::Malformed(format!("{part} is not an object")))?;
    }
    Ok(current)
}
