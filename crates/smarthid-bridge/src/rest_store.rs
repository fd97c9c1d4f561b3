//! REST transport for the shared store.
//!
//! Speaks the Realtime-Database style REST dialect: every path maps to
//! `<base>/<path>.json`, with the optional auth token in the `auth` query
//! parameter.
//!
//! | Operation | Method | Body |
//! |-----------|--------|------|
//! | `get`     | GET    | none; `null` means absent |
//! | `set`     | PUT    | the value |
//! | `update`  | PATCH  | the field map |

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::{Map, Value};
use smarthid_core::{SharedStore, StoreError};

use crate::error::BridgeError;

/// Shared store reached over HTTPS.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    auth_token: Option<String>,
}

impl fmt::Debug for RestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStore")
            .field("base", &self.base.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// Creates a client for the database at `base_url`.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self, BridgeError> {
        let base = Url::parse(base_url)
            .map_err(|e| BridgeError::Config(format!("invalid database URL {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BridgeError::Config(format!("database URL {base_url:?} cannot hold paths")));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base, auth_token: auth_token.filter(|t| !t.is_empty()) })
    }

    /// Resolves a store path to its REST endpoint.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            match parts.split_last() {
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{last}.json"));
                },
                None => {
                    segments.push(".json");
                },
            }
        }

        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        url
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, StoreError> {
        let mut request = self.client.request(method.clone(), self.endpoint(path));
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%method, path, status = status.as_u16(), "store rejected request");
            return Err(StoreError::Rejected { status: status.as_u16(), message });
        }

        let text = response.text().await.map_err(|e| transport_error(&e))?;
        tracing::trace!(%method, path, "store request completed");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

fn transport_error(err: &reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else if err.is_decode() {
        StoreError::Malformed(err.to_string())
    } else {
        StoreError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl SharedStore for RestStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let value = self.send(Method::GET, path, None).await?;
        Ok(Some(value).filter(|v| !v.is_null()))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.send(Method::PUT, path, Some(value)).await.map(drop)
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.send(Method::PATCH, path, Some(Value::Object(fields))).await.map(drop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(base: &str, token: Option<&str>) -> RestStore {
        RestStore::new(base, token.map(str::to_string), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoint_appends_json_suffix_and_auth() {
        let store = store("https://demo.firebaseio.com", Some("s3cret"));
        assert_eq!(
            store.endpoint("hid/mouseData").as_str(),
            "https://demo.firebaseio.com/hid/mouseData.json?auth=s3cret"
        );
    }

    #[test]
    fn endpoint_handles_nested_paths_and_trailing_slash() {
        let store = store("https://demo.firebaseio.com/", None);
        assert_eq!(
            store.endpoint("hid/mouseData/scroll").as_str(),
            "https://demo.firebaseio.com/hid/mouseData/scroll.json"
        );
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let store = store("http://localhost:9000/db", None);
        assert_eq!(store.endpoint("hid/mode").as_str(), "http://localhost:9000/db/hid/mode.json");
    }

    #[test]
    fn empty_token_is_ignored() {
        let store = store("https://demo.firebaseio.com", Some(""));
        assert_eq!(store.endpoint("hid/status").query(), None);
    }

    #[test]
    fn invalid_url_is_config_error() {
        let err = RestStore::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", store("https://demo.firebaseio.com", Some("s3cret")));
        assert!(!rendered.contains("s3cret"));
    }
}
