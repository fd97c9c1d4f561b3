//! End-to-end console session against an in-memory store.

use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use smarthid_bridge::{Args, BridgeError, serve};
use smarthid_core::{ChaoticStore, MemoryStore};
use tokio_util::sync::CancellationToken;

fn args() -> Args {
    Args::try_parse_from(["smarthid-bridge", "--database-url", "http://unused.invalid", "--password", "pw"]).unwrap()
}

#[tokio::test]
async fn console_session_drives_store() {
    let store = Arc::new(MemoryStore::new());
    let input: &[u8] = b"text before login\n\
        login wrong\n\
        login pw\n\
        text hello\n\
        mode mouse\n\
        scroll down\n\
        click left\n\
        led #00FF00\n\
        quit\n";

    serve(&args(), Arc::clone(&store), input, CancellationToken::new()).await.unwrap();

    assert_eq!(store.peek("hid/inputText"), Some(json!("hello")));
    assert_eq!(store.peek("hid/mode"), Some(json!("Mouse Mode")));
    assert_eq!(store.peek("hid/mouseData/scroll"), Some(json!(-1)));
    assert_eq!(store.peek("hid/ledColor"), Some(json!("#00FF00")));
    // Release flushed on shutdown.
    assert_eq!(store.peek("hid/mouseData/leftClick"), Some(json!(false)));
    assert_eq!(store.writes_to("hid/mouseData").len(), 2);
}

#[tokio::test]
async fn first_run_seeds_defaults() {
    let store = Arc::new(MemoryStore::new());

    serve(&args(), Arc::clone(&store), &b""[..], CancellationToken::new()).await.unwrap();

    assert_eq!(store.peek("hid/ledColor"), Some(json!("OFF")));
    assert_eq!(store.peek("hid/status"), Some(json!({ "online": false })));
}

#[tokio::test]
async fn unreachable_store_fails_startup() {
    let store = Arc::new(ChaoticStore::new(MemoryStore::new(), 1.0, 1));

    let err = serve(&args(), store, &b"login pw\n"[..], CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, BridgeError::Seed(_)));
    assert!(err.is_fatal());
}
