//! RestStore against a canned local HTTP endpoint.

use std::time::Duration;

use serde_json::json;
use smarthid_bridge::RestStore;
use smarthid_core::{SharedStore, StoreError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

/// Serves exactly one request with `status` and `body`, returning the raw
/// request text.
async fn one_shot(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (base, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8(buf).unwrap()
}

fn store(base: &str) -> RestStore {
    RestStore::new(base, Some("tok".into()), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn get_null_reads_as_absent() {
    let (base, server) = one_shot("200 OK", "null").await;

    let value = store(&base).get("hid/mode").await.unwrap();

    assert_eq!(value, None);
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /hid/mode.json?auth=tok HTTP/1.1"));
}

#[tokio::test]
async fn get_returns_json_value() {
    let (base, server) = one_shot("200 OK", r#"{"online":true,"lastSeen":1700000000}"#).await;

    let value = store(&base).get("hid/status").await.unwrap();

    assert_eq!(value, Some(json!({ "online": true, "lastSeen": 1_700_000_000 })));
    server.await.unwrap();
}

#[tokio::test]
async fn set_uses_put_with_json_body() {
    let (base, server) = one_shot("200 OK", r#""RED""#).await;

    store(&base).set("hid/ledColor", json!("RED")).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /hid/ledColor.json?auth=tok HTTP/1.1"));
    assert!(request.ends_with(r#""RED""#));
}

#[tokio::test]
async fn update_uses_patch() {
    let (base, server) = one_shot("200 OK", r#"{"x":5}"#).await;
    let mut fields = serde_json::Map::new();
    fields.insert("x".into(), json!(5));

    store(&base).update("hid/mouseData", fields).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PATCH /hid/mouseData.json?auth=tok HTTP/1.1"));
    assert!(request.ends_with(r#"{"x":5}"#));
}

#[tokio::test]
async fn error_status_is_rejected() {
    let (base, server) = one_shot("401 Unauthorized", r#"{"error":"Permission denied"}"#).await;

    let err = store(&base).set("hid/inputText", json!("hi")).await.unwrap_err();

    assert_eq!(
        err,
        StoreError::Rejected { status: 401, message: r#"{"error":"Permission denied"}"#.into() }
    );
    server.await.unwrap();
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (base, server) = one_shot("200 OK", "<html>").await;

    let err = store(&base).get("hid/mode").await.unwrap_err();

    assert!(matches!(err, StoreError::Malformed(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = store(&base).get("hid/mode").await.unwrap_err();

    assert!(matches!(err, StoreError::Unreachable(_)));
}
