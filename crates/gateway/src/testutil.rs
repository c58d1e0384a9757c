//! Shared fixtures for unit tests: a known key and loopback stub backends.

use axum::Router;
use serde_json::Value;

use crate::crypto;

/// 32 ASCII bytes, as a caller would hold the shared key.
pub const TEST_KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a loopback port with nothing listening on it.
pub async fn unreachable_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Seal a JSON value with [`TEST_KEY`].
pub fn seal_json(value: &Value) -> String {
    crypto::seal(value.to_string().as_bytes(), TEST_KEY).unwrap()
}

/// Open an envelope with [`TEST_KEY`] and parse it as JSON.
pub fn open_json(envelope: &str) -> Value {
    serde_json::from_slice(&crypto::open(envelope, TEST_KEY).unwrap()).unwrap()
}
