//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::crypto::SharedKey;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request. Nothing here is mutated
/// after startup, so handlers never lock.
#[derive(Clone)]
pub struct AppState {
    /// Shared envelope key, loaded once at startup.
    pub key: Arc<SharedKey>,
    /// Masked key fingerprint reported by `GET /health`.
    pub key_fingerprint: Arc<str>,
    /// Client for the backend service.
    pub backend: BackendClient,
    /// Path prefix stripped from inbound paths before forwarding.
    pub api_prefix: Arc<str>,
}

impl AppState {
    /// Create a new [`AppState`] from its startup-built parts.
    pub fn new(
        key: SharedKey,
        key_fingerprint: String,
        backend: BackendClient,
        api_prefix: String,
    ) -> Self {
        Self {
            key: Arc::new(key),
            key_fingerprint: Arc::from(key_fingerprint),
            backend,
            api_prefix: Arc::from(api_prefix),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State keyed with [`crate::testutil::TEST_KEY`] and pointed at `backend_url`.
    pub fn for_tests(backend_url: &str, timeout: std::time::Duration) -> Self {
        use crate::testutil::TEST_KEY;
        let key = SharedKey::from_bytes(TEST_KEY).unwrap();
        let fingerprint = crate::crypto::key::fingerprint(std::str::from_utf8(TEST_KEY).unwrap());
        let backend = BackendClient::new(backend_url, timeout).unwrap();
        Self::new(key, fingerprint, backend, "/api".into())
    }
}
