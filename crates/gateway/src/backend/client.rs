//! [`BackendClient`]: plaintext JSON forwarding to the backend service.

use std::sync::Arc;
use std::time::Duration;

use common::protocol::{BackendReply, RelayResponse};
use common::{BackendFailure, GatewayError};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

/// Errors produced while forwarding to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed.
    #[error("failed to build backend client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connect, send, or timeout failure before a response arrived.
    #[error("forward to {url} failed: {source}")]
    Forward {
        /// Target URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Response headers arrived but the body could not be read.
    #[error("reading backend body failed: {0}")]
    Read(#[source] reqwest::Error),

    /// The body was not JSON, or a field had the wrong type.
    #[error("backend reply is not a valid reply object: {0}")]
    Parse(#[source] serde_json::Error),

    /// A required reply field was absent.
    #[error("backend reply is missing `{0}`")]
    MissingField(&'static str),
}

impl From<BackendError> for GatewayError {
    fn from(e: BackendError) -> Self {
        let step = match &e {
            BackendError::Client(_) | BackendError::Forward { .. } => BackendFailure::Forward,
            // A timeout mid-body is still the backend failing to answer in time.
            BackendError::Read(source) if source.is_timeout() => BackendFailure::Forward,
            BackendError::Read(_) => BackendFailure::Read,
            BackendError::Parse(_) | BackendError::MissingField(_) => BackendFailure::Parse,
        };
        GatewayError::Backend(step, e.to_string())
    }
}

/// HTTP client bound to one backend base URL.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    timeout: Duration,
}

impl BackendClient {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// The timeout covers connect, send, and reading the whole response body.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Client`] if the TLS backend cannot initialise.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(BackendError::Client)?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// Per-request timeout this client was built with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full backend URL for an already prefix-stripped `path`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST` `body` verbatim to `path` and parse the reply.
    ///
    /// The backend's HTTP status is not inspected: a 4xx carrying a valid
    /// reply object is a logical failure, not a transport one.
    ///
    /// # Errors
    ///
    /// See [`BackendError`]. No retries are attempted.
    pub async fn forward(&self, path: &str, body: Vec<u8>) -> Result<RelayResponse, BackendError> {
        let url = self.url_for(path);

        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| BackendError::Forward {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(BackendError::Read)?;
        debug!(%status, len = bytes.len(), "backend replied");

        let reply: BackendReply = serde_json::from_slice(&bytes).map_err(BackendError::Parse)?;
        reply.into_relay().map_err(BackendError::MissingField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_backend, unreachable_backend};
    use axum::{
        body::Bytes,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::time::Instant;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_for_joins_without_double_slash() {
        let c = client("http://localhost:4444/");
        assert_eq!(c.base_url(), "http://localhost:4444");
        assert_eq!(c.url_for("/create-account"), "http://localhost:4444/create-account");
    }

    #[tokio::test]
    async fn forwards_body_verbatim_with_json_content_type() {
        let app = Router::new().route(
            "/create-account",
            post(|headers: HeaderMap, body: Bytes| async move {
                let ct = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                Json(json!({
                    "success": true,
                    "message": ct,
                    "data": String::from_utf8_lossy(&body),
                }))
            }),
        );
        let base = spawn_backend(app).await;

        let raw = br#"{"company_name":"Acme",  "quota_gb":10}"#.to_vec();
        let reply = client(&base).forward("/create-account", raw).await.unwrap();

        assert!(reply.success);
        assert_eq!(reply.message, "application/json");
        assert_eq!(reply.data, r#"{"company_name":"Acme",  "quota_gb":10}"#);
    }

    #[tokio::test]
    async fn backend_error_status_is_relayed_as_logical_failure() {
        let app = Router::new().route(
            "/add-user",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"success": false, "message": "Invalid API key"})),
                )
            }),
        );
        let base = spawn_backend(app).await;

        let reply = client(&base).forward("/add-user", b"{}".to_vec()).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "Invalid API key");
        assert_eq!(reply.data, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn non_json_reply_is_parse_error() {
        let app = Router::new().route("/health", post(|| async { "OK" }));
        let base = spawn_backend(app).await;

        let err = client(&base).forward("/health", Vec::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
        let gw: GatewayError = err.into();
        assert!(matches!(gw, GatewayError::Backend(BackendFailure::Parse, _)));
    }

    #[tokio::test]
    async fn missing_message_is_reported() {
        let app = Router::new().route("/health", post(|| async { Json(json!({"success": true})) }));
        let base = spawn_backend(app).await;

        let err = client(&base).forward("/health", Vec::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingField("message")));
    }

    #[tokio::test]
    async fn unreachable_backend_is_forward_error() {
        let base = unreachable_backend().await;
        let err = client(&base).forward("/health", Vec::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Forward { .. }));
        let gw: GatewayError = err.into();
        assert!(matches!(gw, GatewayError::Backend(BackendFailure::Forward, _)));
    }

    #[tokio::test]
    async fn stalled_backend_times_out() {
        let app = Router::new().route(
            "/health",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"success": true, "message": "late"}))
            }),
        );
        let base = spawn_backend(app).await;
        let c = BackendClient::new(&base, Duration::from_millis(200)).unwrap();

        let started = Instant::now();
        let err = c.forward("/health", Vec::new()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));

        let gw: GatewayError = err.into();
        assert!(matches!(gw, GatewayError::Backend(BackendFailure::Forward, _)));
    }
}
