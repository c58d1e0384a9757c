//! Request and response types exchanged between callers, the gateway, and the
//! backend.
//!
//! Everything here is serialised as JSON. Only [`EnvelopeBody`] crosses the
//! public boundary in sealed form; the rest are either plaintext inside an
//! envelope or plaintext on the loopback backend hop.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope transport
// ---------------------------------------------------------------------------

/// Outer body for both directions of a relayed call: `{"data": "<envelope>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeBody {
    /// Base64 envelope string.
    pub data: String,
}

// ---------------------------------------------------------------------------
// Logical response (sealed inside the outbound envelope)
// ---------------------------------------------------------------------------

/// The JSON object sealed into every relayed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Logical outcome. Drives the outer HTTP status (200 / 400).
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Arbitrary payload from the backend; `null` for local failures.
    pub data: serde_json::Value,
}

impl RelayResponse {
    /// A failure carrying only a message and no data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Backend reply
// ---------------------------------------------------------------------------

/// Reply body from the backend service.
///
/// `success` and `message` are optional at the serde level so that their
/// absence is reported through [`BackendReply::into_relay`] rather than as an
/// opaque deserialisation error. A present field of the wrong type still fails
/// deserialisation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendReply {
    /// Logical outcome as reported by the backend.
    pub success: Option<bool>,
    /// Outcome message as reported by the backend.
    pub message: Option<String>,
    /// Optional payload of any shape.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl BackendReply {
    /// Convert into a [`RelayResponse`], requiring `success` and `message`.
    ///
    /// # Errors
    ///
    /// Returns the name of the first missing field.
    pub fn into_relay(self) -> Result<RelayResponse, &'static str> {
        let success = self.success.ok_or("success")?;
        let message = self.message.ok_or("message")?;
        Ok(RelayResponse {
            success,
            message,
            data: self.data,
        })
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Plaintext error body for transport-level failures where no envelope can
/// or should be produced (unknown route, sealing failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process is serving.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Masked key fingerprint: first 8 characters followed by `...`.
    pub encryption_key: String,
    /// Backend base URL requests are forwarded to.
    pub sftp_server: String,
}
