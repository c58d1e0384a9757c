//! Gateway error taxonomy shared across crates.

use thiserror::Error;

/// Top-level gateway error type.
///
/// Every variant carries operator-facing detail for local logs only. Callers
/// never see the detail: [`GatewayError::public_message`] gives the terse text
/// that goes into the sealed response, always with status 400.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The outer request was malformed: not JSON, missing the `data` field.
    #[error("transport error: {0}")]
    Transport(String),

    /// The envelope failed to decode, authenticate, or the key is unusable.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The backend was unreachable, timed out, or replied with garbage.
    #[error("backend error: {1}")]
    Backend(BackendFailure, String),
}

/// Which backend step failed. Each maps to its own caller-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFailure {
    /// Connection refused, timeout, DNS failure.
    Forward,
    /// Headers arrived but the body could not be read.
    Read,
    /// Body was not a well-formed reply object.
    Parse,
}

/// Message returned for every request-shape or envelope failure.
pub const MSG_DECRYPTION_FAILED: &str = "Decryption failed";
/// Message returned when the backend could not be reached.
pub const MSG_FORWARD_FAILED: &str = "Failed to process request";
/// Message returned when the backend body could not be read.
pub const MSG_READ_FAILED: &str = "Failed to read response";
/// Message returned when the backend reply was not a valid reply object.
pub const MSG_INVALID_RESPONSE: &str = "Invalid response format";
/// Plaintext message used when no envelope can be produced.
pub const MSG_SEAL_FAILED: &str = "Failed to encrypt response";

impl GatewayError {
    /// Terse message safe to hand back to the caller.
    ///
    /// Request-format and envelope failures share one message so that a caller
    /// cannot tell which parsing stage rejected its input.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) | GatewayError::Crypto(_) => MSG_DECRYPTION_FAILED,
            GatewayError::Backend(BackendFailure::Forward, _) => MSG_FORWARD_FAILED,
            GatewayError::Backend(BackendFailure::Read, _) => MSG_READ_FAILED,
            GatewayError::Backend(BackendFailure::Parse, _) => MSG_INVALID_RESPONSE,
        }
    }

    /// Short class label for structured logs (`error_class` field).
    pub fn class(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "request_format",
            GatewayError::Crypto(_) => "crypto",
            GatewayError::Backend(BackendFailure::Forward, _) => "backend_forward",
            GatewayError::Backend(BackendFailure::Read, _) => "backend_read",
            GatewayError::Backend(BackendFailure::Parse, _) => "backend_parse",
        }
    }
}
