//! Axum request handlers for all gateway endpoints.

use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::MSG_SEAL_FAILED;
use common::protocol::{EnvelopeBody, ErrorResponse, HealthResponse, RelayResponse};
use common::GatewayError;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::state::AppState;
use crate::crypto;

/// Service name reported by `GET /health`.
pub const SERVICE_NAME: &str = "middleman";

/// `POST <prefix>/<route>`: open the envelope, forward, seal the reply.
///
/// Every failure after the method check is answered with a sealed
/// `{success: false, message}` and status 400; the detail goes to the local
/// log only. If the client disconnects, hyper drops this future and the
/// in-flight backend call with it.
pub async fn relay(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_owned();
    let span = info_span!("relay", request_id = %Uuid::new_v4(), path = %path);

    async move {
        let logical = match relay_inner(&state, &path, &body).await {
            Ok(reply) => {
                info!(success = reply.success, "request processed");
                reply
            }
            Err(e) => {
                warn!(error_class = e.class(), error = %e, "relay failed");
                RelayResponse::failure(e.public_message())
            }
        };
        seal_response(&state, &logical)
    }
    .instrument(span)
    .await
}

async fn relay_inner(
    state: &AppState,
    path: &str,
    body: &[u8],
) -> Result<RelayResponse, GatewayError> {
    let envelope: EnvelopeBody =
        serde_json::from_slice(body).map_err(|e| GatewayError::Transport(e.to_string()))?;

    let plaintext = crypto::open(&envelope.data, state.key.as_bytes())
        .map_err(|e| GatewayError::Crypto(e.to_string()))?;

    let endpoint = backend_path(path, &state.api_prefix);
    info!(endpoint, "forwarding decrypted request");

    Ok(state.backend.forward(endpoint, plaintext).await?)
}

/// Strip `prefix` from an inbound `path` to get the backend path.
fn backend_path<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}

/// Serialise and seal `logical`, choosing 200 or 400 from its `success` flag.
///
/// Falls back to a plaintext 500 when sealing is impossible, since there is
/// no usable key to protect even an error message.
fn seal_response(state: &AppState, logical: &RelayResponse) -> Response {
    let status = if logical.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let sealed = serde_json::to_vec(logical)
        .map_err(|e| e.to_string())
        .and_then(|json| crypto::seal(&json, state.key.as_bytes()).map_err(|e| e.to_string()));

    match sealed {
        Ok(data) => (status, Json(EnvelopeBody { data })).into_response(),
        Err(e) => {
            error!(error = %e, "failed to seal response");
            let err = ErrorResponse::new("internal_error", MSG_SEAL_FAILED);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response()
        }
    }
}

/// `GET /health`: liveness plus a masked key fingerprint. Never sealed.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
        encryption_key: state.key_fingerprint.to_string(),
        sftp_server: state.backend.base_url().to_owned(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
