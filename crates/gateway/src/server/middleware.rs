//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, an overall timeout, and an inbound body limit.

use std::time::Duration;

/// Headroom the router-wide timeout keeps above the backend timeout.
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Router-wide timeout for a given backend timeout.
///
/// Always longer than `backend_timeout`, so a stalled backend is reported
/// through the sealed failure path rather than a bare 408.
pub fn request_timeout(backend_timeout: Duration) -> Duration {
    backend_timeout.saturating_add(REQUEST_TIMEOUT_MARGIN)
}

/// Largest inbound body accepted on relay routes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
