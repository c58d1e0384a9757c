//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No key material or decrypted payloads** appear in any span attribute or
//!   log field. The key is only ever logged as its masked fingerprint.
//! - Failure logs carry `error_class` and the inbound `path`; the caller only
//!   ever sees the generic sealed message.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
