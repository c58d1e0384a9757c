//! Forwarding decrypted requests to the backend service.
//!
//! The backend is an opaque JSON-over-HTTP service. This module knows only
//! its reply contract (`success`, `message`, optional `data`), not what any
//! route does.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** Bodies arrive here already decrypted and
//!   leave as a plaintext [`common::protocol::RelayResponse`].
//! - Every call is bounded by the client timeout and is never retried.

pub mod client;

pub use client::BackendClient;
