//! AES-256-GCM envelope primitives.
//!
//! This module is intentionally free of HTTP and JSON dependencies.
//! It provides the seal/open operations used by the relay handler and the
//! key type loaded at startup.
//!
//! # Envelope format
//!
//! ```text
//! base64-standard( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! No associated data is bound. Callers holding the shared key can build
//! envelopes with any AES-256-GCM implementation.

pub mod envelope;
pub mod key;

pub use envelope::{open, seal, KEY_LEN};
pub use key::SharedKey;
