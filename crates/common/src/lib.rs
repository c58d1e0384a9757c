//! Common wire types and errors shared across the envelope gateway crates.

pub mod error;
pub mod protocol;

pub use error::{BackendFailure, GatewayError};
