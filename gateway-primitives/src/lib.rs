//! Core shared types for the capability-gated tool gateway.

#![warn(missing_docs, clippy::pedantic)]

mod allowlist;
mod error;
mod ids;
mod principal;

/// Capability allow-list parsed from process configuration.
pub use allowlist::AllowList;
/// Error type and result alias shared across the gateway.
pub use error::{Error, Result};
/// Unique identifier for authenticated gateway sessions.
pub use ids::SessionId;
/// Authenticated identity and upstream credential for one session.
pub use principal::Principal;
