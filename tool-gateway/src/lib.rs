//! Capability-gated tool gateway SDK facade.
//!
//! Depend on this crate via `cargo add tool-gateway`. It bundles the
//! gateway crates behind feature flags so downstream users can enable or
//! disable components as needed.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use gateway_primitives as primitives;

/// Downstream API adapters (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use gateway_adapters as adapters;

/// Tool descriptors, schemas, and the session registry (enabled by `tools`
/// feature).
#[cfg(feature = "tools")]
pub use gateway_tools as tools;

/// Session initialization and built-in tools (enabled by `session`
/// feature).
#[cfg(feature = "session")]
pub use gateway_session as session;
