//! Shared error definitions for gateway primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the gateway crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating gateway primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided session identifier could not be parsed.
    #[error("invalid session id: {source}")]
    InvalidSessionId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Principal fields failed validation.
    #[error("invalid principal: {reason}")]
    InvalidPrincipal {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
