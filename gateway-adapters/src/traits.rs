//! Shared downstream API traits and data structures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias used by downstream adapters.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error type shared by adapter implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Adapter is misconfigured or missing credentials.
    #[error("adapter not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// Transport-level failures (network, timeout, protocol).
    #[error("adapter transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The downstream service returned a non-success status.
    #[error("downstream returned status {status}: {body}")]
    Status {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body returned alongside the status.
        body: String,
    },

    /// The downstream service returned a malformed response.
    #[error("adapter response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
}

impl ApiError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for malformed responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Authenticated user lookup against the upstream identity provider's API.
///
/// Trait seam over the concrete REST client so gateway tests can substitute
/// a mock without any network access.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// Fetches the authenticated user's profile using the supplied bearer
    /// token, returning the provider's JSON body verbatim.
    async fn authenticated_user(&self, token: &str) -> ApiResult<Value>;
}

/// Image produced by a generative backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    data: String,
    mime_type: String,
}

impl GeneratedImage {
    /// Creates an image from base64-encoded data and its MIME type.
    #[must_use]
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Returns the base64-encoded image payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the MIME type of the payload.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Generative image backend invoked by the gated image tool.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generates one image for the prompt using the given diffusion steps.
    ///
    /// Parameters arrive pre-validated by the tool schema; implementations
    /// forward them without further clamping. Cancellation and timeouts are
    /// whatever the backend provides internally.
    async fn generate(&self, prompt: &str, steps: i64) -> ApiResult<GeneratedImage>;
}
