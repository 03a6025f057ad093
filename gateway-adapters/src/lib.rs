//! Downstream collaborators for the tool gateway.
//!
//! The gateway delegates two categories of calls: a passthrough lookup
//! against a third-party REST API using the session principal's bearer
//! token, and a generative image call with validated parameters. Both are
//! fire-and-forget from the gateway's perspective: no caching, no retries,
//! one downstream call per tool invocation.

#![warn(missing_docs, clippy::pedantic)]

pub mod flux;
pub mod github;
mod http_client;
pub mod traits;

pub use flux::{FluxClient, FluxConfig};
pub use github::{GitHubClient, GitHubConfig};
pub use traits::{ApiError, ApiResult, GeneratedImage, ImageModel, UserApi};
