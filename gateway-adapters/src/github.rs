//! GitHub REST client used for the passthrough user lookup.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use hyper::{Body, Request, Uri};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, sanitize_base_url};
use crate::traits::{ApiError, ApiResult, UserApi};

/// Environment variable used when loading the bearer token automatically.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Accept header value requested from the GitHub API.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// User-Agent sent with every request; GitHub rejects anonymous clients.
const GITHUB_USER_AGENT: &str = "tool-gateway";

/// Configuration for the GitHub client.
#[derive(Clone, Debug)]
pub struct GitHubConfig {
    base_url: String,
    timeout: Duration,
}

impl GitHubConfig {
    /// Creates a configuration pointing at the public GitHub API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: "https://api.github.com/".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the base URL, e.g. for a GitHub Enterprise host or a test
    /// server.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ApiResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the bearer token from the `GITHUB_TOKEN` environment variable.
#[must_use]
pub fn token_from_env() -> Option<String> {
    env::var(GITHUB_TOKEN_ENV).ok()
}

/// GitHub API client that performs authenticated lookups over HTTPS.
///
/// The client holds no credential of its own: the session principal's token
/// is supplied per call, so one client instance serves every session.
pub struct GitHubClient {
    client: HyperClient,
    user_endpoint: Uri,
    timeout: Duration,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("user_endpoint", &self.user_endpoint)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Constructs a new client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the endpoint cannot be built.
    pub fn new(config: GitHubConfig) -> ApiResult<Self> {
        let user_endpoint = format!("{}user", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                ApiError::configuration(format!("invalid GitHub user endpoint: {err}"))
            })?;

        let client = build_https_client()?;

        Ok(Self {
            client,
            user_endpoint,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl UserApi for GitHubClient {
    async fn authenticated_user(&self, token: &str) -> ApiResult<Value> {
        let request = Request::get(self.user_endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, GITHUB_USER_AGENT)
            .body(Body::empty())
            .map_err(|err| ApiError::transport(format!("failed to build GitHub request: {err}")))?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ApiError::transport("GitHub request timed out"))?
            .map_err(|err| ApiError::transport(format!("GitHub request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| ApiError::transport(format!("failed to read GitHub response: {err}")))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        debug!(status = status.as_u16(), "GitHub user lookup succeeded");

        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::response(format!("failed to decode GitHub response: {err}")))
    }
}
