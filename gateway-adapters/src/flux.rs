//! Workers-AI-style generative image backend.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Request, Uri};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, sanitize_base_url};
use crate::traits::{ApiError, ApiResult, GeneratedImage, ImageModel};

/// Environment variable carrying the backend account identifier.
pub const FLUX_ACCOUNT_ENV: &str = "CLOUDFLARE_ACCOUNT_ID";

/// Environment variable carrying the backend API token.
pub const FLUX_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Model identifier invoked for image generation.
pub const FLUX_MODEL: &str = "@cf/black-forest-labs/flux-1-schnell";

/// MIME type of images produced by the model.
const FLUX_IMAGE_MIME: &str = "image/jpeg";

/// Configuration for the image generation client.
#[derive(Clone, Debug)]
pub struct FluxConfig {
    account_id: String,
    api_token: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl FluxConfig {
    /// Creates a configuration for the supplied account identifier.
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: None,
            base_url: "https://api.cloudflare.com/client/v4/".to_owned(),
            model: FLUX_MODEL.to_owned(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Loads account and token from `CLOUDFLARE_ACCOUNT_ID` and
    /// `CLOUDFLARE_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the account variable is
    /// unset.
    pub fn from_env() -> ApiResult<Self> {
        let account_id = env::var(FLUX_ACCOUNT_ENV).map_err(|_| {
            ApiError::configuration(format!("{FLUX_ACCOUNT_ENV} environment variable is not set"))
        })?;
        let mut cfg = Self::new(account_id);
        cfg.api_token = env::var(FLUX_TOKEN_ENV).ok();
        Ok(cfg)
    }

    /// Supplies an explicit API token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ApiResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Image generation client that calls a Workers-AI-style REST endpoint.
pub struct FluxClient {
    client: HyperClient,
    endpoint: Uri,
    api_token: String,
    timeout: Duration,
}

impl fmt::Debug for FluxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluxClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl FluxClient {
    /// Constructs a new client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the API token is missing or
    /// the endpoint cannot be built.
    pub fn new(config: FluxConfig) -> ApiResult<Self> {
        let api_token = config
            .api_token
            .ok_or_else(|| ApiError::configuration("image backend requires an API token"))?;

        let endpoint = format!(
            "{}accounts/{}/ai/run/{}",
            config.base_url, config.account_id, config.model
        )
        .parse::<Uri>()
        .map_err(|err| ApiError::configuration(format!("invalid image backend endpoint: {err}")))?;

        let client = build_https_client()?;

        Ok(Self {
            client,
            endpoint,
            api_token,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl ImageModel for FluxClient {
    async fn generate(&self, prompt: &str, steps: i64) -> ApiResult<GeneratedImage> {
        let payload = RunRequest { prompt, steps };
        let body = serde_json::to_vec(&payload).map_err(|err| {
            ApiError::transport(format!("failed to encode image request: {err}"))
        })?;

        let request = Request::post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| ApiError::transport(format!("failed to build image request: {err}")))?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ApiError::transport("image generation request timed out"))?
            .map_err(|err| ApiError::transport(format!("image request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| ApiError::transport(format!("failed to read image response: {err}")))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let envelope: RunEnvelope = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::response(format!("failed to decode image response: {err}")))?;

        if !envelope.success {
            return Err(ApiError::response(format!(
                "image backend reported failure: {:?}",
                envelope.errors
            )));
        }

        let result = envelope
            .result
            .ok_or_else(|| ApiError::response("image backend returned no result"))?;

        debug!(steps, "image generation succeeded");

        Ok(GeneratedImage::new(result.image, FLUX_IMAGE_MIME))
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    prompt: &'a str,
    steps: i64,
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    #[serde(default)]
    success: bool,
    result: Option<RunResult>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    image: String,
}
