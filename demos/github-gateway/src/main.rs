//! Runnable gateway demo: GitHub-authenticated session in front of the
//! built-in tool set, with a small HTTP front-end standing in for the
//! external transport collaborator.
//!
//! The OAuth handshake itself is out of scope here; the demo reads the
//! upstream bearer token from `GITHUB_TOKEN` and resolves the principal's
//! login with one startup call, which is the same shape of principal the
//! OAuth boundary would hand over.

use std::convert::Infallible;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use gateway_adapters::flux::{FluxClient, FluxConfig};
use gateway_adapters::github::{GITHUB_TOKEN_ENV, GitHubClient, GitHubConfig, token_from_env};
use gateway_adapters::traits::{ImageModel, UserApi};
use gateway_primitives::Principal;
use gateway_session::SessionInitializer;
use gateway_session::builtin::default_catalog;
use gateway_tools::registry::{SessionRegistry, ToolError};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the comma-delimited allow-list.
const ALLOWED_USERNAMES_ENV: &str = "ALLOWED_USERNAMES";

#[derive(Debug, Deserialize)]
struct CallRequest {
    tool: String,
    #[serde(default)]
    arguments: Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let token = token_from_env()
        .ok_or_else(|| anyhow!("{GITHUB_TOKEN_ENV} environment variable is not set"))?;

    let github: Arc<dyn UserApi> =
        Arc::new(GitHubClient::new(GitHubConfig::new()).context("building GitHub client")?);
    let flux: Arc<dyn ImageModel> = Arc::new(
        FluxClient::new(FluxConfig::from_env().context("loading image backend configuration")?)
            .context("building image backend client")?,
    );

    // Stand-in for the OAuth boundary: one startup lookup resolves the
    // login this token belongs to.
    let user = github
        .authenticated_user(&token)
        .await
        .context("resolving authenticated user")?;
    let login = user["login"]
        .as_str()
        .ok_or_else(|| anyhow!("GitHub user response is missing `login`"))?
        .to_owned();
    info!(login = %login, "authenticated against GitHub");

    let allow_list = env::var(ALLOWED_USERNAMES_ENV).ok();
    let catalog = default_catalog(github, flux).context("building tool catalog")?;
    let initializer = SessionInitializer::new(catalog, allow_list.as_deref());

    let principal = Principal::new(login, token).context("building principal")?;
    let registry = Arc::new(initializer.initialize(principal));

    let port = env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(8787);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let make_svc = make_service_fn(move |_conn| {
        let registry = Arc::clone(&registry);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(Arc::clone(&registry), req)))
        }
    });

    info!(%addr, "gateway listening");
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .context("serving gateway")?;

    Ok(())
}

async fn handle(
    registry: Arc<SessionRegistry>,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/tools") => json_response(StatusCode::OK, &json!(registry.list())),
        (&Method::POST, "/call") => call(&registry, req).await,
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "not found" })),
    };
    Ok(response)
}

async fn call(registry: &SessionRegistry, req: Request<Body>) -> Response<Body> {
    let bytes = match hyper::body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "failed to read request body");
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "unreadable request body" }),
            );
        }
    };

    let call: CallRequest = match serde_json::from_slice(&bytes) {
        Ok(call) => call,
        Err(err) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": format!("malformed call request: {err}") }),
            );
        }
    };

    match registry.invoke(&call.tool, call.arguments).await {
        Ok(output) => json_response(StatusCode::OK, &json!(output)),
        Err(ToolError::UnknownTool { name }) => json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": format!("tool `{name}` is not registered") }),
        ),
        Err(ToolError::Schema(violation)) => json_response(
            StatusCode::BAD_REQUEST,
            &json!({
                "error": "schema violation",
                "field": violation.field(),
                "constraint": violation.constraint().to_string(),
            }),
        ),
        Err(err) => {
            warn!(tool = %call.tool, %err, "tool invocation failed");
            json_response(
                StatusCode::BAD_GATEWAY,
                &json!({ "error": err.to_string() }),
            )
        }
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
