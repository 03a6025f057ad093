//! Built-in tool set exposed by the gateway.

use std::sync::Arc;

use gateway_adapters::traits::{ImageModel, UserApi};
use gateway_tools::content::ToolOutput;
use gateway_tools::descriptor::{Catalog, Gate, ToolDescriptor};
use gateway_tools::registry::{InvocationContext, ToolError, ToolResult};
use gateway_tools::schema::{ParamKind, ParamSpec, ToolSchema};
use serde_json::{Map, Value};

/// Builds the default catalog: arithmetic and user lookup for everyone,
/// image generation only for allow-listed logins.
///
/// # Errors
///
/// Propagates descriptor or schema construction errors; with the fixed
/// declarations below this only fails if a declaration is edited into an
/// invalid state.
pub fn default_catalog(
    user_api: Arc<dyn UserApi>,
    image_model: Arc<dyn ImageModel>,
) -> ToolResult<Catalog> {
    Catalog::new()
        .with_tool(add_tool()?)?
        .with_tool(user_info_tool(user_api)?)?
        .with_tool(generate_image_tool(image_model)?)
}

/// Baseline arithmetic tool: adds two numbers.
///
/// # Errors
///
/// Propagates schema or descriptor construction failures.
pub fn add_tool() -> ToolResult<ToolDescriptor> {
    let schema = ToolSchema::new(vec![
        ParamSpec::new("a", ParamKind::number()).with_description("First addend."),
        ParamSpec::new("b", ParamKind::number()).with_description("Second addend."),
    ])?;

    ToolDescriptor::new(
        "add",
        "Add two numbers",
        schema,
        Gate::Everyone,
        |_ctx: InvocationContext, args: Map<String, Value>| async move {
            let a = require_f64(&args, "a")?;
            let b = require_f64(&args, "b")?;
            Ok(ToolOutput::text(format_number(a + b)))
        },
    )
}

/// Passthrough user lookup using the session principal's upstream token.
///
/// # Errors
///
/// Propagates descriptor construction failures.
pub fn user_info_tool(user_api: Arc<dyn UserApi>) -> ToolResult<ToolDescriptor> {
    ToolDescriptor::new(
        "user_info",
        "Get the authenticated user's profile from GitHub",
        ToolSchema::empty(),
        Gate::Everyone,
        move |ctx: InvocationContext, _args: Map<String, Value>| {
            let user_api = Arc::clone(&user_api);
            async move {
                let user = user_api
                    .authenticated_user(ctx.principal().access_token())
                    .await
                    .map_err(|err| ToolError::execution(err.to_string()))?;
                let text = serde_json::to_string(&user)
                    .map_err(|err| ToolError::execution(err.to_string()))?;
                Ok(ToolOutput::text(text))
            }
        },
    )
}

/// Gated image generation tool; registered only for allow-listed logins.
///
/// # Errors
///
/// Propagates schema or descriptor construction failures.
pub fn generate_image_tool(image_model: Arc<dyn ImageModel>) -> ToolResult<ToolDescriptor> {
    let schema = ToolSchema::new(vec![
        ParamSpec::new("prompt", ParamKind::text())
            .with_description("A text description of the image you want to generate."),
        ParamSpec::new("steps", ParamKind::integer_in(4, 8, Some(4))).with_description(
            "The number of diffusion steps; higher values can improve quality but take longer. \
             Must be between 4 and 8, inclusive.",
        ),
    ])?;

    ToolDescriptor::new(
        "generate_image",
        "Generate an image using the `flux-1-schnell` model. Works best with 8 steps.",
        schema,
        Gate::AllowListed,
        move |_ctx: InvocationContext, args: Map<String, Value>| {
            let image_model = Arc::clone(&image_model);
            async move {
                let prompt = require_str(&args, "prompt")?;
                let steps = require_i64(&args, "steps")?;
                let image = image_model
                    .generate(&prompt, steps)
                    .await
                    .map_err(|err| ToolError::execution(err.to_string()))?;
                Ok(ToolOutput::image(
                    image.data().to_owned(),
                    image.mime_type().to_owned(),
                ))
            }
        },
    )
}

/// Formats a sum the way the remote caller expects: integral values without
/// a fractional part (`5`, not `5.0`).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        return (value as i64).to_string();
    }
    value.to_string()
}

fn require_f64(args: &Map<String, Value>, name: &str) -> ToolResult<f64> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::execution(format!("validated argument `{name}` missing")))
}

fn require_i64(args: &Map<String, Value>, name: &str) -> ToolResult<i64> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::execution(format!("validated argument `{name}` missing")))
}

fn require_str(args: &Map<String, Value>, name: &str) -> ToolResult<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| ToolError::execution(format!("validated argument `{name}` missing")))
}
