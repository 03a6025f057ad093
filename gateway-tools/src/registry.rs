//! Session-scoped tool registry and invocation pipeline.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use gateway_primitives::{AllowList, Principal, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::content::ToolOutput;
use crate::descriptor::{Catalog, ToolDescriptor};
use crate::schema::SchemaViolation;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool descriptor failed validation.
    #[error("invalid tool descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Argument schema declaration failed validation.
    #[error("invalid tool schema: {reason}")]
    InvalidSchema {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool is not registered for this session.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// Invocation arguments failed schema validation.
    #[error("invalid arguments: {0}")]
    Schema(#[from] SchemaViolation),

    /// Tool execution failed after validation passed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}

/// Context provided to tool handlers for one invocation.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    session_id: SessionId,
    principal: Arc<Principal>,
}

impl InvocationContext {
    /// Creates a context for the supplied session and principal.
    #[must_use]
    pub fn new(session_id: SessionId, principal: Arc<Principal>) -> Self {
        Self {
            session_id,
            principal,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

/// Trait implemented by tool handlers.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invokes the tool with schema-validated arguments.
    async fn call(
        &self,
        ctx: InvocationContext,
        args: Map<String, Value>,
    ) -> ToolResult<ToolOutput>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Send + Sync + Fn(InvocationContext, Map<String, Value>) -> Fut,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send,
{
    async fn call(
        &self,
        ctx: InvocationContext,
        args: Map<String, Value>,
    ) -> ToolResult<ToolOutput> {
        (self)(ctx, args).await
    }
}

/// Name and description advertised for one registered tool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolListing {
    name: String,
    description: String,
}

impl ToolListing {
    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Immutable per-session registry of invocable tools.
///
/// Built once at session initialization by evaluating each catalog gate
/// against the principal; never mutated afterwards, so concurrent
/// invocations need no locking.
pub struct SessionRegistry {
    session_id: SessionId,
    principal: Arc<Principal>,
    tools: HashMap<String, ToolDescriptor>,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        f.debug_struct("SessionRegistry")
            .field("session_id", &self.session_id)
            .field("registered", &names)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Filters the catalog into a session registry.
    ///
    /// Each gate is evaluated exactly once, here; a descriptor whose gate
    /// does not admit the principal is absent from the registry for the
    /// whole session.
    #[must_use]
    pub fn build(
        session_id: SessionId,
        principal: Principal,
        catalog: &Catalog,
        allow_list: &AllowList,
    ) -> Self {
        let principal = Arc::new(principal);
        let mut tools = HashMap::new();

        for descriptor in catalog.entries() {
            if descriptor.gate().admits(&principal, allow_list) {
                debug!(
                    %session_id,
                    tool = descriptor.name(),
                    "tool registered for session"
                );
                tools.insert(descriptor.name().to_owned(), descriptor.clone());
            } else {
                debug!(
                    %session_id,
                    tool = descriptor.name(),
                    "tool omitted by capability gate"
                );
            }
        }

        Self {
            session_id,
            principal,
            tools,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns whether a tool is registered for this session.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Lists the registered tools, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<ToolListing> {
        let mut listings: Vec<_> = self
            .tools
            .values()
            .map(|descriptor| ToolListing {
                name: descriptor.name().to_owned(),
                description: descriptor.description().to_owned(),
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// Invokes a registered tool by name.
    ///
    /// Arguments are validated against the tool's schema before the handler
    /// runs; the handler is never invoked on invalid input.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the name is not registered
    /// for this session, [`ToolError::Schema`] when the arguments fail
    /// validation, or propagates [`ToolError::Execution`] from the handler.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult<ToolOutput> {
        let descriptor = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;

        let args = descriptor.schema().validate(&arguments)?;

        debug!(session_id = %self.session_id, tool = name, "dispatching tool invocation");

        let ctx = InvocationContext::new(self.session_id, Arc::clone(&self.principal));
        descriptor.handler().call(ctx, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::descriptor::Gate;
    use crate::schema::{ParamKind, ParamSpec, ToolSchema};

    fn sum_descriptor() -> ToolDescriptor {
        let schema = ToolSchema::new(vec![
            ParamSpec::new("a", ParamKind::number()),
            ParamSpec::new("b", ParamKind::number()),
        ])
        .expect("schema");

        ToolDescriptor::new(
            "sum",
            "Adds two numbers",
            schema,
            Gate::Everyone,
            |_ctx: InvocationContext, args: Map<String, Value>| async move {
                let a = args["a"].as_f64().ok_or_else(|| ToolError::execution("a"))?;
                let b = args["b"].as_f64().ok_or_else(|| ToolError::execution("b"))?;
                Ok(ToolOutput::text((a + b).to_string()))
            },
        )
        .expect("descriptor")
    }

    fn registry_with(catalog: &Catalog, allow: &AllowList) -> SessionRegistry {
        let principal = Principal::new("octocat", "token").expect("principal");
        SessionRegistry::build(SessionId::random(), principal, catalog, allow)
    }

    #[tokio::test]
    async fn validates_before_dispatch() {
        let catalog = Catalog::new().with_tool(sum_descriptor()).expect("catalog");
        let registry = registry_with(&catalog, &AllowList::parse(None));

        let err = registry
            .invoke("sum", json!({ "a": 1 }))
            .await
            .expect_err("missing argument");
        assert!(matches!(err, ToolError::Schema(ref v) if v.field() == "b"));

        let output = registry
            .invoke("sum", json!({ "a": 2, "b": 3 }))
            .await
            .expect("invoke");
        assert_eq!(output, ToolOutput::text("5"));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let registry = registry_with(&Catalog::new(), &AllowList::parse(None));
        let err = registry
            .invoke("missing", Value::Null)
            .await
            .expect_err("unknown tool should error");
        assert!(matches!(err, ToolError::UnknownTool { name } if name == "missing"));
    }

    #[tokio::test]
    async fn gated_tool_is_absent_without_membership() {
        let schema = ToolSchema::empty();
        let gated = ToolDescriptor::new(
            "secret",
            "Gated",
            schema,
            Gate::AllowListed,
            |_ctx: InvocationContext, _args: Map<String, Value>| async move {
                Ok(ToolOutput::text("ok"))
            },
        )
        .expect("descriptor");
        let catalog = Catalog::new().with_tool(gated).expect("catalog");

        let registry = registry_with(&catalog, &AllowList::parse(Some("someone-else")));
        assert!(!registry.contains("secret"));
        let err = registry
            .invoke("secret", Value::Null)
            .await
            .expect_err("absent tool");
        assert!(matches!(err, ToolError::UnknownTool { .. }));

        let registry = registry_with(&catalog, &AllowList::parse(Some("octocat")));
        assert!(registry.contains("secret"));
        registry.invoke("secret", Value::Null).await.expect("invoke");
    }

    #[tokio::test]
    async fn concurrent_invocations_do_not_interfere() {
        let catalog = Catalog::new().with_tool(sum_descriptor()).expect("catalog");
        let registry = Arc::new(registry_with(&catalog, &AllowList::parse(None)));

        let left = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.invoke("sum", json!({ "a": 1, "b": 2 })).await })
        };
        let right = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.invoke("sum", json!({ "a": 10, "b": 20 })).await })
        };

        let left = left.await.expect("join").expect("invoke");
        let right = right.await.expect("join").expect("invoke");
        assert_eq!(left, ToolOutput::text("3"));
        assert_eq!(right, ToolOutput::text("30"));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let catalog = Catalog::new()
            .with_tool(sum_descriptor())
            .and_then(|catalog| {
                catalog.with_tool(
                    ToolDescriptor::new(
                        "another",
                        "Another tool",
                        ToolSchema::empty(),
                        Gate::Everyone,
                        |_ctx: InvocationContext, _args: Map<String, Value>| async move {
                            Ok(ToolOutput::text("ok"))
                        },
                    )
                    .expect("descriptor"),
                )
            })
            .expect("catalog");

        let registry = registry_with(&catalog, &AllowList::parse(None));
        let names: Vec<_> = registry
            .list()
            .into_iter()
            .map(|listing| listing.name().to_owned())
            .collect();
        assert_eq!(names, vec!["another", "sum"]);
    }
}
