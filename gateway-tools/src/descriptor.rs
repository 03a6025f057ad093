//! Tool descriptors, capability gates, and the static catalog.

use std::fmt;
use std::sync::Arc;

use gateway_primitives::{AllowList, Principal};

use crate::registry::{ToolError, ToolHandler, ToolResult};
use crate::schema::ToolSchema;

const MAX_TOOL_NAME_LEN: usize = 64;

/// Session-time visibility condition for a tool.
///
/// Gates are evaluated exactly once, when the session registry is built. A
/// tool whose gate does not admit the principal is omitted from the
/// registry entirely rather than denied per call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Gate {
    /// Registered for every authenticated session.
    Everyone,

    /// Registered only when the principal's login is in the allow-list.
    AllowListed,
}

impl Gate {
    /// Evaluates the gate against the session principal.
    ///
    /// An empty allow-list admits nobody through [`Gate::AllowListed`], so
    /// missing configuration fails closed.
    #[must_use]
    pub fn admits(self, principal: &Principal, allow_list: &AllowList) -> bool {
        match self {
            Self::Everyone => true,
            Self::AllowListed => allow_list.contains(principal.login()),
        }
    }
}

/// A named, schema-validated, optionally gated invocable operation.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ToolSchema,
    gate: Gate,
    handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// Creates a descriptor from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDescriptor`] if the name is empty, too
    /// long, or contains unsupported characters.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ToolSchema,
        gate: Gate,
        handler: impl ToolHandler + 'static,
    ) -> ToolResult<Self> {
        let name = name.into();
        validate_tool_name(&name)?;

        Ok(Self {
            name,
            description: description.into(),
            schema,
            gate,
            handler: Arc::new(handler),
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the argument schema.
    #[must_use]
    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Returns the gating condition.
    #[must_use]
    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

fn validate_tool_name(name: &str) -> ToolResult<()> {
    if name.is_empty() {
        return Err(ToolError::InvalidDescriptor {
            reason: "tool name cannot be empty".into(),
        });
    }
    if name.len() > MAX_TOOL_NAME_LEN {
        return Err(ToolError::InvalidDescriptor {
            reason: format!("tool name length must be <= {MAX_TOOL_NAME_LEN}"),
        });
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
    {
        return Err(ToolError::InvalidDescriptor {
            reason: format!("tool name `{name}` must contain lowercase alphanumeric or underscore"),
        });
    }
    Ok(())
}

/// Static, process-wide registry of every tool the gateway can expose.
///
/// The catalog is plain data: descriptors with their gates. Each session
/// filters it once into a [`SessionRegistry`](crate::registry::SessionRegistry)
/// by evaluating the gates against the session principal.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<ToolDescriptor>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if a descriptor with the same
    /// name is already present.
    pub fn with_tool(mut self, descriptor: ToolDescriptor) -> ToolResult<Self> {
        if self
            .entries
            .iter()
            .any(|entry| entry.name() == descriptor.name())
        {
            return Err(ToolError::DuplicateTool {
                name: descriptor.name().to_owned(),
            });
        }
        self.entries.push(descriptor);
        Ok(self)
    }

    /// Returns every descriptor, gated or not.
    #[must_use]
    pub fn entries(&self) -> &[ToolDescriptor] {
        &self.entries
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Map, Value};

    use crate::content::ToolOutput;
    use crate::registry::InvocationContext;

    fn echo_descriptor(name: &str, gate: Gate) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "Echo",
            ToolSchema::empty(),
            gate,
            |_ctx: InvocationContext, _args: Map<String, Value>| async move {
                Ok(ToolOutput::text("ok"))
            },
        )
        .expect("descriptor")
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "Add", "with space", "semi;colon"] {
            let err = ToolDescriptor::new(
                name,
                "desc",
                ToolSchema::empty(),
                Gate::Everyone,
                |_ctx: InvocationContext, _args: Map<String, Value>| async move {
                    Ok(ToolOutput::text("ok"))
                },
            )
            .expect_err("invalid name");
            assert!(matches!(err, ToolError::InvalidDescriptor { .. }));
        }
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let catalog = Catalog::new()
            .with_tool(echo_descriptor("echo", Gate::Everyone))
            .expect("first");
        let err = catalog
            .with_tool(echo_descriptor("echo", Gate::AllowListed))
            .expect_err("duplicate");
        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "echo"));
    }

    #[test]
    fn allow_listed_gate_fails_closed() {
        let principal = Principal::new("octocat", "token").expect("principal");
        let empty = AllowList::parse(None);
        assert!(Gate::Everyone.admits(&principal, &empty));
        assert!(!Gate::AllowListed.admits(&principal, &empty));

        let listed = AllowList::parse(Some("octocat"));
        assert!(Gate::AllowListed.admits(&principal, &listed));
    }
}
