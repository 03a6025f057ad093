//! Declarative argument schemas with a single validate-and-coerce entry point.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::registry::{ToolError, ToolResult};

const MAX_PARAM_NAME_LEN: usize = 64;

/// Constraint that a rejected argument failed to satisfy.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Constraint {
    /// The argument has no declared default and was not supplied.
    #[error("is required and was not supplied")]
    Required,

    /// The argument value had the wrong JSON type.
    #[error("must be of type {expected}")]
    Type {
        /// Expected type name.
        expected: &'static str,
    },

    /// The argument value fell outside its declared inclusive range.
    #[error("must be within the inclusive range [{min}, {max}]")]
    Range {
        /// Rendered lower bound.
        min: String,
        /// Rendered upper bound.
        max: String,
    },
}

fn range_constraint<T: fmt::Display>(min: Option<T>, max: Option<T>) -> Constraint {
    Constraint::Range {
        min: min.map_or_else(|| "-inf".to_owned(), |v| v.to_string()),
        max: max.map_or_else(|| "inf".to_owned(), |v| v.to_string()),
    }
}

/// Structured rejection naming the offending field and constraint.
///
/// Surfaced to the caller verbatim; the handler is never invoked once a
/// violation is found.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("argument `{field}` {constraint}")]
pub struct SchemaViolation {
    field: String,
    constraint: Constraint,
}

impl SchemaViolation {
    /// Creates a violation for the supplied field and constraint.
    #[must_use]
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }

    /// Returns the offending field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the constraint the field failed.
    #[must_use]
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

/// Value constraints for one declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    /// UTF-8 string argument.
    Text {
        /// Default applied when the argument is omitted.
        default: Option<String>,
    },

    /// Floating-point argument with optional inclusive bounds.
    Number {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
        /// Default applied when the argument is omitted.
        default: Option<f64>,
    },

    /// Integer argument with optional inclusive bounds. Any JSON number
    /// with an integral value is accepted.
    Integer {
        /// Inclusive lower bound.
        min: Option<i64>,
        /// Inclusive upper bound.
        max: Option<i64>,
        /// Default applied when the argument is omitted.
        default: Option<i64>,
    },
}

impl ParamKind {
    /// Unconstrained text parameter with no default (required).
    #[must_use]
    pub const fn text() -> Self {
        Self::Text { default: None }
    }

    /// Unconstrained number parameter with no default (required).
    #[must_use]
    pub const fn number() -> Self {
        Self::Number {
            min: None,
            max: None,
            default: None,
        }
    }

    /// Integer parameter with inclusive bounds and a default.
    #[must_use]
    pub const fn integer_in(min: i64, max: i64, default: Option<i64>) -> Self {
        Self::Integer {
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    fn has_default(&self) -> bool {
        match self {
            Self::Text { default } => default.is_some(),
            Self::Number { default, .. } => default.is_some(),
            Self::Integer { default, .. } => default.is_some(),
        }
    }
}

/// One named parameter in a tool schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    name: String,
    description: Option<String>,
    kind: ParamKind,
}

impl ParamSpec {
    /// Creates a parameter with the supplied name and constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared constraints.
    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Returns whether the parameter must be supplied by the caller.
    #[must_use]
    pub fn required(&self) -> bool {
        !self.kind.has_default()
    }
}

/// Declarative argument schema for one tool.
///
/// The schema is plain data: construction validates the declaration itself
/// (unique names, defaults inside their own ranges), so a schema that exists
/// at runtime is internally consistent by construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Schema accepting no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a schema from the supplied parameter declarations.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidSchema`] when a parameter name is empty,
    /// malformed, or duplicated, or when a declared default violates the
    /// parameter's own range.
    pub fn new(params: Vec<ParamSpec>) -> ToolResult<Self> {
        let mut seen = HashSet::new();
        for param in &params {
            validate_param_name(param.name())?;
            if !seen.insert(param.name().to_owned()) {
                return Err(ToolError::InvalidSchema {
                    reason: format!("duplicate parameter `{}`", param.name()),
                });
            }
            validate_default(param)?;
        }

        Ok(Self { params })
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validates and coerces a raw argument bundle.
    ///
    /// Defaults are applied for omitted optional parameters, inclusive
    /// ranges are checked, and undeclared fields are dropped. `Null` stands
    /// for an empty argument bundle.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaViolation`] naming the first offending field and
    /// the constraint it failed.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>, SchemaViolation> {
        let supplied = match arguments {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => {
                return Err(SchemaViolation::new(
                    "arguments",
                    Constraint::Type { expected: "object" },
                ));
            }
        };

        let mut coerced = Map::new();
        for param in &self.params {
            let raw = supplied.and_then(|map| map.get(param.name()));
            let value = coerce_param(param, raw)?;
            coerced.insert(param.name().to_owned(), value);
        }

        Ok(coerced)
    }
}

fn coerce_param(param: &ParamSpec, raw: Option<&Value>) -> Result<Value, SchemaViolation> {
    match (param.kind(), raw) {
        (ParamKind::Text { default }, None) => default.clone().map_or_else(
            || Err(SchemaViolation::new(param.name(), Constraint::Required)),
            |text| Ok(Value::String(text)),
        ),
        (ParamKind::Text { .. }, Some(Value::String(text))) => Ok(Value::String(text.clone())),
        (ParamKind::Text { .. }, Some(_)) => Err(SchemaViolation::new(
            param.name(),
            Constraint::Type { expected: "string" },
        )),

        (ParamKind::Number { default, .. }, None) => default.map_or_else(
            || Err(SchemaViolation::new(param.name(), Constraint::Required)),
            |number| Ok(Value::from(number)),
        ),
        (ParamKind::Number { min, max, .. }, Some(value)) => {
            let number = value.as_f64().ok_or_else(|| {
                SchemaViolation::new(param.name(), Constraint::Type { expected: "number" })
            })?;
            if min.is_some_and(|bound| number < bound) || max.is_some_and(|bound| number > bound) {
                return Err(SchemaViolation::new(
                    param.name(),
                    range_constraint(*min, *max),
                ));
            }
            Ok(Value::from(number))
        }

        (ParamKind::Integer { default, .. }, None) => default.map_or_else(
            || Err(SchemaViolation::new(param.name(), Constraint::Required)),
            |integer| Ok(Value::from(integer)),
        ),
        (ParamKind::Integer { min, max, .. }, Some(value)) => {
            let integer = integral_value(value).ok_or_else(|| {
                SchemaViolation::new(param.name(), Constraint::Type { expected: "integer" })
            })?;
            if min.is_some_and(|bound| integer < bound) || max.is_some_and(|bound| integer > bound)
            {
                return Err(SchemaViolation::new(
                    param.name(),
                    range_constraint(*min, *max),
                ));
            }
            Ok(Value::from(integer))
        }
    }
}

/// Accepts `4` and `4.0` but not `4.5` or non-numbers.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_value(value: &Value) -> Option<i64> {
    if let Some(integer) = value.as_i64() {
        return Some(integer);
    }
    let number = value.as_f64()?;
    if number.fract() == 0.0 && number.abs() <= i64::MAX as f64 {
        return Some(number as i64);
    }
    None
}

fn validate_param_name(name: &str) -> ToolResult<()> {
    if name.is_empty() {
        return Err(ToolError::InvalidSchema {
            reason: "parameter name cannot be empty".into(),
        });
    }
    if name.len() > MAX_PARAM_NAME_LEN {
        return Err(ToolError::InvalidSchema {
            reason: format!("parameter name length must be <= {MAX_PARAM_NAME_LEN}"),
        });
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
    {
        return Err(ToolError::InvalidSchema {
            reason: format!(
                "parameter `{name}` must contain lowercase alphanumeric or underscore"
            ),
        });
    }
    Ok(())
}

fn validate_default(param: &ParamSpec) -> ToolResult<()> {
    match param.kind() {
        ParamKind::Text { .. } => Ok(()),
        ParamKind::Number { min, max, default } => {
            if let Some(default) = default {
                if !default.is_finite() {
                    return Err(ToolError::InvalidSchema {
                        reason: format!("default for `{}` must be finite", param.name()),
                    });
                }
                if min.is_some_and(|bound| *default < bound)
                    || max.is_some_and(|bound| *default > bound)
                {
                    return Err(ToolError::InvalidSchema {
                        reason: format!("default for `{}` violates its own range", param.name()),
                    });
                }
            }
            Ok(())
        }
        ParamKind::Integer { min, max, default } => {
            if let Some(default) = default {
                if min.is_some_and(|bound| *default < bound)
                    || max.is_some_and(|bound| *default > bound)
                {
                    return Err(ToolError::InvalidSchema {
                        reason: format!("default for `{}` violates its own range", param.name()),
                    });
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps_schema() -> ToolSchema {
        ToolSchema::new(vec![
            ParamSpec::new("prompt", ParamKind::text()),
            ParamSpec::new("steps", ParamKind::integer_in(4, 8, Some(4))),
        ])
        .expect("schema")
    }

    #[test]
    fn applies_default_when_omitted() {
        let args = steps_schema()
            .validate(&json!({ "prompt": "a cat" }))
            .expect("validate");
        assert_eq!(args["steps"], json!(4));
        assert_eq!(args["prompt"], json!("a cat"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let schema = steps_schema();
        schema
            .validate(&json!({ "prompt": "p", "steps": 4 }))
            .expect("lower bound");
        schema
            .validate(&json!({ "prompt": "p", "steps": 8 }))
            .expect("upper bound");

        for out_of_range in [3, 9] {
            let violation = schema
                .validate(&json!({ "prompt": "p", "steps": out_of_range }))
                .expect_err("out of range");
            assert_eq!(violation.field(), "steps");
            assert!(matches!(violation.constraint(), Constraint::Range { .. }));
        }
    }

    #[test]
    fn integral_floats_are_accepted() {
        let schema = steps_schema();
        let args = schema
            .validate(&json!({ "prompt": "p", "steps": 6.0 }))
            .expect("integral float");
        assert_eq!(args["steps"], json!(6));

        let violation = schema
            .validate(&json!({ "prompt": "p", "steps": 6.5 }))
            .expect_err("fractional");
        assert_eq!(violation.field(), "steps");
        assert!(matches!(
            violation.constraint(),
            Constraint::Type { expected: "integer" }
        ));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let violation = steps_schema()
            .validate(&json!({ "steps": 5 }))
            .expect_err("prompt missing");
        assert_eq!(violation.field(), "prompt");
        assert_eq!(*violation.constraint(), Constraint::Required);
    }

    #[test]
    fn undeclared_fields_are_dropped() {
        let args = steps_schema()
            .validate(&json!({ "prompt": "p", "extra": true }))
            .expect("validate");
        assert!(!args.contains_key("extra"));
    }

    #[test]
    fn null_stands_for_empty_arguments() {
        let schema = ToolSchema::empty();
        let args = schema.validate(&Value::Null).expect("empty");
        assert!(args.is_empty());

        let violation = schema
            .validate(&json!([1, 2]))
            .expect_err("array arguments");
        assert_eq!(violation.field(), "arguments");
    }

    #[test]
    fn default_outside_range_is_a_construction_error() {
        let err = ToolSchema::new(vec![ParamSpec::new(
            "steps",
            ParamKind::integer_in(4, 8, Some(9)),
        )])
        .expect_err("default out of range");
        assert!(matches!(err, ToolError::InvalidSchema { .. }));
    }

    #[test]
    fn duplicate_parameter_is_a_construction_error() {
        let err = ToolSchema::new(vec![
            ParamSpec::new("a", ParamKind::number()),
            ParamSpec::new("a", ParamKind::number()),
        ])
        .expect_err("duplicate");
        assert!(matches!(err, ToolError::InvalidSchema { .. }));
    }
}
