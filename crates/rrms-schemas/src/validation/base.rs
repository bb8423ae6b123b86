//! Base validation trait and common utilities
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::validation::error::{SpecError, SpecResult, ValidationErrors};
use crate::validation::ValidationConfig;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

/// Location of the value currently being validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    /// Current path, rooted at `$`
    pub path: String,
    /// Nesting depth inside expression trees
    pub depth: usize,
}

impl ValidationContext {
    /// Context for the document root
    pub fn root() -> Self {
        Self {
            path: "$".to_string(),
            depth: 0,
        }
    }

    /// Context rooted at an arbitrary path
    pub fn at<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            depth: 0,
        }
    }

    /// Create a child context with updated path
    pub fn child<P: AsRef<str>>(&self, path_segment: P) -> Self {
        Self {
            path: format!("{}.{}", self.path, path_segment.as_ref()),
            depth: self.depth,
        }
    }

    /// Create a child context for array index
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{}]", self.path, index),
            depth: self.depth,
        }
    }

    /// Child context one level deeper in an expression tree
    pub fn descend<P: AsRef<str>>(&self, path_segment: P) -> Self {
        let mut child = self.child(path_segment);
        child.depth += 1;
        child
    }

    /// Indexed child context one level deeper in an expression tree
    pub fn descend_index(&self, index: usize) -> Self {
        let mut child = self.child_index(index);
        child.depth += 1;
        child
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::root()
    }
}

/// Base trait for specification validators
pub trait SchemaValidator {
    /// The validated model
    type Output;

    /// Validator configuration
    fn config(&self) -> &ValidationConfig;

    /// Validate a raw document rooted at `$`
    fn validate(&self, input: &Value) -> SpecResult<Self::Output> {
        ValidationHelpers::require_document(input)?;
        self.validate_with_context(input, &ValidationContext::root())
    }

    /// Validate a raw value located at `ctx`
    fn validate_with_context(&self, input: &Value, ctx: &ValidationContext)
        -> SpecResult<Self::Output>;

    /// Collect all validation errors (non-failing)
    fn collect_errors(&self, input: &Value) -> ValidationErrors {
        match self.validate(input) {
            Ok(_) => ValidationErrors::new(),
            Err(SpecError::Invalid(errors)) => errors,
            Err(fatal) => ValidationErrors::from(
                crate::validation::error::ValidationError::structural("$", fatal.to_string()),
            ),
        }
    }
}

/// Helper functions for common validation patterns
pub struct ValidationHelpers;

static DISALLOWED_NAME_CHARS: OnceLock<Regex> = OnceLock::new();
static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

impl ValidationHelpers {
    /// Name of a JSON value's kind, for messages
    pub fn value_kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "list",
            Value::Object(_) => "mapping",
        }
    }

    /// Fail fast on absent or non-mapping top-level input
    pub fn require_document(input: &Value) -> SpecResult<()> {
        match input {
            Value::Null => Err(SpecError::EmptyInput),
            Value::Object(_) => Ok(()),
            other => Err(SpecError::NotAnObject {
                found: Self::value_kind(other),
            }),
        }
    }

    /// Strip every character outside `[A-Za-z0-9_-]`
    ///
    /// Names are corrected silently; the change is only logged.
    pub fn sanitize_name(value: &str, path: &str) -> String {
        let pattern = DISALLOWED_NAME_CHARS
            .get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid sanitizer pattern"));
        let cleaned = pattern.replace_all(value, "").into_owned();
        if cleaned != value {
            warn!(path, original = value, sanitized = %cleaned, "Sanitized input");
        }
        cleaned
    }

    /// Whether `value` is a non-empty run of letters, digits and underscores
    pub fn is_identifier(value: &str) -> bool {
        IDENTIFIER
            .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid identifier pattern"))
            .is_match(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_context_child() {
        let context = ValidationContext::root();
        let child = context.child("resource");
        assert_eq!(child.path, "$.resource");

        let grandchild = child.child("fields");
        assert_eq!(grandchild.path, "$.resource.fields");
    }

    #[test]
    fn test_validation_context_child_index() {
        let context = ValidationContext::root().child("fields");
        let indexed = context.child_index(0);
        assert_eq!(indexed.path, "$.fields[0]");
        assert_eq!(indexed.depth, 0);
    }

    #[test]
    fn test_descend_tracks_depth() {
        let context = ValidationContext::root().child("expression");
        let left = context.descend("left").descend("right");
        assert_eq!(left.path, "$.expression.left.right");
        assert_eq!(left.depth, 2);
        assert_eq!(left.descend_index(3).depth, 3);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(ValidationHelpers::sanitize_name("John@Doe#123!", "$"), "JohnDoe123");
        assert_eq!(ValidationHelpers::sanitize_name("start_time", "$"), "start_time");
        assert_eq!(ValidationHelpers::sanitize_name("run-number", "$"), "run-number");
    }

    #[test]
    fn test_is_identifier() {
        assert!(ValidationHelpers::is_identifier("data2024"));
        assert!(ValidationHelpers::is_identifier("resource_1"));
        assert!(!ValidationHelpers::is_identifier("fill-run"));
        assert!(!ValidationHelpers::is_identifier(""));
    }

    #[test]
    fn test_require_document() {
        assert!(matches!(
            ValidationHelpers::require_document(&Value::Null),
            Err(SpecError::EmptyInput)
        ));
        assert!(matches!(
            ValidationHelpers::require_document(&json!([1, 2])),
            Err(SpecError::NotAnObject { found: "list" })
        ));
        assert!(ValidationHelpers::require_document(&json!({})).is_ok());
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(ValidationHelpers::value_kind(&json!(null)), "null");
        assert_eq!(ValidationHelpers::value_kind(&json!([1])), "list");
        assert_eq!(ValidationHelpers::value_kind(&json!({"a": 1})), "mapping");
    }
}
