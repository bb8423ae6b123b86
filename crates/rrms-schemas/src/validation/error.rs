//! Validation error types for resource and mapping specifications
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a validation violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown, misspelled or duplicated field, or a malformed shape
    Structural,
    /// Resource without any key attribute
    MissingIdentifier,
    /// Attribute unmapped in either direction, or a mapping entry with no source
    MappingCoverage,
    /// Name mismatch, invalid `groupBy` or `defaultSort` reference
    ReferentialIntegrity,
}

impl ErrorKind {
    /// Stable identifier used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "structural",
            ErrorKind::MissingIdentifier => "missing_identifier",
            ErrorKind::MappingCoverage => "mapping_coverage",
            ErrorKind::ReferentialIntegrity => "referential_integrity",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation with its location and an optional suggested correction
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// What kind of rule was violated
    pub kind: ErrorKind,
    /// Field path where the violation occurred
    pub path: String,
    /// Human-readable error message
    pub message: String,
    /// Canonical field name proposed for a likely typo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at '{}')", self.message, self.path)
    }
}

impl ValidationError {
    /// Create a new validation error
    pub fn new<P, M>(kind: ErrorKind, path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn structural<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ErrorKind::Structural, path, message)
    }

    pub fn missing_identifier<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ErrorKind::MissingIdentifier, path, message)
    }

    pub fn mapping_coverage<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ErrorKind::MappingCoverage, path, message)
    }

    pub fn referential_integrity<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ErrorKind::ReferentialIntegrity, path, message)
    }

    /// Attach a suggested correction
    pub fn with_suggestion<S: Into<String>>(mut self, suggestion: S) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Every violation found at one validation boundary
#[derive(Debug, Clone, Default, PartialEq, Error, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Violations in discovery order
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors raised:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n - {}", error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Move every error of `other` into this collection
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Whether any collected error has the given kind
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Errors of a given kind
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Ok if no errors were collected, Err otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Ok(value) if no errors were collected, Err otherwise
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        self.into_result().map(|_| value)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Error returned by every top-level validation call
#[derive(Debug, Error)]
pub enum SpecError {
    /// No input at all
    #[error("Input data cannot be None")]
    EmptyInput,

    /// Top-level input is not a key-value mapping
    #[error("Input data must be a mapping at the root level, found {found}")]
    NotAnObject { found: &'static str },

    /// The specification was read but violates one or more rules
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl SpecError {
    /// Collected violations, empty for fatal input errors
    pub fn violations(&self) -> &[ValidationError] {
        match self {
            SpecError::Invalid(errors) => &errors.errors,
            _ => &[],
        }
    }

    /// Whether this error was raised before any validation ran
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SpecError::Invalid(_))
    }
}

/// Result type for top-level validation operations
pub type SpecResult<T> = Result<T, SpecError>;
