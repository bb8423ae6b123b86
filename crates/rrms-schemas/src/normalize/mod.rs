//! Field-name normalization and typo detection
//!
//! Every object in a specification goes through the [`FieldNormalizer`]
//! before it is turned into a typed model:
//!
//! - keys differing from a canonical field only by case are renamed
//! - keys close to a canonical field are rejected with a "did you mean" hint
//! - any other key is rejected unless it is a passthrough field
//!
//! Canonical field names come from a static registry: each model implements
//! [`FieldSchema`] through the [`field_schema!`](crate::field_schema) macro,
//! which also builds a lowercase lookup table once per process.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

pub mod similarity;

use crate::validation::base::ValidationContext;
use crate::validation::error::ValidationError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Lowercase lookup table for a model's canonical field names
#[derive(Debug)]
pub struct FieldLookup {
    by_lowercase: HashMap<String, &'static str>,
    lowercase_names: Vec<String>,
}

impl FieldLookup {
    /// Build the lookup table for a list of canonical names
    pub fn new(fields: &'static [&'static str]) -> Self {
        let by_lowercase: HashMap<String, &'static str> = fields
            .iter()
            .map(|field| (field.to_lowercase(), *field))
            .collect();
        let mut lowercase_names: Vec<String> = by_lowercase.keys().cloned().collect();
        lowercase_names.sort();
        Self {
            by_lowercase,
            lowercase_names,
        }
    }

    /// Canonical name matching `input` case-insensitively
    pub fn canonical(&self, input: &str) -> Option<&'static str> {
        self.by_lowercase.get(&input.to_lowercase()).copied()
    }

    /// Closest canonical name whose similarity to `input` reaches `cutoff`
    pub fn suggest(&self, input: &str, cutoff: f64) -> Option<&'static str> {
        let lowered = input.to_lowercase();
        similarity::closest_match(
            &lowered,
            self.lowercase_names.iter().map(String::as_str),
            cutoff,
        )
        .and_then(|name| self.by_lowercase.get(name).copied())
    }
}

/// Statically declared canonical field names of a model
pub trait FieldSchema {
    /// Model name used in messages
    const MODEL: &'static str;

    /// Canonical field names, in declaration order
    const FIELDS: &'static [&'static str];

    /// Lowercase lookup table, built once per process
    fn lookup() -> &'static FieldLookup;
}

/// Implement [`FieldSchema`] for a model type
///
/// ```ignore
/// field_schema!(ColumnReference, "DBColumnReference", ["table", "column"]);
/// ```
#[macro_export]
macro_rules! field_schema {
    ($ty:ty, $model:expr, [$($field:expr),* $(,)?]) => {
        impl $crate::normalize::FieldSchema for $ty {
            const MODEL: &'static str = $model;
            const FIELDS: &'static [&'static str] = &[$($field),*];

            fn lookup() -> &'static $crate::normalize::FieldLookup {
                static LOOKUP: ::std::sync::OnceLock<$crate::normalize::FieldLookup> =
                    ::std::sync::OnceLock::new();
                LOOKUP.get_or_init(|| {
                    $crate::normalize::FieldLookup::new(<$ty as $crate::normalize::FieldSchema>::FIELDS)
                })
            }
        }
    };
}

/// Renames input keys to canonical field names and reports unexpected ones
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    cutoff: f64,
    passthrough: Vec<String>,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_CUTOFF, default_passthrough_fields())
    }
}

/// Similarity at or above which an unknown key is treated as a typo
pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.8;

/// Auxiliary keys accepted anywhere without being part of a model
pub fn default_passthrough_fields() -> Vec<String> {
    vec!["java_type".to_string(), "db_type".to_string()]
}

impl FieldNormalizer {
    pub fn new(cutoff: f64, passthrough: Vec<String>) -> Self {
        Self {
            cutoff,
            passthrough,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn is_passthrough(&self, key: &str) -> bool {
        self.passthrough.iter().any(|p| p == key)
    }

    /// Normalize the keys of `input` against the canonical fields of `T`
    pub fn normalize<T: FieldSchema>(
        &self,
        input: &Map<String, Value>,
        ctx: &ValidationContext,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        self.normalize_with(T::MODEL, T::lookup(), input, ctx)
    }

    /// Normalize the keys of `input` against an explicit lookup table
    pub fn normalize_with(
        &self,
        model: &str,
        lookup: &FieldLookup,
        input: &Map<String, Value>,
        ctx: &ValidationContext,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        let mut corrected = Map::new();
        let mut errors = Vec::new();

        for (input_field, value) in input {
            if let Some(canonical) = lookup.canonical(input_field) {
                if corrected.contains_key(canonical) {
                    errors.push(ValidationError::structural(
                        ctx.child(input_field).path,
                        format!(
                            "Duplicate field '{}' in {}: '{}' is already set",
                            input_field, model, canonical
                        ),
                    ));
                    continue;
                }
                corrected.insert(canonical.to_string(), value.clone());
            } else if let Some(suggestion) = lookup.suggest(input_field, self.cutoff) {
                errors.push(
                    ValidationError::structural(
                        ctx.child(input_field).path,
                        format!(
                            "Unexpected field '{}'. Did you mean '{}' ?",
                            input_field, suggestion
                        ),
                    )
                    .with_suggestion(suggestion),
                );
            } else if self.is_passthrough(input_field) {
                debug!(field = %input_field, model, "Ignoring passthrough field");
            } else {
                errors.push(ValidationError::structural(
                    ctx.child(input_field).path,
                    format!(
                        "Unexpected field '{}'. No similar field found in the specification.",
                        input_field
                    ),
                ));
            }
        }

        if errors.is_empty() {
            Ok(corrected)
        } else {
            Err(errors)
        }
    }

    /// Count how many keys of `input` belong to `lookup`, exactly or as likely typos
    pub fn coverage(&self, lookup: &FieldLookup, input: &Map<String, Value>) -> usize {
        input
            .keys()
            .filter(|key| {
                lookup.canonical(key).is_some() || lookup.suggest(key, self.cutoff).is_some()
            })
            .count()
    }
}
