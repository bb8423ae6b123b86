//! Validation of resource and database mapping specifications
//!
//! Validation runs in three boundaries, each collecting every violation it
//! finds before reporting:
//!
//! - **Resource construction**: field normalization, typed attributes and the
//!   key-attribute invariant
//! - **Mapper construction**: field normalization, expression trees, join
//!   ordering and relation keys
//! - **Cross-object validation**: name identity, attribute coverage, group-by
//!   consistency and default-sort references
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod builder;
pub mod cross;
pub mod error;
pub mod expression;
pub mod mapper;
pub mod resource;
pub mod spec;

// Re-export commonly used types
pub use base::{SchemaValidator, ValidationContext, ValidationHelpers};
pub use cross::cross_validate;
pub use error::{ErrorKind, SpecError, SpecResult, ValidationError, ValidationErrors};
pub use mapper::MapperValidator;
pub use resource::ResourceValidator;
pub use spec::MappingSpecValidator;

use crate::model::{Resource, ResourceSpec, ResourceToDbMapper, ResourceToDbMappingSpec};
use crate::normalize::{default_passthrough_fields, FieldNormalizer, DEFAULT_SIMILARITY_CUTOFF};
use serde_json::Value;

/// Nesting limit of expression trees unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Similarity at or above which an unknown field is reported as a typo
    pub similarity_cutoff: f64,
    /// Maximum nesting of expressions and functions (None = unlimited)
    pub max_depth: Option<usize>,
    /// Keys accepted and dropped on any model
    pub passthrough_fields: Vec<String>,
    /// Whether batch validation stops at the first invalid document
    pub fail_fast: bool,
    /// Maximum number of invalid documents in a batch (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            similarity_cutoff: DEFAULT_SIMILARITY_CUTOFF,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            passthrough_fields: default_passthrough_fields(),
            fail_fast: false,
            max_errors: 0,
        }
    }
}

impl ValidationConfig {
    /// Enable fail-fast mode
    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Set maximum number of errors to collect
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Accept expression trees of any depth
    pub fn unlimited_depth(mut self) -> Self {
        self.max_depth = None;
        self
    }

    pub fn with_similarity_cutoff(mut self, cutoff: f64) -> Self {
        self.similarity_cutoff = cutoff;
        self
    }

    pub fn with_passthrough_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passthrough_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Field normalizer configured with this cutoff and passthrough list
    pub fn normalizer(&self) -> FieldNormalizer {
        FieldNormalizer::new(self.similarity_cutoff, self.passthrough_fields.clone())
    }
}

/// Validate a raw resource definition
///
/// # Examples
///
/// ```rust
/// use rrms_schemas::validation::{validate_resource, ValidationConfig};
/// use serde_json::json;
///
/// let resource = json!({
///     "resource_name": "fill",
///     "version": "1.0",
///     "fields": [{"name": "id", "type": "integer", "isKey": true}]
/// });
///
/// let resource = validate_resource(&resource, &ValidationConfig::default()).unwrap();
/// assert_eq!(resource.key_attributes().count(), 1);
/// ```
pub fn validate_resource(input: &Value, config: &ValidationConfig) -> SpecResult<Resource> {
    ResourceValidator::with_config(config.clone()).validate(input)
}

/// Validate a raw database mapper on its own
pub fn validate_mapper(input: &Value, config: &ValidationConfig) -> SpecResult<ResourceToDbMapper> {
    MapperValidator::with_config(config.clone()).validate(input)
}

/// Validate a document holding only a `resource`
pub fn validate_resource_spec(input: &Value, config: &ValidationConfig) -> SpecResult<ResourceSpec> {
    spec::validate_resource_document(input, config)
}

/// Validate a `{resource, resourceToDbMapper}` document, including every cross-object rule
///
/// # Examples
///
/// ```rust
/// use rrms_schemas::validation::{validate_mapping_spec, ValidationConfig};
/// use serde_json::json;
///
/// let spec = json!({
///     "resource": {
///         "resource_name": "fill",
///         "version": "1.0",
///         "fields": [{"name": "id", "type": "integer", "isKey": true}]
///     },
///     "resourceToDbMapper": {
///         "resource_name": "fill",
///         "masterTable": "fills",
///         "dbSchema": "runs",
///         "fields": [{"attNamedb": "fill_id", "attNameResource": "id"}],
///         "pagination": "enabled",
///         "rowCounting": "disabled"
///     }
/// });
///
/// assert!(validate_mapping_spec(&spec, &ValidationConfig::default()).is_ok());
/// ```
pub fn validate_mapping_spec(
    input: &Value,
    config: &ValidationConfig,
) -> SpecResult<ResourceToDbMappingSpec> {
    MappingSpecValidator::with_config(config.clone()).validate(input)
}

/// Batch validation for multiple mapping documents
///
/// Documents are validated independently; one result is returned per
/// document actually validated. Validation stops after the first invalid
/// document with `fail_fast`, or once `max_errors` documents were rejected.
pub fn validate_mapping_specs_batch(
    specs: &[Value],
    config: &ValidationConfig,
) -> Vec<SpecResult<ResourceToDbMappingSpec>> {
    let validator = MappingSpecValidator::with_config(config.clone());
    let mut results = Vec::with_capacity(specs.len());
    let mut rejected = 0;

    for spec in specs {
        let result = validator.validate(spec);
        let failed = result.is_err();
        results.push(result);

        if failed {
            rejected += 1;

            if config.fail_fast {
                break;
            }

            if config.max_errors > 0 && rejected >= config.max_errors {
                break;
            }
        }
    }

    results
}
