//! Whole-document validation of resource mapping specifications
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::{ResourceSpec, ResourceToDbMappingSpec};
use crate::validation::base::{SchemaValidator, ValidationContext, ValidationHelpers};
use crate::validation::builder::ModelBuilder;
use crate::validation::cross::cross_validate_at;
use crate::validation::error::SpecResult;
use crate::validation::ValidationConfig;
use serde_json::Value;
use tracing::debug;

/// Validator for `{resource, resourceToDbMapper}` documents
///
/// The resource and the mapper are constructed independently and their
/// violations are reported together; cross-object rules only run once both
/// are valid on their own.
#[derive(Debug, Clone, Default)]
pub struct MappingSpecValidator {
    config: ValidationConfig,
}

impl MappingSpecValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }
}

impl SchemaValidator for MappingSpecValidator {
    type Output = ResourceToDbMappingSpec;

    fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn validate_with_context(
        &self,
        input: &Value,
        ctx: &ValidationContext,
    ) -> SpecResult<ResourceToDbMappingSpec> {
        let mut builder = ModelBuilder::new(&self.config);
        let Some(fields) = builder.normalized::<ResourceToDbMappingSpec>(input, ctx) else {
            return Err(builder.into_errors().into());
        };

        let resource = builder.nested(&fields, "resource", true, |b, v, c| b.checked_resource(v, c));
        let mapper = builder.nested(&fields, "resourceToDbMapper", true, |b, v, c| {
            b.checked_mapper(v, c)
        });
        let (resource, mapper) = builder.finish(resource.zip(mapper))?;

        debug!(resource = %resource.resource_name, "Running cross-object validation");
        cross_validate_at(resource, mapper, ctx)
    }
}

/// Validate a document holding only a `resource`
pub(crate) fn validate_resource_document(
    input: &Value,
    config: &ValidationConfig,
) -> SpecResult<ResourceSpec> {
    ValidationHelpers::require_document(input)?;
    let ctx = ValidationContext::root();
    let mut builder = ModelBuilder::new(config);
    let resource = builder
        .normalized::<ResourceSpec>(input, &ctx)
        .and_then(|fields| {
            builder.nested(&fields, "resource", true, |b, v, c| b.checked_resource(v, c))
        });
    let resource = builder.finish(resource)?;
    Ok(ResourceSpec { resource })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error::{ErrorKind, SpecError};
    use serde_json::json;

    #[test]
    fn test_envelope_keys_are_normalized() {
        let spec = MappingSpecValidator::new()
            .validate(&json!({
                "Resource": {
                    "resource_name": "fill",
                    "version": "1",
                    "fields": [{"name": "id", "type": "integer", "isKey": true}]
                },
                "RESOURCETODBMAPPER": {
                    "resource_name": "fill",
                    "masterTable": "fills",
                    "dbSchema": "runs",
                    "fields": [{"attNamedb": "fill_id", "attNameResource": "id"}],
                    "pagination": "enabled",
                    "rowCounting": "enabled"
                }
            }))
            .unwrap();
        assert_eq!(spec.resource.resource_name, "fill");
    }

    #[test]
    fn test_construction_errors_are_merged() {
        let error = MappingSpecValidator::new()
            .validate(&json!({
                "resource": {
                    "resource_name": "fill",
                    "version": "1",
                    "fields": [{"name": "id", "type": "integer"}]
                },
                "resourceToDbMapper": {
                    "resource_name": "era",
                    "masterTable": "fills",
                    "dbSchema": "runs",
                    "pagination": "enabled"
                }
            }))
            .unwrap_err();

        let violations = error.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ErrorKind::MissingIdentifier);
        assert_eq!(violations[0].path, "$.resource.fields");
        assert_eq!(violations[1].path, "$.resourceToDbMapper.rowCounting");
    }

    #[test]
    fn test_missing_parts_and_typos_in_envelope() {
        let error = MappingSpecValidator::new()
            .validate(&json!({"resouce": {}}))
            .unwrap_err();
        let violations = error.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].suggestion.as_deref(), Some("resource"));

        let error = MappingSpecValidator::new().validate(&json!({})).unwrap_err();
        assert_eq!(error.violations().len(), 2);
    }

    #[test]
    fn test_resource_document() {
        let config = ValidationConfig::default();
        let spec = validate_resource_document(
            &json!({"resource": {
                "resource_name": "era",
                "version": "2",
                "fields": [{"name": "name", "type": "string", "isKey": true}]
            }}),
            &config,
        )
        .unwrap();
        assert_eq!(spec.resource.resource_name, "era");

        assert!(matches!(
            validate_resource_document(&Value::Null, &config),
            Err(SpecError::EmptyInput)
        ));
    }
}
