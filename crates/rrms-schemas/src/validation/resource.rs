//! Resource validation: typed attributes, then the key-attribute invariant
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::{Attribute, FieldType, MetaData, Resource};
use crate::validation::base::{SchemaValidator, ValidationContext, ValidationHelpers};
use crate::validation::builder::{Fields, ModelBuilder};
use crate::validation::error::{SpecResult, ValidationError};
use crate::validation::ValidationConfig;
use serde_json::Value;
use tracing::{debug, info};

/// Validator for standalone resource definitions
#[derive(Debug, Clone, Default)]
pub struct ResourceValidator {
    config: ValidationConfig,
}

impl ResourceValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }
}

impl SchemaValidator for ResourceValidator {
    type Output = Resource;

    fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn validate_with_context(&self, input: &Value, ctx: &ValidationContext) -> SpecResult<Resource> {
        let mut builder = ModelBuilder::new(&self.config);
        let resource = builder.checked_resource(input, ctx);
        let resource = builder.finish(resource)?;
        info!(resource = %resource.resource_name, "Resource is valid");
        Ok(resource)
    }
}

/// Key-attribute invariant, checked once every attribute is well formed
pub fn missing_identifier(resource: &Resource, ctx: &ValidationContext) -> Option<ValidationError> {
    if resource.key_attributes().next().is_some() {
        return None;
    }
    Some(ValidationError::missing_identifier(
        ctx.child("fields").path,
        format!(
            "At least one attribute from 'fields' must have isKey=true: resource '{}' has no identifier",
            resource.resource_name
        ),
    ))
}

impl ModelBuilder<'_> {
    /// Required string restricted to letters, digits and underscores
    pub fn identifier(&mut self, fields: &Fields, name: &str) -> Option<String> {
        let value = self.required_str(fields, name)?;
        if ValidationHelpers::is_identifier(&value) {
            return Some(value);
        }
        self.report(ValidationError::structural(
            fields.child(name).path,
            format!(
                "Field '{}' in {} must only contain letters, digits and underscores (^[a-zA-Z0-9_]+$), found '{}'",
                name,
                fields.model(),
                value
            ),
        ));
        None
    }

    pub fn meta_data(&mut self, value: &Value, ctx: &ValidationContext) -> Option<MetaData> {
        let fields = self.normalized::<MetaData>(value, ctx)?;
        let title = self.optional_str(&fields, "title");
        let description = self.optional_str(&fields, "description");
        let searchable = self.optional_bool(&fields, "searchable");
        let sortable = self.optional_bool(&fields, "sortable");
        let units = self
            .optional_str(&fields, "units")
            .map(|units| ValidationHelpers::sanitize_name(&units, &fields.child("units").path));
        Some(MetaData {
            title,
            description,
            searchable,
            sortable,
            units,
        })
    }

    pub fn attribute(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Attribute> {
        let fields = self.normalized::<Attribute>(value, ctx)?;
        let name = self
            .required_str(&fields, "name")
            .map(|name| ValidationHelpers::sanitize_name(&name, &fields.child("name").path));
        let field_type = self.required_enum::<FieldType>(&fields, "type");
        let is_key = self.optional_bool(&fields, "isKey");
        let meta = self.nested(&fields, "meta", false, |b, v, c| b.meta_data(v, c));
        Some(Attribute {
            name: name?,
            field_type: field_type?,
            is_key,
            meta,
        })
    }

    /// Structural construction of a resource
    pub fn resource(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Resource> {
        let fields = self.normalized::<Resource>(value, ctx)?;
        let resource_name = self.identifier(&fields, "resource_name");
        let version = self.required_str(&fields, "version");
        let has_meta = self.optional_bool(&fields, "hasMeta");
        let attributes = self.list_of(&fields, "fields", true, 1, |b, item, item_ctx| {
            b.attribute(item, item_ctx)
        });
        Some(Resource {
            resource_name: resource_name?,
            version: version?,
            has_meta,
            fields: attributes?,
        })
    }

    /// Resource with both construction phases applied
    pub fn checked_resource(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Resource> {
        let resource = self.complete(|b| b.resource(value, ctx))?;
        debug!(resource = %resource.resource_name, path = %ctx.path, "Resource is structurally valid");
        match missing_identifier(&resource, ctx) {
            Some(error) => {
                self.report(error);
                None
            }
            None => Some(resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error::{ErrorKind, SpecError};
    use serde_json::json;

    fn validator() -> ResourceValidator {
        ResourceValidator::new()
    }

    #[test]
    fn test_valid_resource() {
        let resource = validator()
            .validate(&json!({
                "resource_name": "fill",
                "version": "1.0.0",
                "hasMeta": true,
                "fields": [
                    {"name": "id", "type": "integer", "isKey": true},
                    {
                        "name": "start_time",
                        "type": "datetime",
                        "meta": {"title": "Start", "searchable": true, "sortable": false, "units": "s"}
                    }
                ]
            }))
            .unwrap();

        assert_eq!(resource.resource_name, "fill");
        assert_eq!(resource.fields.len(), 2);
        assert_eq!(resource.key_attributes().count(), 1);
        assert_eq!(resource.fields[1].field_type, FieldType::DateTime);
        assert_eq!(resource.fields[1].meta.as_ref().unwrap().units.as_deref(), Some("s"));
    }

    #[test]
    fn test_missing_identifier() {
        let error = validator()
            .validate(&json!({
                "resource_name": "fill",
                "version": "1",
                "fields": [{"name": "id", "type": "integer", "isKey": false}]
            }))
            .unwrap_err();

        let violations = error.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ErrorKind::MissingIdentifier);
        assert!(violations[0].message.contains("'fill'"));
        assert_eq!(violations[0].path, "$.fields");
    }

    #[test]
    fn test_key_check_waits_for_structural_validity() {
        let error = validator()
            .validate(&json!({
                "resource_name": "fill",
                "version": "1",
                "fields": [{"name": "id"}, {"type": "string"}]
            }))
            .unwrap_err();

        let violations = error.violations();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ErrorKind::Structural));
        assert_eq!(violations[0].path, "$.fields[0].type");
        assert_eq!(violations[1].path, "$.fields[1].name");
    }

    #[test]
    fn test_names_are_sanitized_not_rejected() {
        let resource = validator()
            .validate(&json!({
                "resource_name": "fill",
                "version": "1",
                "fields": [{"name": "John@Doe#123!", "type": "string", "isKey": true}]
            }))
            .unwrap();
        assert_eq!(resource.fields[0].name, "JohnDoe123");
    }

    #[test]
    fn test_resource_name_pattern() {
        let error = validator()
            .validate(&json!({
                "resource_name": "fill-run",
                "version": "1",
                "fields": [{"name": "id", "type": "integer", "isKey": true}]
            }))
            .unwrap_err();
        assert_eq!(error.violations()[0].path, "$.resource_name");
    }

    #[test]
    fn test_empty_fields_and_unknown_type() {
        let error = validator()
            .validate(&json!({"resource_name": "fill", "version": "1", "fields": []}))
            .unwrap_err();
        assert!(error.violations()[0].message.contains("at least 1"));

        let error = validator()
            .validate(&json!({
                "resource_name": "fill",
                "version": "1",
                "fields": [{"name": "id", "type": "int", "isKey": true}]
            }))
            .unwrap_err();
        assert!(error.violations()[0].message.contains("Invalid value 'int'"));
    }

    #[test]
    fn test_fatal_input() {
        assert!(matches!(validator().validate(&Value::Null), Err(SpecError::EmptyInput)));
        assert!(matches!(
            validator().validate(&json!("fill")),
            Err(SpecError::NotAnObject { found: "string" })
        ));
    }
}
