//! Cross-object validation of a resource against its database mapper
//!
//! Every rule is evaluated and every violation reported:
//!
//! 1. the mapper names the resource it maps
//! 2. mapped attributes and resource attributes match in both directions
//! 3. at least one mapping entry exists and each one has a source
//! 4. with `groupBy`, plain db attributes are grouped or aggregated
//! 5. `defaultSort` only references mapped attributes
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::{Function, Resource, ResourceToDbMapper, ResourceToDbMappingSpec, TableAttribute};
use crate::validation::base::ValidationContext;
use crate::validation::error::{SpecResult, ValidationError, ValidationErrors};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

/// Mapping entry together with its location in the document
struct MappedField<'m> {
    ctx: ValidationContext,
    field: &'m TableAttribute,
}

/// Validate a resource and its mapper as one specification rooted at `$`
///
/// # Examples
///
/// ```rust
/// use rrms_schemas::validation::{cross_validate, validate_mapper, validate_resource, ValidationConfig};
/// use serde_json::json;
///
/// let config = ValidationConfig::default();
/// let resource = validate_resource(&json!({
///     "resource_name": "fill",
///     "version": "1",
///     "fields": [{"name": "id", "type": "integer", "isKey": true}]
/// }), &config).unwrap();
/// let mapper = validate_mapper(&json!({
///     "resource_name": "era",
///     "masterTable": "fills",
///     "dbSchema": "runs",
///     "fields": [{"attNamedb": "fill_id", "attNameResource": "id"}],
///     "pagination": "enabled",
///     "rowCounting": "enabled"
/// }), &config).unwrap();
///
/// let error = cross_validate(resource, mapper).unwrap_err();
/// assert!(error.to_string().contains("Mismatch in resource names"));
/// ```
pub fn cross_validate(
    resource: Resource,
    mapper: ResourceToDbMapper,
) -> SpecResult<ResourceToDbMappingSpec> {
    cross_validate_at(resource, mapper, &ValidationContext::root())
}

/// Validate a resource and its mapper located below `ctx`
pub fn cross_validate_at(
    resource: Resource,
    mapper: ResourceToDbMapper,
    ctx: &ValidationContext,
) -> SpecResult<ResourceToDbMappingSpec> {
    let errors = CrossValidator::new(&resource, &mapper, ctx).run();
    if !errors.is_empty() {
        info!(
            resource = %resource.resource_name,
            errors = errors.len(),
            "Cross-object validation failed"
        );
    }
    let spec = errors.finish(ResourceToDbMappingSpec {
        resource_to_db_mapper: mapper,
        resource,
    })?;
    info!(resource = %spec.resource.resource_name, "Mapping specification is valid");
    Ok(spec)
}

struct CrossValidator<'a> {
    resource: &'a Resource,
    mapper: &'a ResourceToDbMapper,
    resource_ctx: ValidationContext,
    mapper_ctx: ValidationContext,
    errors: ValidationErrors,
}

impl<'a> CrossValidator<'a> {
    fn new(resource: &'a Resource, mapper: &'a ResourceToDbMapper, ctx: &ValidationContext) -> Self {
        Self {
            resource,
            mapper,
            resource_ctx: ctx.child("resource"),
            mapper_ctx: ctx.child("resourceToDbMapper"),
            errors: ValidationErrors::new(),
        }
    }

    fn run(mut self) -> ValidationErrors {
        self.check_resource_name();
        let all_fields = self.field_inventory();
        self.check_mapping_sources(&all_fields);
        self.check_coverage(&all_fields);
        self.check_group_by(&all_fields);
        self.check_default_sort(&all_fields);
        self.errors
    }

    fn check_resource_name(&mut self) {
        if self.mapper.resource_name == self.resource.resource_name {
            return;
        }
        self.errors.add(ValidationError::referential_integrity(
            self.mapper_ctx.child("resource_name").path,
            format!(
                "Mismatch in resource names: resourceToDbMapper.resource_name (`{}`) does not match resource.resource_name (`{}`)",
                self.mapper.resource_name, self.resource.resource_name
            ),
        ));
    }

    /// Master-level entries followed by each additional table's entries
    fn field_inventory(&self) -> Vec<MappedField<'a>> {
        let mapper = self.mapper;
        let master_ctx = self.mapper_ctx.child("fields");
        let tables_ctx = self.mapper_ctx.child("additionalTables");

        let master = mapper
            .fields
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, field)| MappedField {
                ctx: master_ctx.child_index(index),
                field,
            });

        let joined = mapper
            .additional_tables()
            .iter()
            .enumerate()
            .flat_map(|(table_index, table)| {
                let fields_ctx = tables_ctx.child_index(table_index).child("fields");
                table
                    .fields
                    .iter()
                    .flatten()
                    .enumerate()
                    .map(move |(index, field)| MappedField {
                        ctx: fields_ctx.child_index(index),
                        field,
                    })
            });

        let inventory: Vec<_> = master.chain(joined).collect();
        debug!(
            resource = %self.resource.resource_name,
            fields = inventory.len(),
            "Assembled mapped field inventory"
        );
        inventory
    }

    fn check_mapping_sources(&mut self, all_fields: &[MappedField<'_>]) {
        if all_fields.is_empty() {
            self.errors.add(ValidationError::mapping_coverage(
                self.mapper_ctx.child("fields").path,
                "Both resourceToDbMapper.fields and resourceToDbMapper.additionalTables.fields cannot be empty at the same time: no select list attributes would be included in the final query",
            ));
        }

        for entry in all_fields.iter().filter(|entry| !entry.field.has_source()) {
            self.errors.add(ValidationError::mapping_coverage(
                entry.ctx.path.clone(),
                format!(
                    "fields.attNamedb, fields.function, fields.expression, fields.case_expression cannot be empty at the same time: nothing is assigned to resource attribute `{}`",
                    entry.field.att_name_resource
                ),
            ));
        }
    }

    fn check_coverage(&mut self, all_fields: &[MappedField<'_>]) {
        let mapped: IndexSet<&str> = all_fields
            .iter()
            .map(|entry| entry.field.att_name_resource.as_str())
            .collect();
        let declared: IndexSet<&str> = self.resource.attribute_names().collect();

        let attributes_ctx = self.resource_ctx.child("fields");
        for (index, name) in self.resource.attribute_names().enumerate() {
            if !mapped.contains(name) {
                self.errors.add(ValidationError::mapping_coverage(
                    attributes_ctx.child_index(index).child("name").path,
                    format!(
                        "Resource attribute '{}' is not mapped by any resourceToDbMapper field",
                        name
                    ),
                ));
            }
        }

        for entry in all_fields {
            let name = entry.field.att_name_resource.as_str();
            if !declared.contains(name) {
                self.errors.add(ValidationError::mapping_coverage(
                    entry.ctx.child("attNameResource").path,
                    format!(
                        "Mapped attribute '{}' is not an attribute of resource '{}'",
                        name, self.resource.resource_name
                    ),
                ));
            }
        }
    }

    fn check_group_by(&mut self, all_fields: &[MappedField<'_>]) {
        let group_by = match &self.mapper.group_by {
            Some(group_by) if !group_by.is_empty() => group_by,
            _ => return,
        };

        let mut db_attributes: IndexMap<&str, (&ValidationContext, Option<&Function>)> = IndexMap::new();
        for entry in all_fields {
            if let Some(att_name_db) = entry.field.att_name_db() {
                db_attributes.insert(att_name_db, (&entry.ctx, entry.field.function.as_ref()));
            }
        }

        for (att_name_db, (ctx, function)) in db_attributes {
            if function.is_none() && !group_by.iter().any(|g| g == att_name_db) {
                self.errors.add(ValidationError::referential_integrity(
                    ctx.child("attNamedb").path,
                    format!(
                        "Invalid reference of attribute: '{}' in fields: it must be listed in groupBy or used within an aggregation function",
                        att_name_db
                    ),
                ));
            }
        }
    }

    fn check_default_sort(&mut self, all_fields: &[MappedField<'_>]) {
        let Some(default_sort) = &self.mapper.default_sort else {
            return;
        };
        let sort_ctx = self.mapper_ctx.child("defaultSort").child("fields");

        for (index, name) in default_sort.fields.iter().enumerate() {
            let mapped = all_fields
                .iter()
                .any(|entry| &entry.field.att_name_resource == name);
            if !mapped {
                self.errors.add(ValidationError::referential_integrity(
                    sort_ctx.child_index(index).path,
                    format!(
                        "Invalid reference of attribute: '{}' in defaultSort.fields: there is no attribute with this name in the attNameResource fields",
                        name
                    ),
                ));
            }
        }
    }
}
