//! Database mapper validation
//!
//! Construction first checks the shape of every table, relation key and
//! mapping entry. Only a structurally valid mapper is then checked for join
//! ordering and regex columns.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::{
    AdditionalTable, JoinKind, NullsOrder, RegexTransform, RelationKey, ResourceToDbMapper,
    SortOrder, SortedQuery, TableAttribute, TableFilter, Toggle,
};
use crate::validation::base::{SchemaValidator, ValidationContext, ValidationHelpers};
use crate::validation::builder::ModelBuilder;
use crate::validation::error::{SpecResult, ValidationError};
use crate::validation::ValidationConfig;
use serde_json::Value;
use tracing::{debug, info};

/// Validator for standalone database mappers
#[derive(Debug, Clone, Default)]
pub struct MapperValidator {
    config: ValidationConfig,
}

impl MapperValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }
}

impl SchemaValidator for MapperValidator {
    type Output = ResourceToDbMapper;

    fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn validate_with_context(
        &self,
        input: &Value,
        ctx: &ValidationContext,
    ) -> SpecResult<ResourceToDbMapper> {
        let mut builder = ModelBuilder::new(&self.config);
        let mapper = builder.checked_mapper(input, ctx);
        let mapper = builder.finish(mapper)?;
        info!(resource = %mapper.resource_name, "Mapper is valid");
        Ok(mapper)
    }
}

/// Join ordering and regex column rules of a structurally valid mapper
pub fn mapper_semantics(mapper: &ResourceToDbMapper, ctx: &ValidationContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut joinable: Vec<&str> = vec![mapper.master_table.as_str()];
    let tables_ctx = ctx.child("additionalTables");

    for (index, table) in mapper.additional_tables().iter().enumerate() {
        let table_ctx = tables_ctx.child_index(index);

        if !joinable.contains(&table.relation_table.as_str()) {
            errors.push(ValidationError::referential_integrity(
                table_ctx.child("relationTable").path,
                format!(
                    "Invalid relationTable '{}' for additional table '{}': it must be the masterTable ('{}') or the namedb of an additional table declared before it",
                    table.relation_table, table.namedb, mapper.master_table
                ),
            ));
        }

        let keys_ctx = table_ctx.child("relationKeys");
        for (key_index, key) in table.relation_keys.iter().enumerate() {
            if let Some(regex) = &key.regex {
                if regex.column != key.table_key && Some(&regex.column) != key.target_key.as_ref() {
                    errors.push(ValidationError::referential_integrity(
                        keys_ctx.child_index(key_index).child("regex").child("column").path,
                        format!(
                            "Regex column '{}' must be the tableKey ('{}') or the targetKey of its relation key",
                            regex.column, key.table_key
                        ),
                    ));
                }
            }
        }

        let conditions_ctx = table_ctx.child("conditions");
        for (filter_index, filter) in table.conditions.iter().flatten().enumerate() {
            if let TableFilter::Regex(regex) = filter {
                let is_key_column = table
                    .relation_keys
                    .iter()
                    .any(|key| key.table_key == regex.column || key.target() == regex.column);
                if !is_key_column {
                    errors.push(ValidationError::referential_integrity(
                        conditions_ctx.child_index(filter_index).child("column").path,
                        format!(
                            "Regex column '{}' of additional table '{}' must match one of its relation keys",
                            regex.column, table.namedb
                        ),
                    ));
                }
            }
        }

        joinable.push(table.namedb.as_str());
    }

    errors
}

impl ModelBuilder<'_> {
    pub fn regex_transform(&mut self, value: &Value, ctx: &ValidationContext) -> Option<RegexTransform> {
        let fields = self.normalized::<RegexTransform>(value, ctx)?;
        let column = self.required_str(&fields, "column");
        let pattern = self.required_str(&fields, "pattern");
        let groups = self.list_of(&fields, "groups", true, 0, |b, item, item_ctx| {
            let group = item.as_i64();
            if group.is_none() {
                b.report(ValidationError::structural(
                    item_ctx.path.clone(),
                    format!(
                        "Items of 'groups' in Regex must be integers, found {}",
                        ValidationHelpers::value_kind(item)
                    ),
                ));
            }
            group
        });
        Some(RegexTransform {
            column: column?,
            pattern: pattern?,
            groups: groups?,
        })
    }

    pub fn relation_key(&mut self, value: &Value, ctx: &ValidationContext) -> Option<RelationKey> {
        let fields = self.normalized::<RelationKey>(value, ctx)?;
        let table_key = self.required_str(&fields, "tableKey");
        let target_key = self.optional_str(&fields, "targetKey");
        let regex = self.nested(&fields, "regex", false, |b, v, c| b.regex_transform(v, c));
        Some(RelationKey {
            table_key: table_key?,
            target_key,
            regex,
        })
    }

    /// Condition, or regex when `pattern`/`groups` keys are present
    pub fn table_filter(&mut self, value: &Value, ctx: &ValidationContext) -> Option<TableFilter> {
        let map = self.object(value, "Condition", ctx)?;
        let is_regex = map
            .keys()
            .any(|k| k.eq_ignore_ascii_case("pattern") || k.eq_ignore_ascii_case("groups"));
        if is_regex {
            self.regex_transform(value, ctx).map(TableFilter::Regex)
        } else {
            self.condition(value, ctx).map(TableFilter::Condition)
        }
    }

    pub fn table_attribute(&mut self, value: &Value, ctx: &ValidationContext) -> Option<TableAttribute> {
        let fields = self.normalized::<TableAttribute>(value, ctx)?;
        let att_name_db = self.optional_str(&fields, "attNamedb");
        let att_name_resource = self.required_str(&fields, "attNameResource");
        let function = self.nested(&fields, "function", false, |b, v, c| b.function(v, c));
        let expression = self.nested(&fields, "expression", false, |b, v, c| b.expression(v, c));
        let case_expression = self.list_of(&fields, "case_expression", false, 1, |b, item, item_ctx| {
            b.case_expression(item, item_ctx)
        });
        Some(TableAttribute {
            att_name_db,
            att_name_resource: att_name_resource?,
            function,
            expression,
            case_expression,
        })
    }

    pub fn additional_table(&mut self, value: &Value, ctx: &ValidationContext) -> Option<AdditionalTable> {
        let fields = self.normalized::<AdditionalTable>(value, ctx)?;
        let namedb = self.required_str(&fields, "namedb");
        let db_schema = self.required_str(&fields, "dbSchema");
        let relation = self.required_enum::<JoinKind>(&fields, "relation");
        let relation_table = self.required_str(&fields, "relationTable");
        let relation_keys = self.list_of(&fields, "relationKeys", true, 1, |b, item, item_ctx| {
            b.relation_key(item, item_ctx)
        });
        let conditions = self.list_of(&fields, "conditions", false, 0, |b, item, item_ctx| {
            b.table_filter(item, item_ctx)
        });
        let table_fields = self.list_of(&fields, "fields", false, 0, |b, item, item_ctx| {
            b.table_attribute(item, item_ctx)
        });
        Some(AdditionalTable {
            namedb: namedb?,
            db_schema: db_schema?,
            relation: relation?,
            relation_table: relation_table?,
            relation_keys: relation_keys?,
            conditions,
            fields: table_fields,
        })
    }

    pub fn sorted_query(&mut self, value: &Value, ctx: &ValidationContext) -> Option<SortedQuery> {
        let fields = self.normalized::<SortedQuery>(value, ctx)?;
        let sort_fields = self.string_list(&fields, "fields", true, 1);
        let order = self.optional_enum::<SortOrder>(&fields, "order");
        let nulls = self.optional_enum::<NullsOrder>(&fields, "nulls");
        Some(SortedQuery {
            fields: sort_fields?,
            order,
            nulls,
        })
    }

    /// Structural construction of a mapper
    pub fn mapper(&mut self, value: &Value, ctx: &ValidationContext) -> Option<ResourceToDbMapper> {
        let fields = self.normalized::<ResourceToDbMapper>(value, ctx)?;
        let resource_name = self.identifier(&fields, "resource_name");
        let master_table = self.required_str(&fields, "masterTable");
        let db_schema = self.required_str(&fields, "dbSchema");
        let primary_key = self.optional_str(&fields, "primaryKey");
        let master_fields = self.list_of(&fields, "fields", false, 0, |b, item, item_ctx| {
            b.table_attribute(item, item_ctx)
        });
        let additional_tables = self.list_of(&fields, "additionalTables", false, 0, |b, item, item_ctx| {
            b.additional_table(item, item_ctx)
        });
        let group_by = self.string_list(&fields, "groupBy", false, 0);
        let default_sort = self.nested(&fields, "defaultSort", false, |b, v, c| b.sorted_query(v, c));
        let pagination = self.required_enum::<Toggle>(&fields, "pagination");
        let row_counting = self.required_enum::<Toggle>(&fields, "rowCounting");
        Some(ResourceToDbMapper {
            resource_name: resource_name?,
            master_table: master_table?,
            db_schema: db_schema?,
            primary_key,
            fields: master_fields,
            additional_tables,
            group_by,
            default_sort,
            pagination: pagination?,
            row_counting: row_counting?,
        })
    }

    /// Mapper with both construction phases applied
    pub fn checked_mapper(&mut self, value: &Value, ctx: &ValidationContext) -> Option<ResourceToDbMapper> {
        let mapper = self.complete(|b| b.mapper(value, ctx))?;
        debug!(resource = %mapper.resource_name, path = %ctx.path, "Mapper is structurally valid");
        let errors = mapper_semantics(&mapper, ctx);
        if errors.is_empty() {
            return Some(mapper);
        }
        for error in errors {
            self.report(error);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error::ErrorKind;
    use serde_json::json;

    fn mapper(additional_tables: Value) -> Value {
        json!({
            "resource_name": "run",
            "masterTable": "runs",
            "dbSchema": "cms",
            "primaryKey": "run_number",
            "fields": [
                {"attNamedb": "run_number", "attNameResource": "run_number"},
                {
                    "attNameResource": "duration",
                    "expression": {
                        "operator": "subtract",
                        "left": {"table": "runs", "column": "end_time"},
                        "right": {"table": "runs", "column": "start_time"}
                    }
                }
            ],
            "additionalTables": additional_tables,
            "defaultSort": {"fields": ["run_number"], "order": "desc", "nulls": "last"},
            "pagination": "enabled",
            "rowCounting": "disabled"
        })
    }

    #[test]
    fn test_valid_mapper_with_chained_joins() {
        let mapper = MapperValidator::new()
            .validate(&mapper(json!([
                {
                    "namedb": "fills",
                    "dbSchema": "cms",
                    "relation": "leftJoin",
                    "relationTable": "runs",
                    "relationKeys": [{"tableKey": "fill_number"}],
                    "fields": [{"attNamedb": "energy", "attNameResource": "energy"}]
                },
                {
                    "namedb": "beams",
                    "dbSchema": "lhc",
                    "relation": "innerJoin",
                    "relationTable": "fills",
                    "relationKeys": [{
                        "tableKey": "beam_id",
                        "targetKey": "name",
                        "regex": {"column": "name", "pattern": "[^/]+", "groups": [1, 2]}
                    }],
                    "conditions": [
                        {"column": "status", "operator": "eq", "value": "ok"},
                        {"column": "beam_id", "pattern": "[0-9]+", "groups": [1]}
                    ]
                }
            ])))
            .unwrap();

        assert_eq!(mapper.additional_tables().len(), 2);
        assert_eq!(mapper.all_fields().count(), 3);
        assert_eq!(mapper.additional_tables()[1].relation_keys[0].target(), "name");
        assert!(matches!(
            mapper.additional_tables()[1].conditions.as_deref(),
            Some([TableFilter::Condition(_), TableFilter::Regex(_)])
        ));
        assert!(mapper.pagination.is_enabled());
    }

    #[test]
    fn test_relation_table_must_be_declared_earlier() {
        let error = MapperValidator::new()
            .validate(&mapper(json!([
                {
                    "namedb": "beams",
                    "dbSchema": "lhc",
                    "relation": "innerJoin",
                    "relationTable": "fills",
                    "relationKeys": [{"tableKey": "beam_id"}]
                },
                {
                    "namedb": "fills",
                    "dbSchema": "cms",
                    "relation": "asSubselect",
                    "relationTable": "runs",
                    "relationKeys": [{"tableKey": "fill_number", "regex": {"column": "other", "pattern": ".", "groups": [1]}}]
                }
            ])))
            .unwrap_err();

        let violations = error.violations();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ErrorKind::ReferentialIntegrity));
        assert_eq!(violations[0].path, "$.additionalTables[0].relationTable");
        assert_eq!(violations[1].path, "$.additionalTables[1].relationKeys[0].regex.column");
    }

    #[test]
    fn test_filter_regex_must_use_a_relation_key() {
        let error = MapperValidator::new()
            .validate(&mapper(json!([{
                "namedb": "fills",
                "dbSchema": "cms",
                "relation": "leftJoin",
                "relationTable": "runs",
                "relationKeys": [{"tableKey": "fill_number", "targetKey": "fill"}],
                "conditions": [
                    {"column": "fill", "pattern": "[0-9]+", "groups": [1]},
                    {"column": "energy", "pattern": "[0-9]+", "groups": [1]}
                ]
            }])))
            .unwrap_err();

        let violations = error.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ErrorKind::ReferentialIntegrity);
        assert_eq!(violations[0].path, "$.additionalTables[0].conditions[1].column");
        assert!(violations[0].message.contains("'energy'"));
    }

    #[test]
    fn test_structural_errors_are_collected_across_tables() {
        let error = MapperValidator::new()
            .validate(&mapper(json!([
                {
                    "namedb": "fills",
                    "dbSchema": "cms",
                    "relation": "crossJoin",
                    "relationTable": "runs",
                    "relationKeys": []
                },
                {
                    "namedb": "beams",
                    "dbSchema": "lhc",
                    "relation": "innerJoin",
                    "relationTable": "runs",
                    "relationKeys": [{"tableKey": "beam_id"}],
                    "fields": [{"attNameResource": "beam", "case_expression": []}]
                }
            ])))
            .unwrap_err();

        let paths: Vec<_> = error.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "$.additionalTables[0].relation",
                "$.additionalTables[0].relationKeys",
                "$.additionalTables[1].fields[0].case_expression",
            ]
        );
    }

    #[test]
    fn test_toggles_and_sort_are_checked() {
        let mut value = mapper(json!([]));
        value["pagination"] = json!("on");
        value["defaultSort"] = json!({"fields": [], "order": "up"});

        let error = MapperValidator::new().validate(&value).unwrap_err();
        let messages: Vec<_> = error.violations().iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("at least 1"));
        assert!(messages[1].contains("'asc', 'desc'"));
        assert!(messages[2].contains("'enabled', 'disabled'"));
    }
}
