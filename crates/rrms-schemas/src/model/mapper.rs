//! Database mapping of a resource: master table, joins and derived fields
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::field_schema;
use crate::model::enums::{JoinKind, NullsOrder, SortOrder, Toggle};
use crate::model::expression::{CaseExpression, Condition, Expression, Function};
use serde::Serialize;

/// `REGEXP_SUBSTR`-style transform applied to a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexTransform {
    pub column: String,
    pub pattern: String,
    pub groups: Vec<i64>,
}

field_schema!(RegexTransform, "Regex", ["column", "pattern", "groups"]);

/// Pair of columns joining two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationKey {
    #[serde(rename = "tableKey")]
    pub table_key: String,
    #[serde(rename = "targetKey", skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexTransform>,
}

field_schema!(RelationKey, "RelationKey", ["tableKey", "targetKey", "regex"]);

impl RelationKey {
    /// Column of the related table, which defaults to `tableKey`
    pub fn target(&self) -> &str {
        self.target_key.as_deref().unwrap_or(&self.table_key)
    }
}

/// Filter applied to an additional table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableFilter {
    Condition(Condition),
    Regex(RegexTransform),
}

/// Mapping of one resource attribute to its database source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableAttribute {
    #[serde(rename = "attNamedb", skip_serializing_if = "Option::is_none")]
    pub att_name_db: Option<String>,
    #[serde(rename = "attNameResource")]
    pub att_name_resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<Function>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_expression: Option<Vec<CaseExpression>>,
}

field_schema!(
    TableAttribute,
    "TableAttribute",
    ["attNamedb", "attNameResource", "function", "expression", "case_expression"]
);

impl TableAttribute {
    /// Db attribute name, with an empty name treated as unset
    pub fn att_name_db(&self) -> Option<&str> {
        self.att_name_db.as_deref().filter(|name| !name.is_empty())
    }

    /// Whether a db attribute, function, expression or case expression is assigned
    pub fn has_source(&self) -> bool {
        self.att_name_db().is_some()
            || self.function.is_some()
            || self.expression.is_some()
            || self.case_expression.is_some()
    }
}

/// Table joined to the master table or to a previously declared additional table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdditionalTable {
    pub namedb: String,
    #[serde(rename = "dbSchema")]
    pub db_schema: String,
    pub relation: JoinKind,
    #[serde(rename = "relationTable")]
    pub relation_table: String,
    #[serde(rename = "relationKeys")]
    pub relation_keys: Vec<RelationKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<TableFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableAttribute>>,
}

field_schema!(
    AdditionalTable,
    "AdditionalTable",
    ["namedb", "dbSchema", "relation", "relationTable", "relationKeys", "conditions", "fields"]
);

/// Default ordering of the result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortedQuery {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullsOrder>,
}

field_schema!(SortedQuery, "SortedQuery", ["fields", "order", "nulls"]);

/// Database mapping description of one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceToDbMapper {
    pub resource_name: String,
    #[serde(rename = "masterTable")]
    pub master_table: String,
    #[serde(rename = "dbSchema")]
    pub db_schema: String,
    #[serde(rename = "primaryKey", skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableAttribute>>,
    #[serde(rename = "additionalTables", skip_serializing_if = "Option::is_none")]
    pub additional_tables: Option<Vec<AdditionalTable>>,
    #[serde(rename = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
    #[serde(rename = "defaultSort", skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<SortedQuery>,
    pub pagination: Toggle,
    #[serde(rename = "rowCounting")]
    pub row_counting: Toggle,
}

field_schema!(
    ResourceToDbMapper,
    "ResourceToDbMapper",
    [
        "resource_name",
        "masterTable",
        "dbSchema",
        "primaryKey",
        "fields",
        "additionalTables",
        "groupBy",
        "defaultSort",
        "pagination",
        "rowCounting",
    ]
);

impl ResourceToDbMapper {
    pub fn additional_tables(&self) -> &[AdditionalTable] {
        self.additional_tables.as_deref().unwrap_or_default()
    }

    /// Master-level fields followed by every additional table's fields
    pub fn all_fields(&self) -> impl Iterator<Item = &TableAttribute> {
        self.fields
            .iter()
            .flatten()
            .chain(self.additional_tables().iter().flat_map(|t| t.fields.iter().flatten()))
    }

    /// Whether a non-empty `groupBy` is declared
    pub fn is_grouped(&self) -> bool {
        self.group_by.as_ref().is_some_and(|g| !g.is_empty())
    }
}
