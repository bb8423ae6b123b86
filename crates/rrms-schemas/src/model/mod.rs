//! Strongly-typed specification models
//!
//! Models are only ever produced by the validators in
//! [`crate::validation`]; once built they are immutable and serialize back
//! to the specification's field names for code generation.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

pub mod enums;
pub mod expression;
pub mod mapper;
pub mod resource;

pub use enums::{
    ArithmeticOperator, ComparisonOperator, ConditionOperator, FieldType, JoinKind, NullsOrder,
    SortOrder, Toggle, Vocabulary,
};
pub use expression::{
    CaseExpression, CaseValue, ColumnReference, Condition, ConditionValue, Expression, Function,
    FunctionCall, Number, Operand, Param, Scalar,
};
pub use mapper::{
    AdditionalTable, RegexTransform, RelationKey, ResourceToDbMapper, SortedQuery, TableAttribute,
    TableFilter,
};
pub use resource::{Attribute, MetaData, Resource, ResourceSpec};

use crate::field_schema;
use serde::Serialize;

/// A resource paired with its database mapping, validated as a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceToDbMappingSpec {
    #[serde(rename = "resourceToDbMapper")]
    pub resource_to_db_mapper: ResourceToDbMapper,
    pub resource: Resource,
}

field_schema!(ResourceToDbMappingSpec, "ResourceToDbMappingSpec", ["resourceToDbMapper", "resource"]);
