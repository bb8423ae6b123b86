//! Expression tree used to derive database attributes
//!
//! Operands are sum types; recursion goes through `Box` so nesting depth is
//! bounded only by the validator's configured maximum.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::field_schema;
use crate::model::enums::{ArithmeticOperator, ConditionOperator};
use serde::Serialize;
use std::fmt;

/// Numeric literal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

/// String, number or boolean literal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Boolean(bool),
}

/// Leaf node referencing a physical column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
}

field_schema!(ColumnReference, "DBColumnReference", ["table", "column"]);

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Built-in, aggregate or custom database function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
}

field_schema!(Function, "Function", ["name", "params", "distinct"]);

impl Function {
    /// Whether the function applies `DISTINCT` to its arguments
    pub fn is_distinct(&self) -> bool {
        self.distinct.unwrap_or(false)
    }

    pub fn params(&self) -> &[Param] {
        self.params.as_deref().unwrap_or_default()
    }

    /// Deepest nesting below this function, counting the function itself
    pub fn depth(&self) -> usize {
        1 + self.params().iter().map(Param::depth).max().unwrap_or(0)
    }
}

/// A function used as an operand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub function: Function,
}

field_schema!(FunctionCall, "FunctionCall", ["function"]);

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Expression(Box<Expression>),
    FunctionCall(Box<FunctionCall>),
    Column(ColumnReference),
    Scalar(Scalar),
}

impl Param {
    pub fn depth(&self) -> usize {
        match self {
            Param::Expression(expr) => expr.depth(),
            Param::FunctionCall(call) => call.function.depth(),
            Param::Column(_) | Param::Scalar(_) => 1,
        }
    }
}

/// Operand of an arithmetic expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Number(Number),
    Column(ColumnReference),
    FunctionCall(Box<FunctionCall>),
    Expression(Box<Expression>),
}

impl Operand {
    pub fn depth(&self) -> usize {
        match self {
            Operand::Number(_) | Operand::Column(_) => 1,
            Operand::FunctionCall(call) => call.function.depth(),
            Operand::Expression(expr) => expr.depth(),
        }
    }
}

/// Binary arithmetic expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub operator: ArithmeticOperator,
    pub left: Operand,
    pub right: Operand,
}

field_schema!(Expression, "Expression", ["operator", "left", "right"]);

impl Expression {
    /// Deepest nesting below this expression, counting the expression itself
    pub fn depth(&self) -> usize {
        1 + self.left.depth().max(self.right.depth())
    }

    /// Every column referenced anywhere in the tree, left to right
    pub fn column_references(&self) -> Vec<&ColumnReference> {
        let mut columns = Vec::new();
        collect_operand_columns(&self.left, &mut columns);
        collect_operand_columns(&self.right, &mut columns);
        columns
    }
}

fn collect_operand_columns<'a>(operand: &'a Operand, out: &mut Vec<&'a ColumnReference>) {
    match operand {
        Operand::Number(_) => {}
        Operand::Column(column) => out.push(column),
        Operand::FunctionCall(call) => collect_function_columns(&call.function, out),
        Operand::Expression(expr) => {
            collect_operand_columns(&expr.left, out);
            collect_operand_columns(&expr.right, out);
        }
    }
}

fn collect_function_columns<'a>(function: &'a Function, out: &mut Vec<&'a ColumnReference>) {
    for param in function.params() {
        match param {
            Param::Expression(expr) => {
                collect_operand_columns(&expr.left, out);
                collect_operand_columns(&expr.right, out);
            }
            Param::FunctionCall(call) => collect_function_columns(&call.function, out),
            Param::Column(column) => out.push(column),
            Param::Scalar(_) => {}
        }
    }
}

impl Function {
    /// Every column referenced by the parameters, left to right
    pub fn column_references(&self) -> Vec<&ColumnReference> {
        let mut columns = Vec::new();
        collect_function_columns(self, &mut columns);
        columns
    }
}

/// Value compared against in a [`Condition`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Filter or `when` predicate on a single column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
    pub operator: ConditionOperator,
    /// Absent only for `is` / `isnot`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
}

field_schema!(Condition, "Condition", ["table", "column", "operator", "value"]);

/// Result of a CASE branch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseValue {
    Null,
    Scalar(Scalar),
    Column(ColumnReference),
}

/// One `WHEN ... THEN ... [ELSE ...]` branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExpression {
    pub when: Condition,
    pub then: CaseValue,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_: Option<CaseValue>,
}

field_schema!(CaseExpression, "CaseExpression", ["when", "then", "else"]);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(table: &str, column: &str) -> ColumnReference {
        ColumnReference {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    fn sum_of(col: ColumnReference) -> FunctionCall {
        FunctionCall {
            function: Function {
                name: "sum".to_string(),
                params: Some(vec![Param::Column(col)]),
                distinct: None,
            },
        }
    }

    #[test]
    fn test_depth_and_columns() {
        // (sum(f.a) * 2) - f.b
        let inner = Expression {
            operator: ArithmeticOperator::Multiply,
            left: Operand::FunctionCall(Box::new(sum_of(column("f", "a")))),
            right: Operand::Number(Number::Integer(2)),
        };
        let outer = Expression {
            operator: ArithmeticOperator::Subtract,
            left: Operand::Expression(Box::new(inner)),
            right: Operand::Column(column("f", "b")),
        };

        assert_eq!(outer.depth(), 4);
        let columns: Vec<String> = outer.column_references().iter().map(|c| c.to_string()).collect();
        assert_eq!(columns, vec!["f.a", "f.b"]);
    }

    #[test]
    fn test_serialize_uses_specification_names() {
        let branch = CaseExpression {
            when: Condition {
                table: None,
                column: "stablebeam".to_string(),
                operator: ConditionOperator::parse("eq").unwrap(),
                value: Some(ConditionValue::Scalar(Scalar::Number(Number::Integer(1)))),
            },
            then: CaseValue::Scalar(Scalar::Text("yes".to_string())),
            else_: Some(CaseValue::Null),
        };

        assert_eq!(
            serde_json::to_value(&branch).unwrap(),
            json!({
                "when": {"column": "stablebeam", "operator": "eq", "value": 1},
                "then": "yes",
                "else": null
            })
        );
    }

    #[test]
    fn test_function_defaults() {
        let f = Function {
            name: "count".to_string(),
            params: None,
            distinct: None,
        };
        assert!(!f.is_distinct());
        assert!(f.params().is_empty());
        assert_eq!(f.depth(), 1);
    }
}
