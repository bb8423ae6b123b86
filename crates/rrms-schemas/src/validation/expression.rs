//! Construction of expression trees, functions, conditions and case branches
//!
//! Each node validates only its own shape. Operand and parameter objects are
//! classified by their keys before construction so a typo inside a nested
//! node is still reported against the model it was meant for.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::{
    ArithmeticOperator, CaseExpression, CaseValue, ColumnReference, Condition, ConditionOperator,
    ConditionValue, Expression, Function, FunctionCall, Number, Operand, Param, Scalar,
};
use crate::normalize::FieldSchema;
use crate::validation::base::{ValidationContext, ValidationHelpers};
use crate::validation::builder::{Fields, ModelBuilder};
use crate::validation::error::ValidationError;
use serde_json::{Map, Value};

/// Kind of node an operand or parameter object describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeShape {
    Column,
    FunctionCall,
    Expression,
}

impl NodeShape {
    fn from_keys(map: &Map<String, Value>) -> Option<Self> {
        let has = |key: &str| map.keys().any(|k| k.eq_ignore_ascii_case(key));
        if has("function") {
            Some(NodeShape::FunctionCall)
        } else if has("operator") || has("left") || has("right") {
            Some(NodeShape::Expression)
        } else if has("table") || has("column") {
            Some(NodeShape::Column)
        } else {
            None
        }
    }
}

fn deeper(ctx: &ValidationContext) -> ValidationContext {
    ValidationContext {
        depth: ctx.depth + 1,
        ..ctx.clone()
    }
}

fn number(value: &serde_json::Number) -> Option<Number> {
    value
        .as_i64()
        .map(Number::Integer)
        .or_else(|| value.as_f64().map(Number::Float))
}

fn scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::String(s) => Some(Scalar::Text(s.clone())),
        Value::Bool(b) => Some(Scalar::Boolean(*b)),
        Value::Number(n) => number(n).map(Scalar::Number),
        _ => None,
    }
}

impl ModelBuilder<'_> {
    fn node_shape(&self, map: &Map<String, Value>) -> Option<NodeShape> {
        if let Some(shape) = NodeShape::from_keys(map) {
            return Some(shape);
        }
        let normalizer = self.normalizer();
        [
            (NodeShape::Column, normalizer.coverage(ColumnReference::lookup(), map)),
            (NodeShape::FunctionCall, normalizer.coverage(FunctionCall::lookup(), map)),
            (NodeShape::Expression, normalizer.coverage(Expression::lookup(), map)),
        ]
        .into_iter()
        .filter(|(_, covered)| *covered > 0)
        .max_by_key(|(_, covered)| *covered)
        .map(|(shape, _)| shape)
    }

    fn unrecognized_node(&mut self, expected: &str, map: &Map<String, Value>, ctx: &ValidationContext) {
        let keys = map
            .keys()
            .map(|k| format!("'{}'", k))
            .collect::<Vec<_>>()
            .join(", ");
        let mut message = format!("{}; found a mapping with keys {}", expected, keys);
        if map.keys().any(|k| k.eq_ignore_ascii_case("name")) {
            message.push_str(". Functions are written as {\"function\": {\"name\": ...}}");
        }
        self.report(ValidationError::structural(ctx.path.clone(), message));
    }

    /// Object node of an operand or parameter
    fn node<T>(
        &mut self,
        expected: &str,
        value: &Value,
        ctx: &ValidationContext,
        column: impl FnOnce(ColumnReference) -> T,
        call: impl FnOnce(FunctionCall) -> T,
        expr: impl FnOnce(Expression) -> T,
    ) -> Option<T> {
        let map = value.as_object()?;
        match self.node_shape(map) {
            Some(NodeShape::Column) => self.column_reference(value, ctx).map(column),
            Some(NodeShape::FunctionCall) => self.function_call(value, &deeper(ctx)).map(call),
            Some(NodeShape::Expression) => self.expression(value, &deeper(ctx)).map(expr),
            None => {
                self.unrecognized_node(expected, map, ctx);
                None
            }
        }
    }

    pub fn column_reference(&mut self, value: &Value, ctx: &ValidationContext) -> Option<ColumnReference> {
        let fields = self.normalized::<ColumnReference>(value, ctx)?;
        let table = self.required_str(&fields, "table");
        let column = self.required_str(&fields, "column");
        Some(ColumnReference {
            table: table?,
            column: column?,
        })
    }

    pub fn function(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Function> {
        if !self.within_depth(ctx) {
            return None;
        }
        let fields = self.normalized::<Function>(value, ctx)?;
        let name = self.required_str(&fields, "name");
        let params = self.list_of(&fields, "params", false, 0, |b, item, item_ctx| {
            b.param(item, item_ctx)
        });
        let distinct = self.optional_bool(&fields, "distinct");
        Some(Function {
            name: name?,
            params,
            distinct,
        })
    }

    pub fn function_call(&mut self, value: &Value, ctx: &ValidationContext) -> Option<FunctionCall> {
        let fields = self.normalized::<FunctionCall>(value, ctx)?;
        let function = self.nested(&fields, "function", true, |b, v, c| b.function(v, c));
        Some(FunctionCall {
            function: function?,
        })
    }

    pub fn param(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Param> {
        const EXPECTED: &str =
            "Function parameter must be an expression, function call, column reference or scalar";
        if value.is_object() {
            return self.node(
                EXPECTED,
                value,
                ctx,
                Param::Column,
                |call| Param::FunctionCall(Box::new(call)),
                |expr| Param::Expression(Box::new(expr)),
            );
        }
        let param = scalar(value).map(Param::Scalar);
        if param.is_none() {
            self.report(ValidationError::structural(
                ctx.path.clone(),
                format!(
                    "{}, found {}",
                    EXPECTED,
                    ValidationHelpers::value_kind(value)
                ),
            ));
        }
        param
    }

    pub fn operand(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Operand> {
        const EXPECTED: &str =
            "Operand must be a number, column reference, function call or expression";
        match value {
            Value::Number(n) => number(n).map(Operand::Number),
            Value::Object(_) => self.node(
                EXPECTED,
                value,
                ctx,
                Operand::Column,
                |call| Operand::FunctionCall(Box::new(call)),
                |expr| Operand::Expression(Box::new(expr)),
            ),
            other => {
                self.report(ValidationError::structural(
                    ctx.path.clone(),
                    format!(
                        "{}, found {}",
                        EXPECTED,
                        ValidationHelpers::value_kind(other)
                    ),
                ));
                None
            }
        }
    }

    pub fn expression(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Expression> {
        if !self.within_depth(ctx) {
            return None;
        }
        let fields = self.normalized::<Expression>(value, ctx)?;
        let operator = self.required_enum::<ArithmeticOperator>(&fields, "operator");
        let left = self.nested(&fields, "left", true, |b, v, c| b.operand(v, c));
        let right = self.nested(&fields, "right", true, |b, v, c| b.operand(v, c));
        Some(Expression {
            operator: operator?,
            left: left?,
            right: right?,
        })
    }

    fn condition_operator(&mut self, fields: &Fields) -> Option<ConditionOperator> {
        let text = self.required_str(fields, "operator")?;
        let operator = ConditionOperator::parse(&text);
        if operator.is_none() {
            self.report(ValidationError::structural(
                fields.child("operator").path,
                format!(
                    "Invalid value '{}' for 'operator' in {}: expected one of {}",
                    text,
                    fields.model(),
                    ConditionOperator::expected()
                ),
            ));
        }
        operator
    }

    fn condition_value(&mut self, value: &Value, ctx: &ValidationContext) -> Option<ConditionValue> {
        if let Some(items) = value.as_array() {
            let mut values = Vec::with_capacity(items.len());
            let mut complete = true;
            for (index, item) in items.iter().enumerate() {
                match scalar(item) {
                    Some(s) => values.push(s),
                    None => {
                        complete = false;
                        self.report(ValidationError::structural(
                            ctx.child_index(index).path,
                            format!(
                                "Condition values must be strings, numbers or booleans, found {}",
                                ValidationHelpers::value_kind(item)
                            ),
                        ));
                    }
                }
            }
            return complete.then_some(ConditionValue::List(values));
        }
        let parsed = scalar(value).map(ConditionValue::Scalar);
        if parsed.is_none() {
            self.report(ValidationError::structural(
                ctx.path.clone(),
                format!(
                    "Condition value must be a scalar or a list of scalars, found {}",
                    ValidationHelpers::value_kind(value)
                ),
            ));
        }
        parsed
    }

    pub fn condition(&mut self, value: &Value, ctx: &ValidationContext) -> Option<Condition> {
        let fields = self.normalized::<Condition>(value, ctx)?;
        let table = self.optional_str(&fields, "table");
        let column = self.required_str(&fields, "column");
        let operator = self.condition_operator(&fields);
        let compared = self.nested(&fields, "value", false, |b, v, c| b.condition_value(v, c));

        if let Some(op) = operator {
            if !op.is_null_test() && fields.get("value").is_none() {
                self.report(ValidationError::structural(
                    fields.child("value").path,
                    format!(
                        "The 'value' attribute is missing in Condition: it is optional only with the 'is' and 'isnot' operators, found '{}'",
                        op
                    ),
                ));
            }
        }

        Some(Condition {
            table,
            column: column?,
            operator: operator?,
            value: compared,
        })
    }

    fn case_value(&mut self, value: &Value, ctx: &ValidationContext) -> Option<CaseValue> {
        match value {
            Value::Null => Some(CaseValue::Null),
            Value::Object(_) => self.column_reference(value, ctx).map(CaseValue::Column),
            other => {
                let parsed = scalar(other).map(CaseValue::Scalar);
                if parsed.is_none() {
                    self.report(ValidationError::structural(
                        ctx.path.clone(),
                        format!(
                            "Case result must be a scalar, a column reference or null, found {}",
                            ValidationHelpers::value_kind(other)
                        ),
                    ));
                }
                parsed
            }
        }
    }

    pub fn case_expression(&mut self, value: &Value, ctx: &ValidationContext) -> Option<CaseExpression> {
        let fields = self.normalized::<CaseExpression>(value, ctx)?;
        let when = self.nested(&fields, "when", true, |b, v, c| b.condition(v, c));

        let then = match fields.raw("then") {
            Some(result) => self.case_value(result, &fields.child("then")),
            None => {
                self.report(ValidationError::structural(
                    fields.child("then").path,
                    "The 'then' attribute is missing in CaseExpression.",
                ));
                None
            }
        };
        let else_ = match fields.raw("else") {
            Some(result) => self.case_value(result, &fields.child("else")),
            None => None,
        };

        Some(CaseExpression {
            when: when?,
            then: then?,
            else_,
        })
    }
}
