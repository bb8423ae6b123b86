//! Fixed vocabularies used by resource and mapping specifications
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use serde::Serialize;
use std::fmt;

/// A closed set of string values accepted by a specification field
pub trait Vocabulary: Sized + Copy + 'static {
    /// Every accepted value
    const ALL: &'static [Self];

    /// Canonical spelling
    fn as_str(&self) -> &'static str;

    /// Parse an exact canonical spelling
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }

    /// Accepted spellings, comma separated
    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|v| format!("'{}'", v.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl Vocabulary for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Data type of a resource attribute
    pub enum FieldType {
        DateTime => "datetime",
        String => "string",
        LongString => "longstring",
        SmallInteger => "smallinteger",
        Integer => "integer",
        BigInteger => "biginteger",
        TimeIntervalInt => "timeinterval_int",
        TimeIntervalDouble => "timeinterval_double",
        Float => "float",
        Double => "double",
        Boolean => "boolean",
        BinaryString => "binarystring",
        Decimal => "decimal",
    }
}

vocabulary! {
    /// Operator of an arithmetic expression
    pub enum ArithmeticOperator {
        Multiply => "multiply",
        Divide => "divide",
        Subtract => "subtract",
        Add => "add",
    }
}

impl ArithmeticOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Subtract => "-",
            ArithmeticOperator::Add => "+",
        }
    }
}

vocabulary! {
    /// Operator of a filter or `when` condition
    pub enum ComparisonOperator {
        Equal => "eq",
        NotEqual => "ne",
        LessThan => "lt",
        LessThanEqual => "lte",
        GreaterThan => "gt",
        GreaterThanEqual => "gte",
        Like => "like",
        In => "in",
        Is => "is",
        IsNot => "isnot",
    }
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanEqual => "<=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanEqual => ">=",
            ComparisonOperator::Like => "like",
            ComparisonOperator::In => "in",
            ComparisonOperator::Is => "is",
            ComparisonOperator::IsNot => "is not",
        }
    }

    /// `is` / `isnot`, which compare against NULL and take no value
    pub fn is_null_test(&self) -> bool {
        matches!(self, ComparisonOperator::Is | ComparisonOperator::IsNot)
    }
}

/// Operator accepted by a [`Condition`](crate::model::Condition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ConditionOperator {
    Arithmetic(ArithmeticOperator),
    Comparison(ComparisonOperator),
}

impl ConditionOperator {
    pub fn parse(value: &str) -> Option<Self> {
        ArithmeticOperator::parse(value)
            .map(ConditionOperator::Arithmetic)
            .or_else(|| ComparisonOperator::parse(value).map(ConditionOperator::Comparison))
    }

    pub fn expected() -> String {
        format!("{}, {}", ArithmeticOperator::expected(), ComparisonOperator::expected())
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ConditionOperator::Arithmetic(op) => op.symbol(),
            ConditionOperator::Comparison(op) => op.symbol(),
        }
    }

    pub fn is_null_test(&self) -> bool {
        matches!(self, ConditionOperator::Comparison(op) if op.is_null_test())
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionOperator::Arithmetic(op) => op.fmt(f),
            ConditionOperator::Comparison(op) => op.fmt(f),
        }
    }
}

vocabulary! {
    /// How an additional table is related to the table it joins
    pub enum JoinKind {
        /// Only matching records from both tables
        InnerJoin => "innerJoin",
        /// All records from the related table, matched ones from this table
        LeftJoin => "leftJoin",
        /// All records from this table, matched ones from the related table
        RightJoin => "rightJoin",
        /// Joined through a subquery instead of directly
        AsSubselect => "asSubselect",
    }
}

vocabulary! {
    pub enum SortOrder {
        Asc => "asc",
        Desc => "desc",
    }
}

vocabulary! {
    /// Placement of NULL values in a sorted result set
    pub enum NullsOrder {
        First => "first",
        Last => "last",
    }
}

vocabulary! {
    /// `enabled` / `disabled` switch
    pub enum Toggle {
        Enabled => "enabled",
        Disabled => "disabled",
    }
}

impl Toggle {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Toggle::Enabled)
    }
}
