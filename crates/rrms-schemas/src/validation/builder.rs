//! Typed model construction from raw key-value trees
//!
//! [`ModelBuilder`] carries a single violations collector through the whole
//! construction of one object graph. Every getter records its own problems and
//! returns `None` instead of failing, so one pass reports everything.
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::model::Vocabulary;
use crate::normalize::{FieldNormalizer, FieldSchema};
use crate::validation::base::{ValidationContext, ValidationHelpers};
use crate::validation::error::{ValidationError, ValidationErrors};
use crate::validation::ValidationConfig;
use serde_json::{Map, Value};

/// Normalized fields of one object, keyed by canonical names
#[derive(Debug, Clone)]
pub struct Fields {
    model: &'static str,
    ctx: ValidationContext,
    map: Map<String, Value>,
}

impl Fields {
    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn context(&self) -> &ValidationContext {
        &self.ctx
    }

    /// Present, non-null value of a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    /// Value of a field, null included
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Whether the key is present at all, even with a null value
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn child(&self, name: &str) -> ValidationContext {
        self.ctx.child(name)
    }
}

/// Builds typed models while collecting every violation
pub struct ModelBuilder<'c> {
    config: &'c ValidationConfig,
    normalizer: FieldNormalizer,
    errors: ValidationErrors,
}

impl<'c> ModelBuilder<'c> {
    pub fn new(config: &'c ValidationConfig) -> Self {
        Self {
            config,
            normalizer: config.normalizer(),
            errors: ValidationErrors::new(),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        self.config
    }

    pub fn normalizer(&self) -> &FieldNormalizer {
        &self.normalizer
    }

    pub fn report(&mut self, error: ValidationError) {
        self.errors.add(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// Close this aggregation boundary
    pub fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            None if self.errors.is_empty() => Err(ValidationErrors::from(
                ValidationError::structural("$", "Specification could not be constructed"),
            )),
            _ => Err(self.errors),
        }
    }

    /// Run `build`, discarding its result if it reported any violation
    pub fn complete<T>(&mut self, build: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let before = self.errors.len();
        let built = build(self);
        built.filter(|_| self.errors.len() == before)
    }

    /// Require a mapping value
    pub fn object<'v>(
        &mut self,
        value: &'v Value,
        model: &str,
        ctx: &ValidationContext,
    ) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.report(ValidationError::structural(
                    ctx.path.clone(),
                    format!(
                        "{} must be a mapping, found {}",
                        model,
                        ValidationHelpers::value_kind(value)
                    ),
                ));
                None
            }
        }
    }

    /// Require a mapping and normalize its keys against `T`
    pub fn normalized<T: FieldSchema>(
        &mut self,
        value: &Value,
        ctx: &ValidationContext,
    ) -> Option<Fields> {
        let map = self.object(value, T::MODEL, ctx)?;
        match self.normalizer.normalize::<T>(map, ctx) {
            Ok(map) => Some(Fields {
                model: T::MODEL,
                ctx: ctx.clone(),
                map,
            }),
            Err(errors) => {
                for error in errors {
                    self.report(error);
                }
                None
            }
        }
    }

    fn missing(&mut self, fields: &Fields, name: &str) {
        self.report(ValidationError::structural(
            fields.child(name).path,
            format!("The '{}' attribute is missing in {}.", name, fields.model),
        ));
    }

    fn wrong_kind(&mut self, fields: &Fields, name: &str, expected: &str, value: &Value) {
        self.report(ValidationError::structural(
            fields.child(name).path,
            format!(
                "Field '{}' in {} must be {}, found {}",
                name,
                fields.model,
                expected,
                ValidationHelpers::value_kind(value)
            ),
        ));
    }

    pub fn required_str(&mut self, fields: &Fields, name: &str) -> Option<String> {
        match fields.map.get(name) {
            None => {
                self.missing(fields, name);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.wrong_kind(fields, name, "a string", other);
                None
            }
        }
    }

    pub fn optional_str(&mut self, fields: &Fields, name: &str) -> Option<String> {
        match fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.wrong_kind(fields, name, "a string", other);
                None
            }
        }
    }

    pub fn optional_bool(&mut self, fields: &Fields, name: &str) -> Option<bool> {
        match fields.get(name)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.wrong_kind(fields, name, "a boolean", other);
                None
            }
        }
    }

    pub fn required_enum<V: Vocabulary>(&mut self, fields: &Fields, name: &str) -> Option<V> {
        let text = self.required_str(fields, name)?;
        self.parse_enum(fields, name, &text)
    }

    pub fn optional_enum<V: Vocabulary>(&mut self, fields: &Fields, name: &str) -> Option<V> {
        let text = self.optional_str(fields, name)?;
        self.parse_enum(fields, name, &text)
    }

    fn parse_enum<V: Vocabulary>(&mut self, fields: &Fields, name: &str, text: &str) -> Option<V> {
        let parsed = V::parse(text);
        if parsed.is_none() {
            self.report(ValidationError::structural(
                fields.child(name).path,
                format!(
                    "Invalid value '{}' for '{}' in {}: expected one of {}",
                    text,
                    name,
                    fields.model,
                    V::expected()
                ),
            ));
        }
        parsed
    }

    /// List value of a field; `min_len` is enforced when the list is present
    pub fn list<'f>(
        &mut self,
        fields: &'f Fields,
        name: &str,
        required: bool,
        min_len: usize,
    ) -> Option<&'f Vec<Value>> {
        let value = match fields.get(name) {
            Some(value) => value,
            None => {
                if required {
                    self.missing(fields, name);
                }
                return None;
            }
        };
        let items = match value.as_array() {
            Some(items) => items,
            None => {
                self.wrong_kind(fields, name, "a list", value);
                return None;
            }
        };
        if items.len() < min_len {
            self.report(ValidationError::structural(
                fields.child(name).path,
                format!(
                    "List '{}' in {} must contain at least {} item(s), found {}",
                    name,
                    fields.model,
                    min_len,
                    items.len()
                ),
            ));
            return None;
        }
        Some(items)
    }

    /// Build every item of a list field, reporting all item failures
    pub fn list_of<T, F>(
        &mut self,
        fields: &Fields,
        name: &str,
        required: bool,
        min_len: usize,
        mut build: F,
    ) -> Option<Vec<T>>
    where
        F: FnMut(&mut Self, &Value, &ValidationContext) -> Option<T>,
    {
        let items = self.list(fields, name, required, min_len)?;
        let list_ctx = fields.child(name);
        let mut built = Vec::with_capacity(items.len());
        let mut complete = true;
        for (index, item) in items.iter().enumerate() {
            match build(self, item, &list_ctx.child_index(index)) {
                Some(value) => built.push(value),
                None => complete = false,
            }
        }
        complete.then_some(built)
    }

    /// Non-empty list of strings
    pub fn string_list(
        &mut self,
        fields: &Fields,
        name: &str,
        required: bool,
        min_len: usize,
    ) -> Option<Vec<String>> {
        let model = fields.model;
        self.list_of(fields, name, required, min_len, |b, item, ctx| match item {
            Value::String(s) => Some(s.clone()),
            other => {
                b.report(ValidationError::structural(
                    ctx.path.clone(),
                    format!(
                        "Items of '{}' in {} must be strings, found {}",
                        name,
                        model,
                        ValidationHelpers::value_kind(other)
                    ),
                ));
                None
            }
        })
    }

    /// Build a nested object field
    pub fn nested<T, F>(
        &mut self,
        fields: &Fields,
        name: &str,
        required: bool,
        build: F,
    ) -> Option<T>
    where
        F: FnOnce(&mut Self, &Value, &ValidationContext) -> Option<T>,
    {
        match fields.get(name) {
            Some(value) => build(self, value, &fields.child(name)),
            None => {
                if required {
                    self.missing(fields, name);
                }
                None
            }
        }
    }

    /// Fail once `ctx` is nested deeper than the configured maximum
    pub fn within_depth(&mut self, ctx: &ValidationContext) -> bool {
        match self.config.max_depth {
            Some(max) if ctx.depth >= max => {
                self.report(ValidationError::structural(
                    ctx.path.clone(),
                    format!(
                        "Expression too deep: nesting exceeds the maximum depth of {}",
                        max
                    ),
                ));
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, Resource};
    use serde_json::json;

    #[test]
    fn test_getters_collect_all_problems() {
        let config = ValidationConfig::default();
        let mut builder = ModelBuilder::new(&config);
        let value = json!({"resource_name": 12, "hasMeta": "yes"});

        let fields = builder
            .normalized::<Resource>(&value, &ValidationContext::root())
            .unwrap();
        assert!(builder.required_str(&fields, "resource_name").is_none());
        assert!(builder.required_str(&fields, "version").is_none());
        assert!(builder.optional_bool(&fields, "hasMeta").is_none());

        let errors = builder.into_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.errors[0].path, "$.resource_name");
        assert!(errors.errors[1].message.contains("'version' attribute is missing"));
    }

    #[test]
    fn test_enum_parsing_reports_expected_values() {
        let config = ValidationConfig::default();
        let mut builder = ModelBuilder::new(&config);
        let value = json!({"name": "id", "type": "int"});

        let fields = builder
            .normalized::<crate::model::Attribute>(&value, &ValidationContext::root())
            .unwrap();
        assert_eq!(builder.required_enum::<FieldType>(&fields, "type"), None);
        let errors = builder.into_errors();
        assert!(errors.errors[0].message.contains("'integer'"));
    }

    #[test]
    fn test_list_min_len() {
        let config = ValidationConfig::default();
        let mut builder = ModelBuilder::new(&config);
        let value = json!({"fields": []});

        let fields = builder
            .normalized::<Resource>(&value, &ValidationContext::root())
            .unwrap();
        assert!(builder.list(&fields, "fields", true, 1).is_none());
        assert!(builder.into_errors().errors[0].message.contains("at least 1"));
    }

    #[test]
    fn test_finish_without_value_or_errors() {
        let config = ValidationConfig::default();
        let builder = ModelBuilder::new(&config);
        assert!(builder.finish::<()>(None).is_err());
    }

    #[test]
    fn test_within_depth() {
        let config = ValidationConfig::default().with_max_depth(2);
        let mut builder = ModelBuilder::new(&config);
        let ctx = ValidationContext::root().descend("a");
        assert!(builder.within_depth(&ctx));
        assert!(!builder.within_depth(&ctx.descend("b")));
        assert!(builder.into_errors().errors[0].message.contains("Expression too deep"));
    }
}
