//! Property-based tests for normalization and validation
//!
//! These tests verify that the normalizer and validators behave correctly
//! across a wide range of inputs.

use proptest::prelude::*;
use rrms_schemas::model::{ComparisonOperator, FieldType, Resource, Vocabulary};
use rrms_schemas::{
    validate_resource, ErrorKind, FieldNormalizer, FieldSchema, MappingSpecValidator,
    SchemaValidator, ValidationConfig, ValidationContext,
};
use serde_json::{json, Map, Value};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,50}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        10, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map(
                    prop_oneof![
                        Just("resource".to_string()),
                        Just("resourceToDbMapper".to_string()),
                        Just("fields".to_string()),
                        "[a-zA-Z_][a-zA-Z0-9_]{0,20}",
                    ],
                    inner,
                    0..5
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Strategy for a canonical Resource field name written in random case
fn case_variant_strategy() -> impl Strategy<Value = (&'static str, String)> {
    (
        proptest::sample::select(Resource::FIELDS),
        proptest::collection::vec(any::<bool>(), 32),
    )
        .prop_map(|(field, upper)| {
            let variant = field
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
                .collect();
            (field, variant)
        })
}

/// Strategy for attributes where `key` selects the identifier, if any
fn resource_strategy() -> impl Strategy<Value = (Value, bool)> {
    (1usize..8).prop_flat_map(|len| {
        (
            proptest::collection::vec(
                (
                    "[a-z][a-z0-9_]{0,12}",
                    proptest::sample::select(FieldType::ALL),
                ),
                len,
            ),
            proptest::option::of(0..len),
        )
            .prop_map(|(attributes, key)| {
                let fields: Vec<Value> = attributes
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, field_type))| {
                        json!({"name": name, "type": field_type.as_str(), "isKey": key == Some(i)})
                    })
                    .collect();
                (
                    json!({"resource_name": "generated", "version": "1", "fields": fields}),
                    key.is_some(),
                )
            })
    })
}

proptest! {
    #[test]
    fn prop_case_variants_normalize_to_canonical((field, variant) in case_variant_strategy()) {
        let normalizer = FieldNormalizer::default();
        let mut input = Map::new();
        input.insert(variant, json!(1));

        let out = normalizer
            .normalize::<Resource>(&input, &ValidationContext::root())
            .unwrap();
        prop_assert_eq!(out.keys().collect::<Vec<_>>(), vec![field]);
    }

    #[test]
    fn prop_normalization_is_idempotent(
        variants in proptest::collection::vec(case_variant_strategy(), 0..4)
    ) {
        let normalizer = FieldNormalizer::default();
        let ctx = ValidationContext::root();
        let mut input = Map::new();
        for (field, variant) in variants {
            // One spelling per canonical field, duplicates are rejected
            if !input.keys().any(|k: &String| k.eq_ignore_ascii_case(field)) {
                input.insert(variant, json!(field));
            }
        }

        let once = normalizer.normalize::<Resource>(&input, &ctx).unwrap();
        let twice = normalizer.normalize::<Resource>(&once, &ctx).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_single_deletion_is_suggested(
        field in proptest::sample::select(Resource::FIELDS),
        position in any::<proptest::sample::Index>()
    ) {
        let mut typo: String = field.to_string();
        typo.remove(position.index(field.len()));

        let normalizer = FieldNormalizer::default();
        let mut input = Map::new();
        input.insert(typo, json!(1));

        let errors = normalizer
            .normalize::<Resource>(&input, &ValidationContext::root())
            .unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].suggestion.as_deref(), Some(field));
        prop_assert!(errors[0].message.contains("Did you mean"));
    }

    #[test]
    fn prop_resource_valid_iff_key_attribute((resource, has_key) in resource_strategy()) {
        let result = validate_resource(&resource, &ValidationConfig::default());
        if has_key {
            prop_assert!(result.is_ok(), "expected valid resource: {:?}", result);
        } else {
            let error = result.unwrap_err();
            prop_assert_eq!(error.violations().len(), 1);
            prop_assert_eq!(error.violations()[0].kind, ErrorKind::MissingIdentifier);
        }
    }

    #[test]
    fn prop_arbitrary_documents_never_panic(document in json_value_strategy()) {
        let validator = MappingSpecValidator::new();
        if let Err(error) = validator.validate(&document) {
            // Every failure is either fatal or carries at least one violation
            prop_assert!(error.is_fatal() || !error.violations().is_empty());
        }
    }

    #[test]
    fn prop_comparison_operators_round_trip(op in proptest::sample::select(ComparisonOperator::ALL)) {
        prop_assert_eq!(ComparisonOperator::parse(op.as_str()), Some(op));
    }
}
