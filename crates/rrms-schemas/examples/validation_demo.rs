//! Validation demonstration example
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use rrms_schemas::{
    validate_mapping_specs_batch, MappingSpecValidator, SchemaValidator, ValidationConfig,
};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== RRMS Specification Validation Demo ===\n");

    demo_mapping_spec_validation()?;

    println!();

    demo_batch_validation();

    Ok(())
}

fn demo_mapping_spec_validation() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Mapping Specification Validation Demo ---");

    let validator = MappingSpecValidator::new();

    let valid_spec = json!({
        "resource": {
            "resource_name": "fill",
            "version": "1.0.0",
            "fields": [
                {"name": "id", "type": "integer", "isKey": true},
                {"name": "duration", "type": "timeinterval_int"}
            ]
        },
        "resourceToDbMapper": {
            "resource_name": "fill",
            "masterTable": "fills",
            "dbSchema": "cms",
            "fields": [
                {"attNamedb": "fill_number", "attNameResource": "id"},
                {
                    "attNameResource": "duration",
                    "expression": {
                        "operator": "subtract",
                        "left": {"table": "fills", "column": "end_time"},
                        "right": {"table": "fills", "column": "start_time"}
                    }
                }
            ],
            "defaultSort": {"fields": ["id"], "order": "desc"},
            "pagination": "enabled",
            "rowCounting": "enabled"
        }
    });

    println!("✅ Validating valid specification:");
    match validator.validate(&valid_spec) {
        Ok(spec) => println!("   Valid! {}", serde_json::to_string(&spec)?),
        Err(e) => println!("   Error: {}", e),
    }

    // Typo in a field name, unmapped attribute and unknown sort field
    let invalid_spec = json!({
        "resource": {
            "resource_name": "fill",
            "version": "1.0.0",
            "fields": [
                {"name": "id", "type": "integer", "isKey": true},
                {"name": "energy", "type": "double"}
            ]
        },
        "resourceToDbMapper": {
            "resource_name": "fill",
            "masterTabel": "fills",
            "dbSchema": "cms",
            "fields": [{"attNamedb": "fill_number", "attNameResource": "id"}],
            "pagination": "enabled",
            "rowCounting": "enabled"
        }
    });

    println!("\n❌ Validating specification with a typo:");
    match validator.validate(&invalid_spec) {
        Ok(_) => println!("   Unexpectedly valid!"),
        Err(e) => {
            for violation in e.violations() {
                println!("   [{}] {} at {}", violation.kind, violation.message, violation.path);
            }
        }
    }

    Ok(())
}

fn demo_batch_validation() {
    println!("--- Batch Validation Demo ---");

    let spec = |mapper_name: &str| {
        json!({
            "resource": {
                "resource_name": "run",
                "version": "1",
                "fields": [{"name": "run_number", "type": "biginteger", "isKey": true}]
            },
            "resourceToDbMapper": {
                "resource_name": mapper_name,
                "masterTable": "runs",
                "dbSchema": "cms",
                "fields": [{"attNamedb": "run_number", "attNameResource": "run_number"}],
                "pagination": "disabled",
                "rowCounting": "disabled"
            }
        })
    };
    let specs = vec![spec("run"), spec("era"), spec("run")];

    let config = ValidationConfig::default().with_fail_fast();
    let results = validate_mapping_specs_batch(&specs, &config);
    println!("🔍 Validated {} of {} documents (fail fast):", results.len(), specs.len());
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(_) => println!("   [{}] valid", i),
            Err(e) => println!("   [{}] {}", i, e),
        }
    }
}
