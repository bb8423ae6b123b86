//! RRMS Schemas - models and semantic validators for resource mapping specifications
//!
//! An RRMS specification describes an API resource and how its attributes map
//! onto relational tables. This crate turns a raw key-value tree into a
//! strongly-typed, validated model, or reports every problem it finds.
//!
//! ## Features
//!
//! - **Field normalization**: case-insensitive field names, "did you mean"
//!   suggestions for likely typos, rejection of unknown fields
//! - **Typed models**: resources, mappers and the recursive expression tree
//!   used to derive database attributes
//! - **Cross-object rules**: name identity, bidirectional attribute coverage,
//!   group-by consistency and default-sort references
//! - **Aggregated reporting**: each validation call returns every violation
//!   with its kind, path and suggestion
//!
//! ## Quick Start
//!
//! ```rust
//! use rrms_schemas::{MappingSpecValidator, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = MappingSpecValidator::new();
//! let spec = json!({
//!     "resource": {
//!         "resource_name": "fill",
//!         "version": "1.0.0",
//!         "fields": [{"name": "id", "type": "integer", "isKey": true}]
//!     },
//!     "resourceToDbMapper": {
//!         "resource_name": "fill",
//!         "masterTable": "fills",
//!         "dbSchema": "runs",
//!         "fields": [{"attNamedb": "fill_id", "attNameResource": "id"}],
//!         "pagination": "enabled",
//!         "rowCounting": "enabled"
//!     }
//! });
//!
//! match validator.validate(&spec) {
//!     Ok(spec) => println!("Valid mapping for {}", spec.resource.resource_name),
//!     Err(e) => println!("Validation error: {}", e),
//! }
//! ```
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

pub mod model;
pub mod normalize;
pub mod validation;

// Re-export commonly used types for convenience
pub use model::{Resource, ResourceSpec, ResourceToDbMapper, ResourceToDbMappingSpec};
pub use normalize::{FieldNormalizer, FieldSchema};
pub use validation::{
    cross_validate, validate_mapper, validate_mapping_spec, validate_mapping_specs_batch,
    validate_resource, validate_resource_spec, ErrorKind, MapperValidator, MappingSpecValidator,
    ResourceValidator, SchemaValidator, SpecError, SpecResult, ValidationConfig,
    ValidationContext, ValidationError, ValidationErrors, ValidationHelpers,
};
