//! Resource definitions: the API-facing entity and its attributes
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

use crate::field_schema;
use crate::model::enums::FieldType;
use serde::Serialize;

/// Display and query metadata of an attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

field_schema!(MetaData, "MetaData", ["title", "description", "searchable", "sortable", "units"]);

/// Named, typed attribute of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "isKey", skip_serializing_if = "Option::is_none")]
    pub is_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaData>,
}

field_schema!(Attribute, "Attribute", ["name", "type", "isKey", "meta"]);

impl Attribute {
    pub fn is_key(&self) -> bool {
        self.is_key == Some(true)
    }
}

/// Domain entity exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub resource_name: String,
    pub version: String,
    #[serde(rename = "hasMeta", skip_serializing_if = "Option::is_none")]
    pub has_meta: Option<bool>,
    pub fields: Vec<Attribute>,
}

field_schema!(Resource, "Resource", ["resource_name", "version", "hasMeta", "fields"]);

impl Resource {
    /// Attributes marked as identifiers
    pub fn key_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.fields.iter().filter(|a| a.is_key())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.fields.iter().find(|a| a.name == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|a| a.name.as_str())
    }
}

/// Document holding a resource definition only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSpec {
    pub resource: Resource,
}

field_schema!(ResourceSpec, "ResourceMappingSpec", ["resource"]);
