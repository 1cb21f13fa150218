//! OpenAPI 3.x type definitions
//!
//! Simplified representation focusing on what the Kong conversion reads:
//! servers, paths, operations, parameters, request bodies, schemas, and the
//! `x-kong-*` vendor extensions. Unknown keys on extension-bearing nodes are
//! captured verbatim through flattened maps.

use openapi2kong_common::{ConversionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vendor extensions (`x-...` keys) and any other keys not modeled here.
pub type Extensions = serde_json::Map<String, serde_json::Value>;

/// OpenAPI document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OasDocument {
    /// OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    /// API metadata
    pub info: Info,

    /// Document-level servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// API paths; `BTreeMap` so iteration is in ascending path order
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Document-level extensions (`x-kong-name`, `x-kong-tags`, ...)
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// API information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// API title; the fallback document base name
    pub title: String,

    /// API version
    pub version: String,

    /// API description
    #[serde(default)]
    pub description: Option<String>,
}

/// Server entry of a `servers` block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Server URL, possibly containing `{variable}` templates
    pub url: String,

    /// Server description
    #[serde(default)]
    pub description: Option<String>,

    /// Template variables for `url`
    #[serde(default)]
    pub variables: BTreeMap<String, ServerVariable>,
}

/// Server URL template variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVariable {
    /// Substitution value; a missing default renders as the empty string
    #[serde(default)]
    pub default: String,

    /// Allowed values
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,

    /// Variable description
    #[serde(default)]
    pub description: Option<String>,
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub trace: Option<Operation>,

    /// Path-level servers, overriding the document block when non-empty
    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Path-level extensions (`x-kong-name`, defaults, plugins)
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// Operations present on this path, keyed by uppercase HTTP method.
    ///
    /// The pairs come back in ascending method order, which the output
    /// determinism rules require.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        let mut ops = Vec::new();
        for (method, operation) in [
            ("DELETE", &self.delete),
            ("GET", &self.get),
            ("HEAD", &self.head),
            ("OPTIONS", &self.options),
            ("PATCH", &self.patch),
            ("POST", &self.post),
            ("PUT", &self.put),
            ("TRACE", &self.trace),
        ] {
            if let Some(operation) = operation {
                ops.push((method, operation));
            }
        }
        ops
    }
}

/// HTTP operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(rename = "operationId", default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Parameters (query, header, path, cookie)
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,

    /// Request body
    #[serde(rename = "requestBody", default)]
    pub request_body: Option<RefOr<RequestBody>>,

    /// Operation-level servers, overriding the path block when non-empty
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Operation-level extensions
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A value or a `$ref` to one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// Reference to a component
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },

    /// Inline value
    Item(T),
}

/// Parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Required flag
    #[serde(default)]
    pub required: bool,

    /// Serialization style; defaulted per location when absent
    #[serde(default)]
    pub style: Option<String>,

    /// Explode flag; treated as false when absent
    #[serde(default)]
    pub explode: Option<bool>,

    /// Parameter schema
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    /// Content per media type; `BTreeMap` so "first `application/json`
    /// entry" is well-defined
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,

    /// Required flag
    #[serde(default)]
    pub required: bool,
}

/// Media type entry of a request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Schema definition
///
/// Only the keywords the schema extractor walks are typed; everything else
/// (`type`, `format`, `enum`, `required`, ...) passes through `extra`
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    /// Items schema (for array type)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Properties (for object type)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<AdditionalProperties>>,

    /// Remaining schema keywords, passed through verbatim
    #[serde(flatten)]
    pub extra: Extensions,
}

/// `additionalProperties` is either a flag or a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Flag(bool),
    Schema(Schema),
}

/// Reusable components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    /// Schemas
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,

    /// Parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,

    /// Request bodies
    #[serde(rename = "requestBodies", default)]
    pub request_bodies: BTreeMap<String, RequestBody>,

    /// Component-level extensions; holds the `x-kong` object
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl OasDocument {
    /// Get a schema from `#/components/schemas/` by bare name.
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.components.as_ref().and_then(|c| c.schemas.get(name))
    }

    /// Resolve a parameter, following a `$ref` into
    /// `#/components/parameters/`.
    pub fn resolve_parameter<'a>(&'a self, param: &'a RefOr<Parameter>) -> Result<&'a Parameter> {
        match param {
            RefOr::Item(parameter) => Ok(parameter),
            RefOr::Reference { reference } => {
                let name = reference
                    .strip_prefix("#/components/parameters/")
                    .ok_or_else(|| {
                        ConversionError::Ref(format!(
                            "parameter references must be at '#/components/parameters/...', got '{reference}'"
                        ))
                    })?;
                self.components
                    .as_ref()
                    .and_then(|c| c.parameters.get(name))
                    .ok_or_else(|| {
                        ConversionError::Ref(format!("reference '{reference}' not found"))
                    })
            }
        }
    }

    /// Resolve a request body, following a `$ref` into
    /// `#/components/requestBodies/`.
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a RefOr<RequestBody>,
    ) -> Result<&'a RequestBody> {
        match body {
            RefOr::Item(request_body) => Ok(request_body),
            RefOr::Reference { reference } => {
                let name = reference
                    .strip_prefix("#/components/requestBodies/")
                    .ok_or_else(|| {
                        ConversionError::Ref(format!(
                            "request body references must be at '#/components/requestBodies/...', got '{reference}'"
                        ))
                    })?;
                self.components
                    .as_ref()
                    .and_then(|c| c.request_bodies.get(name))
                    .ok_or_else(|| {
                        ConversionError::Ref(format!("reference '{reference}' not found"))
                    })
            }
        }
    }
}
