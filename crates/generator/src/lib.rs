//! Kong declarative configuration generation
//!
//! This crate turns a parsed OpenAPI 3.x document into a Kong declarative
//! configuration: one service per scope that needs one, an upstream where
//! the servers block calls for it, one route per operation, and plugin
//! lists inherited across document, path, and operation scopes.
//!
//! Output is deterministic: paths and methods are walked in ascending
//! order, plugin lists are sorted by name, and every entity id is a UUIDv5
//! over its scope base name.
//!
//! ## Usage
//! ```rust,ignore
//! use openapi2kong_generator::{convert, Oas2KongOptions};
//!
//! let doc = openapi2kong_parser::from_slice(&bytes)?;
//! let kong = convert(&doc, &Oas2KongOptions::default())?;
//! ```

mod convert;
mod extensions;
mod plugins;
mod routes;
mod servers;
mod service;
mod slug;
mod validator;

pub use plugins::{insert_plugin, plugins_list};
pub use routes::{create_route, rewrite_path};
pub use servers::{apply_defaults, parse_servers, ServerTarget};
pub use service::create_service;
pub use slug::slugify;
pub use validator::extract_schema;

use openapi2kong_common::{JsonObject, Result};
use openapi2kong_parser::OasDocument;
use serde_json::Value;
use uuid::Uuid;

/// Options for an OAS → Kong conversion.
#[derive(Debug, Clone)]
pub struct Oas2KongOptions {
    /// Tags to mark all generated entities with; `None` falls back to the
    /// document's `x-kong-tags`
    pub tags: Option<Vec<String>>,

    /// Base document name, overriding `x-kong-name` and `info.title`
    /// (feeds UUID generation)
    pub doc_name: Option<String>,

    /// Namespace for UUIDv5 generation
    pub uuid_namespace: Uuid,
}

impl Default for Oas2KongOptions {
    fn default() -> Self {
        Self {
            tags: None,
            doc_name: None,
            uuid_namespace: Uuid::NAMESPACE_DNS,
        }
    }
}

/// Convert a parsed OAS document to a Kong declarative configuration.
pub fn convert(doc: &OasDocument, options: &Oas2KongOptions) -> Result<JsonObject> {
    convert::Converter::run(doc, options)
}

/// Convert raw OAS bytes (JSON or YAML) to a Kong declarative
/// configuration.
pub fn convert_slice(content: &[u8], options: &Oas2KongOptions) -> Result<JsonObject> {
    let doc = openapi2kong_parser::from_slice(content)?;
    convert(&doc, options)
}

pub(crate) fn uuid_v5(namespace: &Uuid, name: &str) -> String {
    Uuid::new_v5(namespace, name.as_bytes()).to_string()
}

pub(crate) fn tags_value(tags: &[String]) -> Value {
    Value::Array(tags.iter().cloned().map(Value::String).collect())
}
