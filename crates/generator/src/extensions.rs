//! Readers for the `x-kong-*` vendor extensions
//!
//! Extensions may appear on the document, a path item, or an operation, and
//! may point into the `#/components/x-kong/` holder through `$ref`. Every
//! reader validates the JSON shape it expects; nothing is silently
//! defaulted on malformed input.

use openapi2kong_common::{ConversionError, JsonObject, Result};
use openapi2kong_parser::{Extensions, OasDocument};
use serde_json::Value;

const X_KONG_REF_PREFIX: &str = "#/components/x-kong/";

/// The `/components/x-kong` object, holding referenceable extension
/// objects. Absent means empty, so lookups further down are safe.
pub fn x_kong_components(doc: &OasDocument) -> Result<JsonObject> {
    let Some(components) = &doc.components else {
        return Ok(JsonObject::new());
    };
    match components.extensions.get("x-kong") {
        None => Ok(JsonObject::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ConversionError::Type(
            "expected '/components/x-kong' to be a JSON object".to_string(),
        )),
    }
}

/// The `x-kong-name` property, validated to be a string.
pub fn kong_name(extensions: &Extensions) -> Result<Option<String>> {
    match extensions.get("x-kong-name") {
        None => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        Some(_) => Err(ConversionError::Type(
            "expected 'x-kong-name' to be a string".to_string(),
        )),
    }
}

/// Tags to mark all generated entities with.
///
/// An explicit override wins; otherwise `x-kong-tags` is used, validated to
/// be an array of strings; otherwise the result is empty.
pub fn kong_tags(doc: &OasDocument, overriding: Option<&[String]>) -> Result<Vec<String>> {
    if let Some(tags) = overriding {
        return Ok(tags.to_vec());
    }

    match doc.extensions.get("x-kong-tags") {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| match value {
                Value::String(tag) => Ok(tag.clone()),
                _ => Err(ConversionError::Type(
                    "expected 'x-kong-tags' to be an array of strings".to_string(),
                )),
            })
            .collect(),
        Some(_) => Err(ConversionError::Type(
            "expected 'x-kong-tags' to be an array of strings".to_string(),
        )),
    }
}

/// Get extension `key` as a JSON object, dereferenced against the `x-kong`
/// components. Returns `None` when the extension is absent.
pub fn x_kong_object(
    extensions: &Extensions,
    key: &str,
    components: &JsonObject,
) -> Result<Option<JsonObject>> {
    let Some(value) = extensions.get(key) else {
        return Ok(None);
    };
    let Value::Object(object) = value else {
        return Err(ConversionError::Type(format!(
            "expected '{key}' to be a JSON object"
        )));
    };
    dereference(object, components).map(Some)
}

/// `x-kong-service-defaults` on a node.
pub fn service_defaults(
    extensions: &Extensions,
    components: &JsonObject,
) -> Result<Option<JsonObject>> {
    x_kong_object(extensions, "x-kong-service-defaults", components)
}

/// `x-kong-upstream-defaults` on a node.
pub fn upstream_defaults(
    extensions: &Extensions,
    components: &JsonObject,
) -> Result<Option<JsonObject>> {
    x_kong_object(extensions, "x-kong-upstream-defaults", components)
}

/// `x-kong-route-defaults` on a node.
pub fn route_defaults(
    extensions: &Extensions,
    components: &JsonObject,
) -> Result<Option<JsonObject>> {
    x_kong_object(extensions, "x-kong-route-defaults", components)
}

/// Resolve an extension object that may be a `$ref`.
///
/// References must point at `#/components/x-kong/...`; the pointer is
/// walked segment by segment, and every value along the way (including the
/// target) must be a JSON object.
fn dereference(object: &JsonObject, components: &JsonObject) -> Result<JsonObject> {
    let pointer = match object.get("$ref") {
        None => return Ok(object.clone()),
        Some(Value::String(pointer)) => pointer,
        Some(_) => {
            return Err(ConversionError::Ref(
                "expected '$ref' pointer to be a string".to_string(),
            ))
        }
    };

    if !pointer.starts_with(X_KONG_REF_PREFIX) {
        return Err(ConversionError::Ref(
            "all 'x-kong-...' references must be at '#/components/x-kong/...'".to_string(),
        ));
    }

    let mut path = String::from("#/components/x-kong");
    let mut current = components;
    // skip "#", "components", "x-kong"
    for segment in pointer.split('/').skip(3) {
        path = format!("{path}/{segment}");
        match current.get(segment) {
            None => {
                return Err(ConversionError::Ref(format!(
                    "reference '{pointer}' not found"
                )))
            }
            Some(Value::Object(next)) => current = next,
            Some(_) => {
                return Err(ConversionError::Ref(format!(
                    "expected '{path}' to be a JSON object"
                )))
            }
        }
    }

    Ok(current.clone())
}
