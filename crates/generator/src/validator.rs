//! `request-validator` plugin synthesis
//!
//! A `request-validator` entry travels through the scopes as an opaque
//! config; at operation scope it is completed from the OAS parameters and
//! request body, re-identified, and inserted back into the plugin list.
//! Referenced component schemas are inlined into a `definitions` map so
//! the emitted JSON schema is self-contained.

use crate::plugins::plugin_id;
use openapi2kong_common::{ConversionError, JsonObject, Result};
use openapi2kong_parser::{AdditionalProperties, OasDocument, Operation, Schema};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

const VALIDATOR_PLUGIN_NAME: &str = "request-validator";
const SCHEMA_DRAFT: &str = "draft4";
const SCHEMAS_REF_PREFIX: &str = "#/components/schemas/";

/// Remove the `request-validator` entry from the plugin list.
///
/// Returns the removed config, or a copy of `current` when the list has
/// none, so the caller always holds the innermost declared config.
pub fn take_validator(
    list: &mut Vec<JsonObject>,
    current: Option<&JsonObject>,
) -> Option<JsonObject> {
    if let Some(position) = list
        .iter()
        .position(|plugin| plugin.get("name").and_then(Value::as_str) == Some(VALIDATOR_PLUGIN_NAME))
    {
        return Some(list.remove(position));
    }
    current.cloned()
}

/// Generate the operation-scoped validator plugin.
///
/// The plugin gets a fresh id for `base_name` and a config completed from
/// the operation: `parameter_schema`, `body_schema`, and
/// `allowed_content_types`, each only when not already set by the user.
/// Returns `None` when there is nothing to validate.
pub fn generate_validator(
    source: Option<&JsonObject>,
    doc: &OasDocument,
    operation: &Operation,
    uuid_namespace: &Uuid,
    base_name: &str,
) -> Result<Option<JsonObject>> {
    let Some(source) = source else {
        return Ok(None);
    };

    let mut plugin = source.clone();
    plugin.insert(
        "id".to_string(),
        Value::String(plugin_id(uuid_namespace, base_name, &plugin)),
    );

    let mut config = match plugin.get("config") {
        Some(Value::Object(map)) => map.clone(),
        _ => JsonObject::new(),
    };

    if !config.contains_key("parameter_schema") {
        if let Some(entries) = parameter_schema(doc, operation)? {
            config.insert("parameter_schema".to_string(), Value::Array(entries));
            config.insert(
                "version".to_string(),
                Value::String(SCHEMA_DRAFT.to_string()),
            );
        }
    }

    if !config.contains_key("body_schema") {
        if let Some(schema) = body_schema(doc, operation)? {
            config.insert("body_schema".to_string(), Value::String(schema));
            config.insert(
                "version".to_string(),
                Value::String(SCHEMA_DRAFT.to_string()),
            );
        } else if !config.contains_key("parameter_schema") {
            // neither parameter nor body schema; only the content-type
            // check can still make the plugin worthwhile
            if !config.contains_key("allowed_content_types")
                && content_types(doc, operation)?.is_none()
            {
                return Ok(None);
            }
            // an empty schema passes everything but activates the
            // content-type check
            config.insert("body_schema".to_string(), Value::String("{}".to_string()));
            config.insert(
                "version".to_string(),
                Value::String(SCHEMA_DRAFT.to_string()),
            );
        }
    }

    if !config.contains_key("allowed_content_types") {
        if let Some(types) = content_types(doc, operation)? {
            config.insert(
                "allowed_content_types".to_string(),
                Value::Array(types.into_iter().map(Value::String).collect()),
            );
        }
    }

    plugin.insert("config".to_string(), Value::Object(config));
    Ok(Some(plugin))
}

/// One `parameter_schema` entry per OAS parameter, or `None` when the
/// operation declares none.
fn parameter_schema(doc: &OasDocument, operation: &Operation) -> Result<Option<Vec<Value>>> {
    if operation.parameters.is_empty() {
        return Ok(None);
    }

    let mut entries = Vec::with_capacity(operation.parameters.len());
    for parameter_ref in &operation.parameters {
        let parameter = doc.resolve_parameter(parameter_ref)?;

        let mut entry = JsonObject::new();
        entry.insert(
            "explode".to_string(),
            Value::Bool(parameter.explode.unwrap_or(false)),
        );
        entry.insert("in".to_string(), Value::String(parameter.location.clone()));
        entry.insert("name".to_string(), Value::String(parameter.name.clone()));
        entry.insert("required".to_string(), Value::Bool(parameter.required));
        entry.insert(
            "style".to_string(),
            Value::String(parameter_style(
                parameter.style.as_deref(),
                &parameter.location,
            )),
        );
        if let Some(schema) = extract_schema(doc, parameter.schema.as_ref())? {
            entry.insert("schema".to_string(), Value::String(schema));
        }

        entries.push(Value::Object(entry));
    }

    Ok(Some(entries))
}

/// Default styles per OAS parameter location.
fn parameter_style(given: Option<&str>, location: &str) -> String {
    match given {
        Some(style) => style.to_string(),
        None => match location {
            "header" | "path" => "simple",
            "cookie" | "query" => "form",
            _ => "",
        }
        .to_string(),
    }
}

/// JSON schema of the first `application/json` request body content type,
/// or `None` when there is none.
fn body_schema(doc: &OasDocument, operation: &Operation) -> Result<Option<String>> {
    let Some(body_ref) = &operation.request_body else {
        return Ok(None);
    };
    let body = doc.resolve_request_body(body_ref)?;

    for (content_type, media) in &body.content {
        if content_type.to_lowercase().contains("application/json") {
            return extract_schema(doc, media.schema.as_ref());
        }
    }

    Ok(None)
}

/// Allowed content types, sorted by name; `None` when the operation has no
/// request body content.
fn content_types(doc: &OasDocument, operation: &Operation) -> Result<Option<Vec<String>>> {
    let Some(body_ref) = &operation.request_body else {
        return Ok(None);
    };
    let body = doc.resolve_request_body(body_ref)?;

    if body.content.is_empty() {
        return Ok(None);
    }
    // BTreeMap keys come out sorted
    Ok(Some(body.content.keys().cloned().collect()))
}

/// Extract a schema, including all referenced component schemas, as a
/// single self-contained JSON schema string.
///
/// Every `#/components/schemas/X` target is inlined under `definitions`
/// and the references are rewritten to `#/definitions/X`.
pub fn extract_schema(doc: &OasDocument, schema: Option<&Schema>) -> Result<Option<String>> {
    let Some(schema) = schema else {
        return Ok(None);
    };

    let mut visited = BTreeSet::new();
    let mut definitions: BTreeMap<String, &Schema> = BTreeMap::new();
    collect_definitions(doc, schema, &mut visited, &mut definitions)?;

    let mut value = serde_json::to_value(schema)?;
    if !definitions.is_empty() {
        let mut defs = JsonObject::new();
        for (name, definition) in definitions {
            defs.insert(name, serde_json::to_value(definition)?);
        }
        if let Value::Object(map) = &mut value {
            map.insert("definitions".to_string(), Value::Object(defs));
        }
    }

    rewrite_refs(&mut value);
    Ok(Some(serde_json::to_string(&value)?))
}

/// Walk the schema tree collecting every referenced component schema.
///
/// The visited set is keyed by the `$ref` string, which keeps reference
/// cycles finite.
fn collect_definitions<'a>(
    doc: &'a OasDocument,
    schema: &'a Schema,
    visited: &mut BTreeSet<String>,
    definitions: &mut BTreeMap<String, &'a Schema>,
) -> Result<()> {
    if let Some(reference) = &schema.reference {
        let name = reference.strip_prefix(SCHEMAS_REF_PREFIX).ok_or_else(|| {
            ConversionError::Ref(format!(
                "schema references must be at '{SCHEMAS_REF_PREFIX}...', got '{reference}'"
            ))
        })?;

        if !visited.insert(reference.clone()) {
            return Ok(());
        }

        let target = doc
            .schema(name)
            .ok_or_else(|| ConversionError::Ref(format!("reference '{reference}' not found")))?;
        definitions.insert(name.to_string(), target);
        collect_definitions(doc, target, visited, definitions)?;
    }

    for sub in schema
        .all_of
        .iter()
        .chain(&schema.any_of)
        .chain(&schema.one_of)
    {
        collect_definitions(doc, sub, visited, definitions)?;
    }
    for sub in schema.properties.values() {
        collect_definitions(doc, sub, visited, definitions)?;
    }
    if let Some(sub) = &schema.not {
        collect_definitions(doc, sub, visited, definitions)?;
    }
    if let Some(sub) = &schema.items {
        collect_definitions(doc, sub, visited, definitions)?;
    }
    if let Some(AdditionalProperties::Schema(sub)) = schema.additional_properties.as_deref() {
        collect_definitions(doc, sub, visited, definitions)?;
    }

    Ok(())
}

/// Rewrite `#/components/schemas/X` references to `#/definitions/X`
/// throughout the value tree.
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(pointer) = entry {
                        if let Some(name) = pointer.strip_prefix(SCHEMAS_REF_PREFIX) {
                            *pointer = format!("#/definitions/{name}");
                        }
                    }
                } else {
                    rewrite_refs(entry);
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                rewrite_refs(entry);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with(paths_and_components: serde_json::Value) -> OasDocument {
        let mut doc = json!({
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"}
        });
        if let (Value::Object(target), Value::Object(extra)) =
            (&mut doc, paths_and_components)
        {
            target.extend(extra);
        }
        openapi2kong_parser::from_json(&doc.to_string()).unwrap()
    }

    fn get_operation<'a>(doc: &'a OasDocument, path: &str) -> &'a Operation {
        doc.paths[path].get.as_ref().unwrap()
    }

    fn validator_source() -> JsonObject {
        serde_json::from_value(json!({"name": "request-validator"})).unwrap()
    }

    #[test]
    fn test_parameter_styles_default_per_location() {
        assert_eq!(parameter_style(None, "query"), "form");
        assert_eq!(parameter_style(None, "cookie"), "form");
        assert_eq!(parameter_style(None, "header"), "simple");
        assert_eq!(parameter_style(None, "path"), "simple");
        assert_eq!(parameter_style(Some("matrix"), "path"), "matrix");
    }

    #[test]
    fn test_required_query_parameter() {
        let doc = doc_with(json!({
            "paths": {
                "/search": {
                    "get": {
                        "parameters": [
                            {"name": "q", "in": "query", "required": true}
                        ]
                    }
                }
            }
        }));
        let operation = get_operation(&doc, "/search");

        let plugin = generate_validator(
            Some(&validator_source()),
            &doc,
            operation,
            &Uuid::NAMESPACE_DNS,
            "t_search_get",
        )
        .unwrap()
        .expect("parameters must produce a validator");

        let config = plugin["config"].as_object().unwrap();
        let entry = &config["parameter_schema"][0];
        assert_eq!(entry["in"], "query");
        assert_eq!(entry["name"], "q");
        assert_eq!(entry["required"], true);
        assert_eq!(entry["explode"], false);
        assert_eq!(entry["style"], "form");
        assert_eq!(config["version"], "draft4");
        assert!(!entry.as_object().unwrap().contains_key("schema"));
    }

    #[test]
    fn test_nothing_to_validate_produces_no_plugin() {
        let doc = doc_with(json!({
            "paths": {"/ping": {"get": {}}}
        }));
        let operation = get_operation(&doc, "/ping");

        let plugin = generate_validator(
            Some(&validator_source()),
            &doc,
            operation,
            &Uuid::NAMESPACE_DNS,
            "t_ping_get",
        )
        .unwrap();
        assert!(plugin.is_none());
    }

    #[test]
    fn test_no_source_config_produces_no_plugin() {
        let doc = doc_with(json!({
            "paths": {
                "/search": {
                    "get": {
                        "parameters": [{"name": "q", "in": "query"}]
                    }
                }
            }
        }));
        let operation = get_operation(&doc, "/search");

        let plugin =
            generate_validator(None, &doc, operation, &Uuid::NAMESPACE_DNS, "t").unwrap();
        assert!(plugin.is_none());
    }

    #[test]
    fn test_content_types_without_schema_get_empty_body_schema() {
        let doc = doc_with(json!({
            "paths": {
                "/upload": {
                    "get": {
                        "requestBody": {
                            "content": {
                                "text/plain": {},
                                "application/xml": {}
                            }
                        }
                    }
                }
            }
        }));
        let operation = get_operation(&doc, "/upload");

        let plugin = generate_validator(
            Some(&validator_source()),
            &doc,
            operation,
            &Uuid::NAMESPACE_DNS,
            "t_upload_get",
        )
        .unwrap()
        .expect("content types must keep the plugin alive");

        let config = plugin["config"].as_object().unwrap();
        assert_eq!(config["body_schema"], "{}");
        assert_eq!(
            config["allowed_content_types"],
            json!(["application/xml", "text/plain"])
        );
    }

    #[test]
    fn test_body_schema_inlines_definitions() {
        let doc = doc_with(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Pet"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {
                            "owner": {"$ref": "#/components/schemas/Owner"}
                        }
                    },
                    "Owner": {"type": "string"}
                }
            }
        }));
        let operation = get_operation(&doc, "/pets");

        let plugin = generate_validator(
            Some(&validator_source()),
            &doc,
            operation,
            &Uuid::NAMESPACE_DNS,
            "t_pets_get",
        )
        .unwrap()
        .expect("a body schema must produce a validator");

        let config = plugin["config"].as_object().unwrap();
        let schema: Value =
            serde_json::from_str(config["body_schema"].as_str().unwrap()).unwrap();
        assert_eq!(schema["$ref"], "#/definitions/Pet");
        assert_eq!(
            schema["definitions"]["Pet"]["properties"]["owner"]["$ref"],
            "#/definitions/Owner"
        );
        assert_eq!(schema["definitions"]["Owner"]["type"], "string");
        assert_eq!(config["version"], "draft4");
    }

    #[test]
    fn test_schema_extraction_is_cycle_safe() {
        let doc = doc_with(json!({
            "components": {
                "schemas": {
                    "Node": {
                        "type": "object",
                        "properties": {
                            "next": {"$ref": "#/components/schemas/Node"}
                        }
                    }
                }
            }
        }));

        let root = Schema {
            reference: Some("#/components/schemas/Node".to_string()),
            ..Schema::default()
        };
        let schema = extract_schema(&doc, Some(&root)).unwrap().unwrap();
        let value: Value = serde_json::from_str(&schema).unwrap();
        assert_eq!(
            value["definitions"]["Node"]["properties"]["next"]["$ref"],
            "#/definitions/Node"
        );
    }

    #[test]
    fn test_missing_schema_reference_is_an_error() {
        let doc = doc_with(json!({}));
        let root = Schema {
            reference: Some("#/components/schemas/Missing".to_string()),
            ..Schema::default()
        };
        let err = extract_schema(&doc, Some(&root)).unwrap_err();
        assert!(matches!(err, ConversionError::Ref(_)));
    }

    #[test]
    fn test_user_config_is_not_overwritten() {
        let doc = doc_with(json!({
            "paths": {
                "/search": {
                    "get": {
                        "parameters": [{"name": "q", "in": "query"}]
                    }
                }
            }
        }));
        let operation = get_operation(&doc, "/search");

        let source: JsonObject = serde_json::from_value(json!({
            "name": "request-validator",
            "config": {"parameter_schema": [{"name": "custom"}]}
        }))
        .unwrap();

        let plugin = generate_validator(
            Some(&source),
            &doc,
            operation,
            &Uuid::NAMESPACE_DNS,
            "t_search_get",
        )
        .unwrap()
        .unwrap();

        let config = plugin["config"].as_object().unwrap();
        assert_eq!(config["parameter_schema"][0]["name"], "custom");
    }

    #[test]
    fn test_take_validator_falls_back_to_current() {
        let mut list = vec![validator_source()];
        let taken = take_validator(&mut list, None);
        assert!(taken.is_some());
        assert!(list.is_empty());

        let inherited = validator_source();
        let mut other: Vec<JsonObject> =
            vec![serde_json::from_value(json!({"name": "key-auth"})).unwrap()];
        let taken = take_validator(&mut other, Some(&inherited));
        assert_eq!(taken, Some(inherited));
        assert_eq!(other.len(), 1);
    }
}
