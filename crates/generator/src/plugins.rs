//! Plugin list construction and inheritance
//!
//! Plugin configs are declared through `x-kong-plugin-<name>` extensions.
//! Each scope builds its list by deep-copying the inherited one,
//! re-identifying every entry for the new scope, and overlaying the local
//! extensions. Lists stay sorted by plugin name.

use crate::extensions::x_kong_object;
use crate::{tags_value, uuid_v5};
use openapi2kong_common::{ConversionError, JsonObject, Result};
use openapi2kong_parser::Extensions;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

const PLUGIN_EXTENSION_PREFIX: &str = "x-kong-plugin-";

/// UUIDv5 id for a plugin config at the given scope.
///
/// The `name` key is always present by the time ids are computed.
pub(crate) fn plugin_id(uuid_namespace: &Uuid, base_name: &str, config: &JsonObject) -> String {
    let plugin_name = config.get("name").and_then(Value::as_str).unwrap_or_default();
    uuid_v5(uuid_namespace, &format!("{base_name}.plugin.{plugin_name}"))
}

/// Build the plugin list for a scope.
///
/// Inherited entries are deep-copied, re-identified against `base_name`,
/// and re-tagged; entries from the node's `x-kong-plugin-*` extensions
/// override inherited ones with the same name. The result is sorted
/// ascending by plugin name.
pub fn plugins_list(
    extensions: &Extensions,
    inherited: Option<&[JsonObject]>,
    uuid_namespace: &Uuid,
    base_name: &str,
    components: &JsonObject,
    tags: &[String],
) -> Result<Vec<JsonObject>> {
    let mut plugins: BTreeMap<String, JsonObject> = BTreeMap::new();

    if let Some(inherited) = inherited {
        for config in inherited {
            let Some(plugin_name) = config.get("name").and_then(Value::as_str) else {
                continue;
            };
            let mut copy = config.clone();
            copy.insert(
                "id".to_string(),
                Value::String(plugin_id(uuid_namespace, base_name, &copy)),
            );
            copy.insert("tags".to_string(), tags_value(tags));
            plugins.insert(plugin_name.to_string(), copy);
        }
    }

    for extension_name in extensions.keys() {
        let Some(plugin_name) = extension_name.strip_prefix(PLUGIN_EXTENSION_PREFIX) else {
            continue;
        };

        let mut config = x_kong_object(extensions, extension_name, components)?.unwrap_or_default();

        match config.get("name") {
            None => {
                config.insert(
                    "name".to_string(),
                    Value::String(plugin_name.to_string()),
                );
            }
            Some(Value::String(declared)) if declared == plugin_name => {}
            Some(Value::String(declared)) => {
                return Err(ConversionError::NameConflict(format!(
                    "extension '{extension_name}' specifies a different name than '{plugin_name}'; '{declared}'"
                )));
            }
            Some(_) => {
                return Err(ConversionError::Type(format!(
                    "expected 'name' of '{extension_name}' to be a string"
                )));
            }
        }

        config.insert(
            "id".to_string(),
            Value::String(plugin_id(uuid_namespace, base_name, &config)),
        );
        config.insert("tags".to_string(), tags_value(tags));

        plugins.insert(plugin_name.to_string(), config);
    }

    Ok(plugins.into_values().collect())
}

/// Insert a plugin into a list already sorted by name, keeping the order.
pub fn insert_plugin(list: &mut Vec<JsonObject>, plugin: JsonObject) {
    let plugin_name = plugin
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let position = list
        .iter()
        .position(|existing| {
            existing.get("name").and_then(Value::as_str).unwrap_or_default() > plugin_name.as_str()
        })
        .unwrap_or(list.len());

    list.insert(position, plugin);
}
