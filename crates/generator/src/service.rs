//! Kong service and upstream construction

use crate::servers::{apply_defaults, parse_servers};
use crate::slug::slugify;
use crate::{tags_value, uuid_v5};
use openapi2kong_common::{JsonObject, Result};
use openapi2kong_parser::Server;
use serde_json::Value;
use uuid::Uuid;

/// Create a Kong service entity and, when required, its upstream.
///
/// `base_name` becomes the slugified service name and the UUIDv5 input.
/// An upstream is created iff upstream defaults are provided or the
/// servers block resolves to more than one target; otherwise the service
/// points straight at the single resolved host.
pub fn create_service(
    base_name: &str,
    servers: &[Server],
    service_defaults: Option<&JsonObject>,
    upstream_defaults: Option<&JsonObject>,
    tags: &[String],
    uuid_namespace: &Uuid,
) -> Result<(JsonObject, Option<JsonObject>)> {
    // seed from the defaults, then overwrite the computed keys
    let mut service = service_defaults.cloned().unwrap_or_default();

    service.insert(
        "id".to_string(),
        Value::String(uuid_v5(uuid_namespace, &format!("{base_name}.service"))),
    );
    service.insert("name".to_string(), Value::String(slugify(&[base_name])));
    service.insert("tags".to_string(), tags_value(tags));
    service.insert("routes".to_string(), Value::Array(Vec::new()));
    service.insert("plugins".to_string(), Value::Array(Vec::new()));

    // a protocol declared in the defaults drives scheme inference
    let default_scheme = match service.get("protocol") {
        Some(Value::String(protocol)) => protocol.clone(),
        _ => "https".to_string(),
    };

    let targets = apply_defaults(parse_servers(servers)?, &default_scheme);
    let first = &targets[0];

    let scheme = first
        .scheme
        .clone()
        .unwrap_or_else(|| default_scheme.clone());
    let port = first.port.unwrap_or(if scheme == "https" { 443 } else { 80 });

    service.insert("protocol".to_string(), Value::String(scheme));
    service.insert("path".to_string(), Value::String(first.path.clone()));
    service.insert("port".to_string(), Value::Number(port.into()));

    // we need an upstream if;
    // a) upstream defaults are provided, or
    // b) there is more than one entry in the servers block
    if upstream_defaults.is_none() && targets.len() == 1 {
        let host = first.host.clone().unwrap_or_else(|| "localhost".to_string());
        service.insert("host".to_string(), Value::String(host));
        return Ok((service, None));
    }

    let upstream_name = format!("{base_name}.upstream");
    let mut upstream = upstream_defaults.cloned().unwrap_or_default();
    upstream.insert(
        "id".to_string(),
        Value::String(uuid_v5(uuid_namespace, &upstream_name)),
    );
    upstream.insert("name".to_string(), Value::String(upstream_name.clone()));
    upstream.insert("tags".to_string(), tags_value(tags));

    let upstream_targets: Vec<Value> = targets
        .iter()
        .map(|target| {
            let host = target.host.as_deref().unwrap_or("localhost");
            let port = target
                .port
                .unwrap_or(if target.scheme.as_deref() == Some("https") {
                    443
                } else {
                    80
                });
            let mut entry = JsonObject::new();
            entry.insert("target".to_string(), Value::String(format!("{host}:{port}")));
            entry.insert("tags".to_string(), tags_value(tags));
            Value::Object(entry)
        })
        .collect();
    upstream.insert("targets".to_string(), Value::Array(upstream_targets));

    service.insert("host".to_string(), Value::String(upstream_name));
    Ok((service, Some(upstream)))
}
