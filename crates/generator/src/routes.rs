//! Route construction and path-template rewriting

use crate::{tags_value, uuid_v5};
use openapi2kong_common::JsonObject;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

/// Rewrite `{name}` path templates into PCRE named captures.
///
/// `/pets/{id}` becomes `/pets/(?<id>[^#?/]+)`: a capture matches a single
/// segment, since '/', '?', and '#' can mark the end of one. Substitution
/// is left-to-right, one per occurrence; paths without templates pass
/// through unchanged.
pub fn rewrite_path(path: &str) -> String {
    let Ok(template) = Regex::new(r"\{([^}]+)\}") else {
        return path.to_string();
    };

    template
        .replace_all(path, |caps: &regex::Captures| {
            format!("(?<{}>[^#?/]+)", &caps[1])
        })
        .into_owned()
}

/// Construct the route entity for one operation.
///
/// The route is seeded from the effective route defaults, then carries the
/// operation's plugin list, the anchored regex path, and a single method.
pub fn create_route(
    base_name: &str,
    path: &str,
    method: &str,
    route_defaults: Option<&JsonObject>,
    plugins: Vec<JsonObject>,
    tags: &[String],
    uuid_namespace: &Uuid,
) -> JsonObject {
    let mut route = route_defaults.cloned().unwrap_or_default();

    route.insert(
        "plugins".to_string(),
        Value::Array(plugins.into_iter().map(Value::Object).collect()),
    );
    route.insert(
        "paths".to_string(),
        Value::Array(vec![Value::String(format!("~{}$", rewrite_path(path)))]),
    );
    route.insert(
        "id".to_string(),
        Value::String(uuid_v5(uuid_namespace, &format!("{base_name}.route"))),
    );
    route.insert("name".to_string(), Value::String(base_name.to_string()));
    route.insert(
        "methods".to_string(),
        Value::Array(vec![Value::String(method.to_string())]),
    );
    route.insert("tags".to_string(), tags_value(tags));
    route.insert("strip_path".to_string(), Value::Bool(false));

    route
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_single_template() {
        assert_eq!(rewrite_path("/pets/{id}"), "/pets/(?<id>[^#?/]+)");
    }

    #[test]
    fn test_rewrite_multiple_templates() {
        assert_eq!(
            rewrite_path("/owners/{owner}/pets/{id}"),
            "/owners/(?<owner>[^#?/]+)/pets/(?<id>[^#?/]+)"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent_without_templates() {
        assert_eq!(rewrite_path("/pets"), "/pets");
        assert_eq!(rewrite_path(rewrite_path("/pets").as_str()), "/pets");
    }

    #[test]
    fn test_capture_name_is_verbatim() {
        assert_eq!(
            rewrite_path("/a/{snake_case_name}"),
            "/a/(?<snake_case_name>[^#?/]+)"
        );
    }

    #[test]
    fn test_route_shape() {
        let route = create_route(
            "doc_pets_get",
            "/pets/{id}",
            "GET",
            None,
            Vec::new(),
            &["tag1".to_string()],
            &Uuid::NAMESPACE_DNS,
        );

        assert_eq!(route["name"], "doc_pets_get");
        assert_eq!(route["methods"], serde_json::json!(["GET"]));
        assert_eq!(route["paths"], serde_json::json!(["~/pets/(?<id>[^#?/]+)$"]));
        assert_eq!(route["strip_path"], false);
        assert_eq!(route["tags"], serde_json::json!(["tag1"]));
    }

    #[test]
    fn test_route_defaults_seed_the_entity() {
        let defaults: JsonObject = serde_json::from_value(serde_json::json!({
            "preserve_host": true,
            "strip_path": true
        }))
        .unwrap();
        let route = create_route(
            "base",
            "/x",
            "GET",
            Some(&defaults),
            Vec::new(),
            &[],
            &Uuid::NAMESPACE_DNS,
        );

        assert_eq!(route["preserve_host"], true);
        // the computed keys overwrite the defaults
        assert_eq!(route["strip_path"], false);
    }
}
