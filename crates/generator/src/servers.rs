//! Server URL parsing and defaulting
//!
//! An OAS `servers` block is reduced to a list of [`ServerTarget`]s:
//! template variables rendered, URLs parsed, and missing parts filled in
//! from the surrounding context.

use openapi2kong_common::{ConversionError, Result};
use openapi2kong_parser::Server;
use url::Url;

/// `url::Url` cannot represent a missing scheme, so scheme-relative
/// `//host` URLs are parsed under this placeholder and recorded as
/// schemeless.
const PLACEHOLDER_SCHEME: &str = "schemeless";

/// A server URL reduced to the parts Kong needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerTarget {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
}

/// Parse the server URLs after rendering the template variables.
///
/// An empty or absent block yields a single path-only target `/`.
/// Variables substitute their `default`; a variable without one renders as
/// the empty string.
pub fn parse_servers(servers: &[Server]) -> Result<Vec<ServerTarget>> {
    if servers.is_empty() {
        return Ok(vec![ServerTarget {
            scheme: None,
            host: None,
            port: None,
            path: "/".to_string(),
        }]);
    }

    servers.iter().map(parse_server).collect()
}

fn parse_server(server: &Server) -> Result<ServerTarget> {
    let mut rendered = server.url.clone();
    for (name, variable) in &server.variables {
        rendered = rendered.replace(&format!("{{{name}}}"), &variable.default);
    }
    parse_target(&rendered)
}

fn parse_target(raw: &str) -> Result<ServerTarget> {
    // origin-form: a bare path like "/v1"
    if raw.starts_with('/') && !raw.starts_with("//") {
        return Ok(ServerTarget {
            scheme: None,
            host: None,
            port: None,
            path: raw.to_string(),
        });
    }

    let schemeless = raw.starts_with("//");
    let candidate = if schemeless {
        format!("{PLACEHOLDER_SCHEME}:{raw}")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConversionError::Parse(format!("failed to parse URI '{raw}': {e}")))?;

    let path = if url.path().is_empty() {
        "/".to_string()
    } else {
        url.path().to_string()
    };

    Ok(ServerTarget {
        scheme: (!schemeless).then(|| url.scheme().to_string()),
        host: url.host_str().map(str::to_string),
        port: url.port(),
        path,
    })
}

/// Fill in missing parts of each target, in order: an absent host becomes
/// `localhost`; an absent scheme is inferred from the port (80 → http,
/// 443 → https) or falls back to `default_scheme`; an absent port follows
/// from the scheme (http → 80, https → 443).
pub fn apply_defaults(mut targets: Vec<ServerTarget>, default_scheme: &str) -> Vec<ServerTarget> {
    for target in &mut targets {
        if target.host.is_none() {
            target.host = Some("localhost".to_string());
        }
        if target.scheme.is_none() {
            target.scheme = Some(match target.port {
                Some(80) => "http".to_string(),
                Some(443) => "https".to_string(),
                _ => default_scheme.to_string(),
            });
        }
        if target.port.is_none() {
            target.port = Some(if target.scheme.as_deref() == Some("https") {
                443
            } else {
                80
            });
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(url: &str) -> Server {
        serde_json::from_value(serde_json::json!({ "url": url })).unwrap()
    }

    #[test]
    fn test_empty_block_yields_root_path_target() {
        let targets = parse_servers(&[]).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].path, "/");
        assert!(targets[0].host.is_none());
        assert!(targets[0].scheme.is_none());
        assert!(targets[0].port.is_none());
    }

    #[test]
    fn test_variable_defaults_win_over_enum() {
        let entry: Server = serde_json::from_value(serde_json::json!({
            "url": "https://{region}.example.com",
            "variables": {
                "region": {"default": "x", "enum": ["x", "y"]}
            }
        }))
        .unwrap();
        let targets = parse_servers(&[entry]).unwrap();
        assert_eq!(targets[0].host.as_deref(), Some("x.example.com"));
    }

    #[test]
    fn test_variable_without_default_renders_empty() {
        let entry: Server = serde_json::from_value(serde_json::json!({
            "url": "https://example.com/{stage}",
            "variables": {"stage": {}}
        }))
        .unwrap();
        let targets = parse_servers(&[entry]).unwrap();
        assert_eq!(targets[0].path, "/");
    }

    #[test]
    fn test_parse_error_carries_source_string() {
        let err = parse_servers(&[server("not a url")]).unwrap_err();
        assert!(matches!(err, ConversionError::Parse(_)));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_port_inference_from_scheme() {
        let targets = apply_defaults(parse_servers(&[server("http://a.com")]).unwrap(), "https");
        assert_eq!(targets[0].port, Some(80));

        let targets = apply_defaults(parse_servers(&[server("https://a.com")]).unwrap(), "https");
        assert_eq!(targets[0].port, Some(443));
    }

    #[test]
    fn test_scheme_inference_from_port() {
        let targets = apply_defaults(parse_servers(&[server("//a.com:80")]).unwrap(), "https");
        assert_eq!(targets[0].scheme.as_deref(), Some("http"));

        let targets = apply_defaults(parse_servers(&[server("//a.com:443")]).unwrap(), "https");
        assert_eq!(targets[0].scheme.as_deref(), Some("https"));

        let targets = apply_defaults(parse_servers(&[server("//a.com:9000")]).unwrap(), "https");
        assert_eq!(targets[0].scheme.as_deref(), Some("https"));
        assert_eq!(targets[0].port, Some(9000));
    }

    #[test]
    fn test_localhost_for_hostless_targets() {
        let targets = apply_defaults(parse_servers(&[]).unwrap(), "https");
        assert_eq!(targets[0].host.as_deref(), Some("localhost"));
        assert_eq!(targets[0].scheme.as_deref(), Some("https"));
        assert_eq!(targets[0].port, Some(443));
    }

    #[test]
    fn test_explicit_default_port_is_inferred_back() {
        // url parsers drop a port equal to the scheme default; the
        // defaulting pass reinstates it
        let targets = apply_defaults(parse_servers(&[server("http://a.com:80/x")]).unwrap(), "https");
        assert_eq!(targets[0].port, Some(80));
        assert_eq!(targets[0].path, "/x");
    }
}
