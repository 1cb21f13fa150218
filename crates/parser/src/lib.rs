//! OpenAPI 3.x document parsing
//!
//! This crate loads OpenAPI 3.x specifications (JSON or YAML) into the
//! document model the Kong conversion operates on. Only OAS 3.x is
//! accepted; anything else is a parse error.
//!
//! ## Usage
//! ```rust,ignore
//! let doc = openapi2kong_parser::from_slice(&bytes)?;
//! for (path, item) in &doc.paths { /* ... */ }
//! ```

mod types;

pub use types::*;

use openapi2kong_common::{ConversionError, Result};

/// Parse an OAS 3.x document from raw bytes.
///
/// The format is sniffed from the content: a first non-whitespace `{` means
/// JSON, anything else is treated as YAML.
pub fn from_slice(content: &[u8]) -> Result<OasDocument> {
    let text = std::str::from_utf8(content)
        .map_err(|e| ConversionError::Parse(format!("input is not valid UTF-8: {e}")))?;

    if text.trim_start().starts_with('{') {
        from_json(text)
    } else {
        from_yaml(text)
    }
}

/// Parse an OAS 3.x document from a JSON string.
pub fn from_json(json: &str) -> Result<OasDocument> {
    let doc: OasDocument = serde_json::from_str(json)
        .map_err(|e| ConversionError::Parse(format!("error parsing OAS3 file: {e}")))?;
    check_version(doc)
}

/// Parse an OAS 3.x document from a YAML string.
pub fn from_yaml(yaml: &str) -> Result<OasDocument> {
    let doc: OasDocument = serde_yaml::from_str(yaml)
        .map_err(|e| ConversionError::Parse(format!("error parsing OAS3 file: {e}")))?;
    check_version(doc)
}

fn check_version(doc: OasDocument) -> Result<OasDocument> {
    if doc.openapi.starts_with("3.") {
        Ok(doc)
    } else {
        Err(ConversionError::Parse(format!(
            "unsupported OpenAPI version '{}'; only 3.x is supported",
            doc.openapi
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Test API", "version": "1.0.0"},
        "paths": {}
    }"#;

    #[test]
    fn test_parse_minimal_json() {
        let doc = from_json(MINIMAL).unwrap();
        assert_eq!(doc.openapi, "3.0.0");
        assert_eq!(doc.info.title, "Test API");
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = "openapi: 3.0.0\ninfo:\n  title: Test API\n  version: 1.0.0\npaths: {}\n";
        let doc = from_yaml(yaml).unwrap();
        assert_eq!(doc.info.title, "Test API");
    }

    #[test]
    fn test_from_slice_sniffs_format() {
        assert!(from_slice(MINIMAL.as_bytes()).is_ok());
        let yaml = b"openapi: 3.1.0\ninfo:\n  title: T\n  version: '1'\n";
        assert!(from_slice(yaml).is_ok());
    }

    #[test]
    fn test_rejects_non_3x_documents() {
        let swagger = r#"{"openapi": "2.0", "info": {"title": "T", "version": "1"}}"#;
        let err = from_json(swagger).unwrap_err();
        assert!(matches!(err, ConversionError::Parse(_)));
        assert!(err.to_string().contains("only 3.x"));
    }
}
