//! Common types shared across the openapi2kong workspace
//!
//! This crate contains the error type and JSON aliases used by the parser,
//! generator, and CLI components.
//!
//! ## Architecture
//!
//! The converter follows this data flow:
//! 1. **Parser**: OAS 3.x bytes (JSON or YAML) → `OasDocument`
//! 2. **Generator**: `OasDocument` → Kong declarative configuration
//! 3. **Output**: serialized JSON or YAML document

use thiserror::Error;

/// A generic JSON object.
///
/// Plugin configs, entity defaults, and the emitted Kong entities are all
/// dynamic JSON blobs; `serde_json::Map` keeps their keys sorted, which the
/// deterministic-output rules rely on.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The OAS document or a server URL could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// An extension or component has the wrong JSON shape
    #[error("type error: {0}")]
    Type(String),

    /// A `$ref` pointer is malformed or its target is missing
    #[error("reference error: {0}")]
    Ref(String),

    /// An `x-kong-plugin-<name>` body declares a conflicting plugin name
    #[error("name conflict: {0}")]
    NameConflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConversionError {
    /// Prefix the message with the offending scope (document root, path,
    /// or operation) while keeping the error kind matchable.
    pub fn context(self, scope: &str) -> Self {
        match self {
            ConversionError::Parse(msg) => ConversionError::Parse(format!("{scope}: {msg}")),
            ConversionError::Type(msg) => ConversionError::Type(format!("{scope}: {msg}")),
            ConversionError::Ref(msg) => ConversionError::Ref(format!("{scope}: {msg}")),
            ConversionError::NameConflict(msg) => {
                ConversionError::NameConflict(format!("{scope}: {msg}"))
            }
            other => other,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;
