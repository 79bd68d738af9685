//! Error types for CoSWID materialization, normalization and validation.

use std::fmt;

use thiserror::Error;

/// One schema rule broken by a normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending instance (`""` for the document root).
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "/: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Errors that can occur while converting between templates, CBOR and JSON.
#[derive(Error, Debug)]
pub enum CoswidError {
    /// The JSON template was malformed or missed a field the identity model requires.
    #[error("error decoding template from {artifact}: {source}")]
    TemplateParse {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    /// The identity value cannot be written as a CoSWID binary tag.
    #[error("error encoding {artifact} to CBOR: {message}")]
    Encode { artifact: String, message: String },

    /// The input bytes are not a single well-formed CBOR map.
    #[error("error decoding CoSWID from {artifact}: {message}")]
    Decode { artifact: String, message: String },

    /// The value tree nests deeper than the configured bound.
    #[error("CoSWID from {artifact} nests deeper than {max_depth} levels")]
    StructureTooDeep { artifact: String, max_depth: usize },

    /// A well-known field carries a JSON kind its descriptor does not allow.
    #[error("CoSWID from {artifact}: field {field:?}: expected {expected}, found {found}")]
    TypeMismatch {
        artifact: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The normalized document broke one or more schema rules.
    #[error("CoSWID from {artifact} is invalid: {}", join_violations(.violations))]
    SchemaValidation {
        artifact: String,
        violations: Vec<Violation>,
    },

    /// The supplied JSON schema could not be compiled.
    #[error("invalid JSON schema: {0}")]
    InvalidSchema(String),

    /// Serializing a normalized document back to JSON text failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout coswid-core.
pub type Result<T> = std::result::Result<T, CoswidError>;
