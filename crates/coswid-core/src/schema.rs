//! JSON-schema validation of normalized documents.
//!
//! Wraps the `jsonschema` crate. The evaluator is treated as a black box: it
//! receives the normalized document and the caller's schema, and every
//! violation it reports is relayed back, not only the first one.

use serde_json::Value;

use crate::error::{CoswidError, Result, Violation};

/// A compiled JSON schema.
#[derive(Debug)]
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile a schema. The draft is taken from its `$schema` keyword.
    ///
    /// # Errors
    ///
    /// Returns [`CoswidError::InvalidSchema`] if the schema does not compile.
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::options()
            .build(schema)
            .map_err(|e| CoswidError::InvalidSchema(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Compile a schema from JSON text.
    pub fn from_slice(schema: &[u8]) -> Result<Self> {
        let schema: Value = serde_json::from_slice(schema)
            .map_err(|e| CoswidError::InvalidSchema(e.to_string()))?;
        Self::new(&schema)
    }

    /// Check `document` against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoswidError::SchemaValidation`] carrying every violation.
    pub fn validate(&self, artifact: &str, document: &Value) -> Result<()> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|error| Violation {
                path: error.instance_path().to_string(),
                message: error.to_string(),
            })
            .collect();

        if violations.is_empty() {
            tracing::debug!(artifact, "schema validation passed");
            return Ok(());
        }
        Err(CoswidError::SchemaValidation {
            artifact: artifact.to_string(),
            violations,
        })
    }

    /// Whether `document` satisfies the schema, without collecting violations.
    pub fn is_valid(&self, document: &Value) -> bool {
        self.validator.is_valid(document)
    }
}
