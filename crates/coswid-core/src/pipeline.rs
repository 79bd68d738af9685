//! Per-artifact operations: create, display and validate.
//!
//! A [`Converter`] bundles the immutable configuration every conversion
//! needs (resolver table and depth bound). It holds no mutable state, so one
//! instance can serve any number of files, and each call returns a fresh
//! output that shares nothing with its input.

use serde_json::Value as Json;

use crate::codec;
use crate::coercer::coerce;
use crate::error::{CoswidError, Result};
use crate::keys::KeyResolver;
use crate::materializer;
use crate::normalizer::{Normalizer, DEFAULT_MAX_DEPTH};
use crate::schema::SchemaValidator;

/// Conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Deepest array/map nesting accepted when normalizing.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Converter {
    keys: KeyResolver,
    options: Options,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Converter {
    /// Converter over the CoSWID index table.
    pub fn new(options: Options) -> Self {
        Self::with_resolver(KeyResolver::coswid(), options)
    }

    pub fn with_resolver(keys: KeyResolver, options: Options) -> Self {
        Self { keys, options }
    }

    /// Template bytes → CBOR bytes.
    pub fn create(&self, artifact: &str, template: &[u8]) -> Result<Vec<u8>> {
        materializer::materialize(artifact, template, &self.keys)
    }

    /// Like [`Converter::create`], but first checks the raw template against
    /// `schema` so authoring mistakes are reported with schema paths.
    pub fn create_checked(
        &self,
        artifact: &str,
        template: &[u8],
        schema: &SchemaValidator,
    ) -> Result<Vec<u8>> {
        let raw: Json =
            serde_json::from_slice(template).map_err(|source| CoswidError::TemplateParse {
                artifact: artifact.to_string(),
                source,
            })?;
        schema.validate(artifact, &raw)?;
        self.create(artifact, template)
    }

    /// CBOR bytes → normalized, coerced JSON document.
    pub fn to_document(&self, artifact: &str, bytes: &[u8]) -> Result<Json> {
        let value = codec::decode(artifact, bytes)?;
        let normalized =
            Normalizer::new(&self.keys, self.options.max_depth).normalize(artifact, value)?;
        coerce(artifact, normalized, &self.keys)
    }

    /// CBOR bytes → pretty-printed JSON (two-space indent).
    pub fn display(&self, artifact: &str, bytes: &[u8]) -> Result<String> {
        let doc = self.to_document(artifact, bytes)?;
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// CBOR bytes → document checked against `schema`. Returns the document
    /// on success.
    pub fn validate(
        &self,
        artifact: &str,
        bytes: &[u8],
        schema: &SchemaValidator,
    ) -> Result<Json> {
        let doc = self.to_document(artifact, bytes)?;
        schema.validate(artifact, &doc)?;
        Ok(doc)
    }
}
