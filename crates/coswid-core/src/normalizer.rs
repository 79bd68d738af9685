//! CBOR value tree → name-keyed JSON.
//!
//! The normalizer walks a decoded [`Value`] and produces a `serde_json::Value`
//! whose object keys are all strings:
//!
//! - Integer map keys go through the [`KeyResolver`] (unknown codes become
//!   their decimal string)
//! - Text map keys are used verbatim
//! - Any other key kind is rendered in diagnostic notation
//! - Byte strings become standard, padded base64 text
//! - Non-finite floats have no JSON form and become `null`
//!
//! When two keys of one map resolve to the same name, the later entry wins.
//! The object keeps the position of the first occurrence.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value as Json};

use crate::error::{CoswidError, Result};
use crate::keys::KeyResolver;
use crate::value::Value;

/// Nesting bound used when the caller does not pick one.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Converts [`Value`] trees using a fixed resolver table and depth bound.
#[derive(Debug, Clone)]
pub struct Normalizer<'r> {
    resolver: &'r KeyResolver,
    max_depth: usize,
}

impl<'r> Normalizer<'r> {
    pub fn new(resolver: &'r KeyResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
        }
    }

    /// Normalize a value tree. `artifact` names the source in errors.
    ///
    /// Every array or map counts as one nesting level. A tree whose deepest
    /// container sits at level `max_depth` is accepted; one level more fails
    /// with [`CoswidError::StructureTooDeep`].
    pub fn normalize(&self, artifact: &str, value: Value) -> Result<Json> {
        self.walk(artifact, value, 0)
    }

    fn walk(&self, artifact: &str, value: Value, depth: usize) -> Result<Json> {
        match value {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(b)),
            Value::Integer(i) => Ok(Json::Number(i.into())),
            Value::Float(x) => Ok(Number::from_f64(x).map_or(Json::Null, Json::Number)),
            Value::Text(s) => Ok(Json::String(s)),
            Value::Bytes(bytes) => Ok(Json::String(STANDARD.encode(bytes))),
            Value::Array(items) => {
                let depth = self.enter(artifact, depth)?;
                items
                    .into_iter()
                    .map(|item| self.walk(artifact, item, depth))
                    .collect::<Result<Vec<_>>>()
                    .map(Json::Array)
            }
            Value::Map(entries) => {
                let depth = self.enter(artifact, depth)?;
                let mut out = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = self.key_name(k);
                    let v = self.walk(artifact, v, depth)?;
                    if out.insert(key.clone(), v).is_some() {
                        tracing::debug!(key = %key, "duplicate map key, keeping the later value");
                    }
                }
                Ok(Json::Object(out))
            }
        }
    }

    fn enter(&self, artifact: &str, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(CoswidError::StructureTooDeep {
                artifact: artifact.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(depth)
    }

    fn key_name(&self, key: Value) -> String {
        match key {
            Value::Integer(code) => self.resolver.resolve(code).into_owned(),
            Value::Text(s) => s,
            other => other.to_string(),
        }
    }
}
