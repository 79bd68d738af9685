//! Type checks and numeric narrowing for well-known top-level fields.
//!
//! The CBOR number model does not always survive the trip into JSON intact:
//! a producer may write `tag-version` as a float, and JSON-schema evaluators
//! treat `2.0` and `2` differently. [`coerce`] runs once over a normalized
//! document, before schema validation, and:
//!
//! - rejects well-known fields whose JSON kind is wrong
//! - replaces exact-integer floats in integer fields by the integer
//!
//! Only the top-level object is inspected. Nested fields with the same name
//! are left alone.

use serde_json::{Number, Value as Json};

use crate::error::{CoswidError, Result};
use crate::keys::{FieldKind, KeyResolver};

/// Apply the resolver's field rules to the top level of `doc`, the
/// normalized form of `artifact`.
///
/// Documents that are not JSON objects are returned unchanged. Applying
/// `coerce` to its own output yields the same document.
pub fn coerce(artifact: &str, doc: Json, rules: &KeyResolver) -> Result<Json> {
    let Json::Object(mut map) = doc else {
        return Ok(doc);
    };

    for (name, value) in map.iter_mut() {
        let Some(descriptor) = rules.descriptor(name) else {
            continue;
        };
        check_field(artifact, name, descriptor.kind, value)?;
    }

    Ok(Json::Object(map))
}

fn check_field(artifact: &str, name: &str, kind: FieldKind, value: &mut Json) -> Result<()> {
    let ok = match kind {
        FieldKind::Any => true,
        FieldKind::String => value.is_string(),
        FieldKind::Object => value.is_string() || value.is_object(),
        FieldKind::Integer => match as_exact_integer(value) {
            Some(narrowed) => {
                if narrowed != *value {
                    tracing::debug!(field = name, from = %value, "narrowing float to integer");
                    *value = narrowed;
                }
                true
            }
            None => false,
        },
    };

    if ok {
        Ok(())
    } else {
        Err(CoswidError::TypeMismatch {
            artifact: artifact.to_string(),
            field: name.to_string(),
            expected: kind.as_str(),
            found: json_kind(value),
        })
    }
}

/// The integer form of a JSON number with integer semantics, if any.
fn as_exact_integer(value: &Json) -> Option<Json> {
    let Json::Number(n) = value else {
        return None;
    };
    if n.is_i64() || n.is_u64() {
        return Some(value.clone());
    }
    let x = n.as_f64()?;
    // i64::MAX is not representable as f64; the bound excludes 2^63 itself.
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(Json::Number(Number::from(x as i64)))
    } else {
        None
    }
}

/// JSON kind name used in [`CoswidError::TypeMismatch`].
pub fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
