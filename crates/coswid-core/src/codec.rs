//! CBOR wire codec, backed by `ciborium`.

use std::io::Cursor;

use ciborium::value::Value as CborValue;

use crate::error::{CoswidError, Result};
use crate::value::Value;

/// Decode exactly one CBOR data item whose root is a map.
///
/// Fails on malformed input, on bytes left over after the item, and on any
/// root other than a map.
pub fn decode(artifact: &str, bytes: &[u8]) -> Result<Value> {
    let decode_err = |message: String| CoswidError::Decode {
        artifact: artifact.to_string(),
        message,
    };

    let mut cursor = Cursor::new(bytes);
    let raw: CborValue =
        ciborium::de::from_reader(&mut cursor).map_err(|e| decode_err(e.to_string()))?;

    let consumed = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
    if consumed < bytes.len() {
        return Err(decode_err(format!(
            "{} trailing bytes after the top-level item",
            bytes.len() - consumed
        )));
    }

    let value = Value::try_from(raw).map_err(|e| decode_err(e.to_string()))?;
    if value.as_map().is_none() {
        return Err(decode_err(format!(
            "expected a map at the root, found {}",
            value.kind()
        )));
    }
    tracing::debug!(artifact, bytes = bytes.len(), "decoded CBOR tag");
    Ok(value)
}

/// Encode a value tree as a single CBOR data item.
pub fn encode(artifact: &str, value: Value) -> Result<Vec<u8>> {
    let raw = CborValue::from(value);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&raw, &mut out).map_err(|e| CoswidError::Encode {
        artifact: artifact.to_string(),
        message: e.to_string(),
    })?;
    Ok(out)
}
