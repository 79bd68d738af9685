//! Decoded CBOR value tree.
//!
//! `Value` is the shared intermediate representation of both directions: the
//! identity model lowers into it before encoding, and the normalizer walks it
//! after decoding. It separates integers from floats and text from byte
//! strings, which a JSON tree cannot do on its own.

use std::fmt;

use ciborium::value::Value as CborValue;

/// A decoded CBOR data item restricted to the types CoSWID uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Key-value pairs in wire order. Keys are not deduplicated here.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Build a map keyed by integer codes, in the given order.
    pub fn int_map(entries: Vec<(i64, Value)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(code, v)| (Value::Integer(code), v))
                .collect(),
        )
    }

    /// Stable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Diagnostic-notation rendering (RFC 8949 §8), used when a map key is
/// neither an integer nor text and still has to become a JSON object key.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => f.write_str("NaN"),
            Value::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bytes(bytes) => {
                f.write_str("h'")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Reasons a codec value has no counterpart in [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    IntegerOutOfRange(String),
    SimpleValue,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::IntegerOutOfRange(n) => {
                write!(f, "integer {n} does not fit in a signed 64-bit value")
            }
            Unsupported::SimpleValue => f.write_str("unsupported CBOR simple value"),
        }
    }
}

impl TryFrom<CborValue> for Value {
    type Error = Unsupported;

    fn try_from(v: CborValue) -> std::result::Result<Self, Self::Error> {
        Ok(match v {
            CborValue::Null => Value::Null,
            CborValue::Bool(b) => Value::Bool(b),
            CborValue::Integer(i) => {
                let wide: i128 = i.into();
                let narrow = i64::try_from(wide)
                    .map_err(|_| Unsupported::IntegerOutOfRange(wide.to_string()))?;
                Value::Integer(narrow)
            }
            CborValue::Float(x) => Value::Float(x),
            CborValue::Text(s) => Value::Text(s),
            CborValue::Bytes(bytes) => Value::Bytes(bytes),
            CborValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            CborValue::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    out.push((Value::try_from(k)?, Value::try_from(v)?));
                }
                Value::Map(out)
            }
            // Semantic tags (e.g. the CoSWID 1398229316 wrapper) are transparent.
            CborValue::Tag(tag, inner) => {
                tracing::debug!(tag, "unwrapping CBOR tag");
                Value::try_from(*inner)?
            }
            _ => return Err(Unsupported::SimpleValue),
        })
    }
}

impl From<Value> for CborValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => CborValue::Null,
            Value::Bool(b) => CborValue::Bool(b),
            Value::Integer(i) => CborValue::Integer(i.into()),
            Value::Float(x) => CborValue::Float(x),
            Value::Text(s) => CborValue::Text(s),
            Value::Bytes(bytes) => CborValue::Bytes(bytes),
            Value::Array(items) => CborValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Map(entries) => CborValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}
