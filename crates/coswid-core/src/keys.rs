//! CoSWID field descriptors and the integer-key resolver.
//!
//! CoSWID (RFC 9393) keys every map with a small integer index instead of a
//! field name. [`COSWID_FIELDS`] is the index table; [`KeyResolver`] turns it
//! into lookups in both directions.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// The JSON kind a well-known field must have after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// JSON integer; exact-integer floats are accepted and narrowed.
    Integer,
    /// JSON object, or a JSON string standing in for a single value.
    Object,
    /// Not checked.
    Any,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Object => "object or string",
            FieldKind::Any => "any",
        }
    }
}

/// A named CoSWID field, its binary index and its expected JSON kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub code: i64,
    pub kind: FieldKind,
}

const fn field(name: &'static str, code: i64, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor { name, code, kind }
}

/// The RFC 9393 index table. Code 30 is unassigned.
pub const COSWID_FIELDS: &[FieldDescriptor] = &[
    field("tag-id", 0, FieldKind::String),
    field("software-name", 1, FieldKind::String),
    field("entity", 2, FieldKind::Any),
    field("evidence", 3, FieldKind::Object),
    field("link", 4, FieldKind::Any),
    field("software-meta", 5, FieldKind::Any),
    field("payload", 6, FieldKind::Object),
    field("hash", 7, FieldKind::Any),
    field("corpus", 8, FieldKind::Any),
    field("patch", 9, FieldKind::Any),
    field("media", 10, FieldKind::Any),
    field("supplemental", 11, FieldKind::Any),
    field("tag-version", 12, FieldKind::Integer),
    field("software-version", 13, FieldKind::String),
    field("version-scheme", 14, FieldKind::Any),
    field("lang", 15, FieldKind::String),
    field("directory", 16, FieldKind::Any),
    field("file", 17, FieldKind::Any),
    field("process", 18, FieldKind::Any),
    field("resource", 19, FieldKind::Any),
    field("size", 20, FieldKind::Any),
    field("file-version", 21, FieldKind::Any),
    field("key", 22, FieldKind::Any),
    field("location", 23, FieldKind::Any),
    field("fs-name", 24, FieldKind::Any),
    field("root", 25, FieldKind::Any),
    field("path-elements", 26, FieldKind::Any),
    field("process-name", 27, FieldKind::Any),
    field("pid", 28, FieldKind::Any),
    field("type", 29, FieldKind::Any),
    field("entity-name", 31, FieldKind::Any),
    field("reg-id", 32, FieldKind::Any),
    field("role", 33, FieldKind::Any),
    field("thumbprint", 34, FieldKind::Any),
    field("date", 35, FieldKind::Any),
    field("device-id", 36, FieldKind::Any),
    field("artifact", 37, FieldKind::Any),
    field("href", 38, FieldKind::Any),
    field("ownership", 39, FieldKind::Any),
    field("rel", 40, FieldKind::Any),
    field("media-type", 41, FieldKind::Any),
    field("use", 42, FieldKind::Any),
    field("activation-status", 43, FieldKind::Any),
    field("channel-type", 44, FieldKind::Any),
    field("colloquial-version", 45, FieldKind::Any),
    field("description", 46, FieldKind::Any),
    field("edition", 47, FieldKind::Any),
    field("entitlement-data-required", 48, FieldKind::Any),
    field("entitlement-key", 49, FieldKind::Any),
    field("generator", 50, FieldKind::Any),
    field("persistent-id", 51, FieldKind::Any),
    field("product", 52, FieldKind::Any),
    field("product-family", 53, FieldKind::Any),
    field("revision", 54, FieldKind::Any),
    field("summary", 55, FieldKind::Any),
    field("unspsc-code", 56, FieldKind::Any),
    field("unspsc-version", 57, FieldKind::Any),
];

/// Immutable two-way lookup between binary indexes and field names.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    fields: &'static [FieldDescriptor],
    by_code: HashMap<i64, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl KeyResolver {
    /// Build a resolver over a descriptor table. Later duplicates of a code
    /// or name shadow earlier ones.
    pub fn new(fields: &'static [FieldDescriptor]) -> Self {
        let mut by_code = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());
        for (i, d) in fields.iter().enumerate() {
            by_code.insert(d.code, i);
            by_name.insert(d.name, i);
        }
        Self {
            fields,
            by_code,
            by_name,
        }
    }

    /// Resolver over the CoSWID index table.
    pub fn coswid() -> Self {
        Self::new(COSWID_FIELDS)
    }

    /// Canonical name for `code`, or its decimal form when the table has no
    /// entry. Never fails.
    pub fn resolve(&self, code: i64) -> Cow<'static, str> {
        match self.by_code.get(&code) {
            Some(&i) => Cow::Borrowed(self.fields[i].name),
            None => Cow::Owned(code.to_string()),
        }
    }

    /// Binary index for a canonical field name.
    pub fn code_for(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).map(|&i| self.fields[i].code)
    }

    /// Descriptor for a canonical field name.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// All descriptors, in table order.
    pub fn rules(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::coswid()
    }
}
