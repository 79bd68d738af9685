//! Typed CoSWID identity model, deserialized from author-facing JSON templates.
//!
//! Templates use the field names of the CoSWID JSON representation
//! (`tag-id`, `software-name`, ...). [`SoftwareIdentity::to_value`] lowers a
//! parsed template into the integer-keyed [`Value`] map that goes on the wire.
//!
//! A few conventions carried over from the CBOR encoding:
//!
//! - Fields that may hold one entry or several (`entity`, `link`, `file`, ...)
//!   accept either a single object or an array in the template. On the wire a
//!   single entry is written bare and several are written as an array.
//! - Enumerated fields (`role`, `rel`, `version-scheme`, `ownership`, `use`)
//!   accept a registered name or a raw integer. Registered names are written
//!   as their RFC 9393 code; unregistered names are kept as text. Name matching
//!   ignores case, `-` and `_`, so `tagCreator` and `tag-creator` agree.
//! - Hash values are base64 text in the template and byte strings on the wire.
//! - `evidence` may carry a free-form `type`/`value` record next to its
//!   resource collection. `value` has no binary index and is written under a
//!   text key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer};

use crate::keys::KeyResolver;
use crate::value::Value;

const ROLES: &[(&str, i64)] = &[
    ("tag-creator", 1),
    ("software-creator", 2),
    ("aggregator", 3),
    ("distributor", 4),
    ("licensor", 5),
    ("maintainer", 6),
];

const VERSION_SCHEMES: &[(&str, i64)] = &[
    ("multipartnumeric", 1),
    ("multipartnumeric+suffix", 2),
    ("alphanumeric", 3),
    ("decimal", 4),
    ("semver", 16384),
];

const LINK_RELS: &[(&str, i64)] = &[
    ("ancestor", 1),
    ("component", 2),
    ("feature", 3),
    ("installationmedia", 4),
    ("packageinstaller", 5),
    ("parent", 6),
    ("patches", 7),
    ("requires", 8),
    ("see-also", 9),
    ("supersedes", 10),
    ("supplemental", 11),
];

const OWNERSHIP: &[(&str, i64)] = &[("abandon", 1), ("private", 2), ("shared", 3)];

const LINK_USE: &[(&str, i64)] = &[("optional", 1), ("required", 2), ("recommended", 3)];

/// A CoSWID tag as written in a JSON template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SoftwareIdentity {
    pub tag_id: String,
    pub software_name: String,
    #[serde(default)]
    pub tag_version: i64,
    #[serde(default)]
    pub corpus: bool,
    #[serde(default)]
    pub patch: bool,
    #[serde(default)]
    pub supplemental: bool,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub version_scheme: Option<Label>,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub software_meta: Vec<SoftwareMeta>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub entity: Vec<Entity>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub link: Vec<Link>,
    #[serde(default)]
    pub payload: Option<ResourceCollection>,
    #[serde(default)]
    pub evidence: Option<Evidence>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// An enumerated value given either by name or by code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Code(i64),
    Name(String),
}

impl Label {
    fn to_value(&self, registry: &[(&str, i64)]) -> Value {
        match self {
            Label::Code(code) => Value::Integer(*code),
            Label::Name(name) => {
                let wanted = fold(name);
                registry
                    .iter()
                    .find(|(known, _)| fold(known) == wanted)
                    .map_or_else(|| Value::text(name.clone()), |&(_, code)| Value::Integer(code))
            }
        }
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Entity {
    pub entity_name: String,
    #[serde(default)]
    pub reg_id: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub role: Vec<Label>,
    #[serde(default)]
    pub thumbprint: Option<HashEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    pub href: String,
    pub rel: Label,
    #[serde(default)]
    pub artifact: Option<String>,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub ownership: Option<Label>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub r#use: Option<Label>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SoftwareMeta {
    pub activation_status: Option<String>,
    pub channel_type: Option<String>,
    pub colloquial_version: Option<String>,
    pub description: Option<String>,
    pub edition: Option<String>,
    pub entitlement_data_required: Option<bool>,
    pub entitlement_key: Option<String>,
    pub generator: Option<String>,
    pub persistent_id: Option<String>,
    pub product: Option<String>,
    pub product_family: Option<String>,
    pub revision: Option<String>,
    pub summary: Option<String>,
    pub unspsc_code: Option<String>,
    pub unspsc_version: Option<String>,
}

/// Body of `payload`, and the resource part of `evidence`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceCollection {
    #[serde(default, deserialize_with = "one_or_many")]
    pub directory: Vec<Directory>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub file: Vec<File>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub process: Vec<Process>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub resource: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Evidence {
    #[serde(flatten)]
    pub resources: ResourceCollection,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    /// Kind of a custom evidence record, e.g. `"attestation"`.
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Directory {
    pub fs_name: String,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub key: Option<bool>,
    #[serde(default)]
    pub path_elements: Option<PathElements>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathElements {
    #[serde(default, deserialize_with = "one_or_many")]
    pub directory: Vec<Directory>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub file: Vec<File>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct File {
    pub fs_name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub file_version: Option<String>,
    #[serde(default)]
    pub key: Option<bool>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub hash: Option<HashEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Process {
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub pid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resource {
    pub r#type: String,
}

/// A named-information hash: IANA algorithm id plus digest bytes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HashEntry {
    pub hash_alg_id: i64,
    #[serde(deserialize_with = "base64_bytes")]
    pub hash_value: Vec<u8>,
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

fn base64_bytes<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    STANDARD
        .decode(text.as_bytes())
        .map_err(|e| serde::de::Error::custom(format!("invalid base64 hash value: {e}")))
}

/// Collects `(index, value)` pairs for one CBOR map, looking indexes up by
/// field name.
struct MapBuilder<'r> {
    keys: &'r KeyResolver,
    entries: Vec<(Value, Value)>,
}

impl<'r> MapBuilder<'r> {
    fn new(keys: &'r KeyResolver) -> Self {
        Self {
            keys,
            entries: Vec::new(),
        }
    }

    fn put(&mut self, name: &str, value: Value) -> Result<&mut Self, String> {
        let code = self
            .keys
            .code_for(name)
            .ok_or_else(|| format!("no binary index for field {name:?}"))?;
        self.entries.push((Value::Integer(code), value));
        Ok(self)
    }

    fn put_opt(&mut self, name: &str, value: Option<Value>) -> Result<&mut Self, String> {
        match value {
            Some(v) => self.put(name, v),
            None => Ok(self),
        }
    }

    fn put_text(&mut self, name: &str, value: &Option<String>) -> Result<&mut Self, String> {
        self.put_opt(name, value.clone().map(Value::Text))
    }

    fn put_flag(&mut self, name: &str, value: Option<bool>) -> Result<&mut Self, String> {
        self.put_opt(name, value.map(Value::Bool))
    }

    /// Entry under a text key, for fields with no binary index.
    fn put_named(&mut self, name: &str, value: Option<Value>) -> &mut Self {
        if let Some(v) = value {
            self.entries.push((Value::text(name), v));
        }
        self
    }

    fn finish(self) -> Value {
        Value::Map(self.entries)
    }
}

/// Lower a list field: nothing when empty, the bare entry when single, an
/// array otherwise.
fn lower_many<T>(
    items: &[T],
    keys: &KeyResolver,
    lower: impl Fn(&T, &KeyResolver) -> Result<Value, String>,
) -> Result<Option<Value>, String> {
    match items {
        [] => Ok(None),
        [one] => lower(one, keys).map(Some),
        many => many
            .iter()
            .map(|item| lower(item, keys))
            .collect::<Result<Vec<_>, _>>()
            .map(|values| Some(Value::Array(values))),
    }
}

fn require(path: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(format!("{path} must not be empty"))
    } else {
        Ok(())
    }
}

impl SoftwareIdentity {
    /// Enforce the presence rules of the binary format that the JSON shape
    /// alone cannot express (required text fields that were left empty).
    pub fn check(&self) -> Result<(), String> {
        require("tag-id", &self.tag_id)?;
        require("software-name", &self.software_name)?;
        for (i, entity) in self.entity.iter().enumerate() {
            let path = format!("entity[{i}]");
            require(&format!("{path}.entity-name"), &entity.entity_name)?;
            if entity.role.is_empty() {
                return Err(format!("{path}.role must name at least one role"));
            }
        }
        for (i, link) in self.link.iter().enumerate() {
            require(&format!("link[{i}].href"), &link.href)?;
        }
        if let Some(payload) = &self.payload {
            payload.check("payload")?;
        }
        if let Some(evidence) = &self.evidence {
            evidence.resources.check("evidence")?;
        }
        Ok(())
    }

    /// Lower into the integer-keyed map written on the wire.
    pub fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put("tag-id", Value::text(self.tag_id.clone()))?
            .put("tag-version", Value::Integer(self.tag_version))?
            .put_flag("corpus", self.corpus.then_some(true))?
            .put_flag("patch", self.patch.then_some(true))?
            .put_flag("supplemental", self.supplemental.then_some(true))?
            .put("software-name", Value::text(self.software_name.clone()))?
            .put_text("software-version", &self.software_version)?
            .put_opt(
                "version-scheme",
                self.version_scheme.as_ref().map(|l| l.to_value(VERSION_SCHEMES)),
            )?
            .put_text("media", &self.media)?
            .put_opt(
                "software-meta",
                lower_many(&self.software_meta, keys, SoftwareMeta::to_value)?,
            )?
            .put_opt("entity", lower_many(&self.entity, keys, Entity::to_value)?)?
            .put_opt("link", lower_many(&self.link, keys, Link::to_value)?)?;
        if let Some(payload) = &self.payload {
            map.put("payload", payload.to_value(keys)?)?;
        }
        if let Some(evidence) = &self.evidence {
            map.put("evidence", evidence.to_value(keys)?)?;
        }
        map.put_text("lang", &self.lang)?;
        Ok(map.finish())
    }
}

impl Entity {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let roles: Vec<Value> = self.role.iter().map(|r| r.to_value(ROLES)).collect();
        let role = match <[Value; 1]>::try_from(roles) {
            Ok([one]) => one,
            Err(many) => Value::Array(many),
        };
        let mut map = MapBuilder::new(keys);
        map.put("entity-name", Value::text(self.entity_name.clone()))?
            .put_text("reg-id", &self.reg_id)?
            .put("role", role)?
            .put_opt("thumbprint", self.thumbprint.as_ref().map(HashEntry::to_value))?;
        Ok(map.finish())
    }
}

impl Link {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put_text("artifact", &self.artifact)?
            .put("href", Value::text(self.href.clone()))?
            .put_text("media", &self.media)?
            .put_opt("ownership", self.ownership.as_ref().map(|l| l.to_value(OWNERSHIP)))?
            .put("rel", self.rel.to_value(LINK_RELS))?
            .put_text("media-type", &self.media_type)?
            .put_opt("use", self.r#use.as_ref().map(|l| l.to_value(LINK_USE)))?;
        Ok(map.finish())
    }
}

impl SoftwareMeta {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put_text("activation-status", &self.activation_status)?
            .put_text("channel-type", &self.channel_type)?
            .put_text("colloquial-version", &self.colloquial_version)?
            .put_text("description", &self.description)?
            .put_text("edition", &self.edition)?
            .put_flag("entitlement-data-required", self.entitlement_data_required)?
            .put_text("entitlement-key", &self.entitlement_key)?
            .put_text("generator", &self.generator)?
            .put_text("persistent-id", &self.persistent_id)?
            .put_text("product", &self.product)?
            .put_text("product-family", &self.product_family)?
            .put_text("revision", &self.revision)?
            .put_text("summary", &self.summary)?
            .put_text("unspsc-code", &self.unspsc_code)?
            .put_text("unspsc-version", &self.unspsc_version)?;
        Ok(map.finish())
    }
}

impl ResourceCollection {
    fn check(&self, path: &str) -> Result<(), String> {
        for (i, dir) in self.directory.iter().enumerate() {
            dir.check(&format!("{path}.directory[{i}]"))?;
        }
        for (i, file) in self.file.iter().enumerate() {
            require(&format!("{path}.file[{i}].fs-name"), &file.fs_name)?;
        }
        Ok(())
    }

    fn fill(&self, map: &mut MapBuilder<'_>, keys: &KeyResolver) -> Result<(), String> {
        map.put_opt("directory", lower_many(&self.directory, keys, Directory::to_value)?)?
            .put_opt("file", lower_many(&self.file, keys, File::to_value)?)?
            .put_opt("process", lower_many(&self.process, keys, Process::to_value)?)?
            .put_opt("resource", lower_many(&self.resource, keys, Resource::to_value)?)?;
        Ok(())
    }

    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        self.fill(&mut map, keys)?;
        Ok(map.finish())
    }
}

impl Evidence {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        self.resources.fill(&mut map, keys)?;
        map.put_text("date", &self.date)?
            .put_text("device-id", &self.device_id)?
            .put_text("type", &self.r#type)?
            .put_named("value", self.value.clone().map(Value::Text));
        Ok(map.finish())
    }
}

impl Directory {
    fn check(&self, path: &str) -> Result<(), String> {
        require(&format!("{path}.fs-name"), &self.fs_name)?;
        if let Some(elements) = &self.path_elements {
            for (i, dir) in elements.directory.iter().enumerate() {
                dir.check(&format!("{path}.path-elements.directory[{i}]"))?;
            }
            for (i, file) in elements.file.iter().enumerate() {
                require(
                    &format!("{path}.path-elements.file[{i}].fs-name"),
                    &file.fs_name,
                )?;
            }
        }
        Ok(())
    }

    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put_flag("key", self.key)?
            .put_text("location", &self.location)?
            .put("fs-name", Value::text(self.fs_name.clone()))?
            .put_text("root", &self.root)?;
        if let Some(elements) = &self.path_elements {
            let mut inner = MapBuilder::new(keys);
            inner
                .put_opt("directory", lower_many(&elements.directory, keys, Directory::to_value)?)?
                .put_opt("file", lower_many(&elements.file, keys, File::to_value)?)?;
            map.put("path-elements", inner.finish())?;
        }
        Ok(map.finish())
    }
}

impl File {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let size = self
            .size
            .map(|s| {
                i64::try_from(s)
                    .map(Value::Integer)
                    .map_err(|_| format!("file {:?}: size {s} is out of range", self.fs_name))
            })
            .transpose()?;
        let mut map = MapBuilder::new(keys);
        map.put_flag("key", self.key)?
            .put_text("location", &self.location)?
            .put("fs-name", Value::text(self.fs_name.clone()))?
            .put_text("root", &self.root)?
            .put_opt("size", size)?
            .put_text("file-version", &self.file_version)?
            .put_opt("hash", self.hash.as_ref().map(HashEntry::to_value))?;
        Ok(map.finish())
    }
}

impl Process {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put_text("process-name", &self.process_name)?
            .put_opt("pid", self.pid.map(Value::Integer))?;
        Ok(map.finish())
    }
}

impl Resource {
    fn to_value(&self, keys: &KeyResolver) -> Result<Value, String> {
        let mut map = MapBuilder::new(keys);
        map.put("type", Value::text(self.r#type.clone()))?;
        Ok(map.finish())
    }
}

impl HashEntry {
    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Integer(self.hash_alg_id),
            Value::Bytes(self.hash_value.clone()),
        ])
    }
}
