//! JSON template → CBOR-encoded CoSWID tag.

use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{CoswidError, Result};
use crate::identity::SoftwareIdentity;
use crate::keys::KeyResolver;

/// Extension given to materialized tags.
pub const CBOR_EXTENSION: &str = "cbor";

/// Parse a JSON template into the typed identity model.
///
/// `artifact` names the template (usually its path) in error messages.
pub fn parse_template(artifact: &str, template: &[u8]) -> Result<SoftwareIdentity> {
    serde_json::from_slice(template).map_err(|source| CoswidError::TemplateParse {
        artifact: artifact.to_string(),
        source,
    })
}

/// Build the CBOR bytes of a CoSWID tag from a JSON template.
///
/// Fails with [`CoswidError::TemplateParse`] when the JSON is malformed or
/// lacks a required field, and with [`CoswidError::Encode`] when a required
/// field is present but empty.
pub fn materialize(artifact: &str, template: &[u8], keys: &KeyResolver) -> Result<Vec<u8>> {
    let identity = parse_template(artifact, template)?;
    encode_identity(artifact, &identity, keys)
}

/// Encode an already-parsed identity.
pub fn encode_identity(
    artifact: &str,
    identity: &SoftwareIdentity,
    keys: &KeyResolver,
) -> Result<Vec<u8>> {
    let encode_err = |message: String| CoswidError::Encode {
        artifact: artifact.to_string(),
        message,
    };

    identity.check().map_err(encode_err)?;
    let value = identity.to_value(keys).map_err(encode_err)?;
    let bytes = codec::encode(artifact, value)?;
    tracing::debug!(
        artifact,
        tag_id = %identity.tag_id,
        bytes = bytes.len(),
        "materialized CoSWID tag"
    );
    Ok(bytes)
}

/// Output path for a materialized template: the template's file stem with a
/// `.cbor` extension, inside `output_dir`.
pub fn output_file_name(output_dir: &Path, template: &Path) -> PathBuf {
    let mut name = template
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "coswid".into());
    name.push(".");
    name.push(CBOR_EXTENSION);
    output_dir.join(name)
}
