//! # coswid-core
//!
//! Materialization and normalization of **CoSWID** (Concise Software
//! Identification, RFC 9393) tags.
//!
//! A CoSWID tag travels as a CBOR map keyed by small integers. This crate
//! converts in both directions:
//!
//! - **Write path**: an author-facing JSON template is parsed into a typed
//!   identity model and encoded as CBOR.
//! - **Read path**: CBOR bytes are decoded into a [`Value`] tree, normalized
//!   into name-keyed JSON (integer keys resolved, byte strings base64-encoded),
//!   and well-known fields are type-checked so the document can be handed to a
//!   JSON-schema evaluator.
//!
//! ## Quick start
//!
//! ```rust
//! use coswid_core::Converter;
//!
//! let converter = Converter::default();
//!
//! // JSON template → CBOR
//! let template = br#"{"tag-id":"t-1","software-name":"demo","tag-version":0}"#;
//! let cbor = converter.create("t1.json", template).unwrap();
//!
//! // CBOR → normalized JSON
//! let doc = converter.to_document("t1.cbor", &cbor).unwrap();
//! assert_eq!(doc["tag-id"], "t-1");
//! assert_eq!(doc["tag-version"], 0);
//! ```
//!
//! ## Modules
//!
//! - [`value`]: decoded CBOR value tree
//! - [`keys`]: field descriptor table and integer-key resolver
//! - [`normalizer`]: `Value` → name-keyed JSON
//! - [`coercer`]: type checks for well-known top-level fields
//! - [`identity`]: typed template model and its lowering to `Value`
//! - [`codec`]: CBOR encode/decode
//! - [`materializer`]: JSON template → CBOR bytes
//! - [`schema`]: JSON-schema validation of normalized documents
//! - [`pipeline`]: per-artifact create/display/validate operations
//! - [`error`]: error types

pub mod codec;
pub mod coercer;
pub mod error;
pub mod identity;
pub mod keys;
pub mod materializer;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod value;

pub use coercer::coerce;
pub use error::{CoswidError, Violation};
pub use identity::SoftwareIdentity;
pub use keys::{FieldDescriptor, FieldKind, KeyResolver, COSWID_FIELDS};
pub use materializer::{materialize, output_file_name};
pub use normalizer::{Normalizer, DEFAULT_MAX_DEPTH};
pub use pipeline::{Converter, Options};
pub use schema::SchemaValidator;
pub use value::Value;
