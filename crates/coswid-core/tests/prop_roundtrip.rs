//! Property-based tests for the normalization engine.
//!
//! - Key resolution is total: every `i64` resolves, unknown codes to their
//!   decimal form.
//! - Coercion is idempotent on any document it accepts.
//! - Template → CBOR → JSON reproduces the template's fields, with enumerated
//!   names replaced by their codes and hash bytes rendered as base64.
//! - Duplicate keys always resolve to the later entry.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use coswid_core::{
    coerce, Converter, KeyResolver, Normalizer, Value, COSWID_FIELDS, DEFAULT_MAX_DEPTH,
};
use proptest::prelude::*;
use serde_json::{json, Map, Number, Value as Json};

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ._:/-]{1,24}"
}

fn arb_json_leaf() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i64>().prop_map(|n| Json::Number(n.into())),
        (-1_000_000i64..1_000_000i64).prop_map(|n| Json::Number(
            Number::from_f64(n as f64).expect("finite")
        )),
        any::<f64>()
            .prop_filter_map("finite", Number::from_f64)
            .prop_map(Json::Number),
        arb_text().prop_map(Json::String),
        prop::collection::vec(any::<i32>(), 0..4)
            .prop_map(|v| Json::Array(v.into_iter().map(Json::from).collect())),
        arb_text().prop_map(|s| json!({ "fs-name": s })),
    ]
}

fn arb_document() -> impl Strategy<Value = Json> {
    let names: Vec<&'static str> = COSWID_FIELDS.iter().map(|d| d.name).collect();
    prop::collection::vec((prop::sample::select(names), arb_json_leaf()), 0..10).prop_map(
        |pairs| {
            let mut map = Map::new();
            for (k, v) in pairs {
                map.insert(k.to_string(), v);
            }
            Json::Object(map)
        },
    )
}

/// A template plus the normalized document it must produce.
fn arb_template() -> impl Strategy<Value = (Json, Json)> {
    (
        arb_text(),
        arb_text(),
        any::<i64>(),
        proptest::option::of(arb_text()),
        any::<bool>(),
        prop::collection::vec((arb_text(), prop::collection::vec(1i64..=6, 1..3)), 0..3),
        proptest::option::of(prop::collection::vec(any::<u8>(), 0..40)),
    )
        .prop_map(|(tag_id, name, version, sw_version, corpus, entities, digest)| {
            let mut template = Map::new();
            let mut expected = Map::new();

            template.insert("tag-id".into(), json!(tag_id));
            template.insert("software-name".into(), json!(name));
            template.insert("tag-version".into(), json!(version));
            template.insert("corpus".into(), json!(corpus));
            expected.insert("tag-id".into(), json!(tag_id));
            expected.insert("tag-version".into(), json!(version));
            if corpus {
                expected.insert("corpus".into(), json!(true));
            }
            expected.insert("software-name".into(), json!(name));

            if let Some(v) = sw_version {
                template.insert("software-version".into(), json!(v));
                expected.insert("software-version".into(), json!(v));
            }

            if !entities.is_empty() {
                let authored: Vec<Json> = entities
                    .iter()
                    .map(|(n, roles)| json!({"entity-name": n, "role": roles}))
                    .collect();
                let wire: Vec<Json> = entities
                    .iter()
                    .map(|(n, roles)| {
                        let role = if roles.len() == 1 {
                            json!(roles[0])
                        } else {
                            json!(roles)
                        };
                        json!({"entity-name": n, "role": role})
                    })
                    .collect();
                template.insert("entity".into(), Json::Array(authored));
                let wire = if wire.len() == 1 {
                    wire.into_iter().next().expect("one entity")
                } else {
                    Json::Array(wire)
                };
                expected.insert("entity".into(), wire);
            }

            if let Some(bytes) = digest {
                let b64 = STANDARD.encode(&bytes);
                template.insert(
                    "payload".into(),
                    json!({"file": {"fs-name": "f", "hash": {"hash-alg-id": 1, "hash-value": b64}}}),
                );
                expected.insert(
                    "payload".into(),
                    json!({"file": {"fs-name": "f", "hash": [1, b64]}}),
                );
            }

            (Json::Object(template), Json::Object(expected))
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn resolve_is_total(code in any::<i64>()) {
        let resolver = KeyResolver::coswid();
        let name = resolver.resolve(code);
        match COSWID_FIELDS.iter().find(|d| d.code == code) {
            Some(d) => {
                prop_assert_eq!(&*name, d.name);
            }
            None => {
                prop_assert_eq!(name.into_owned(), code.to_string());
            }
        }
    }

    #[test]
    fn coerce_is_idempotent(doc in arb_document()) {
        let resolver = KeyResolver::coswid();
        if let Ok(once) = coerce("prop.cbor", doc, &resolver) {
            let twice = coerce("prop.cbor", once.clone(), &resolver);
            prop_assert!(twice.is_ok());
            prop_assert_eq!(twice.unwrap(), once);
        }
    }

    #[test]
    fn template_roundtrip((template, expected) in arb_template()) {
        let converter = Converter::default();
        let bytes = serde_json::to_vec(&template).unwrap();
        let cbor = converter.create("prop.json", &bytes).unwrap();
        let doc = converter.to_document("prop.cbor", &cbor).unwrap();
        prop_assert_eq!(doc, expected);
    }

    #[test]
    fn duplicate_keys_keep_last(first in arb_text(), second in arb_text(), code in 0i64..60) {
        let resolver = KeyResolver::coswid();
        let name = resolver.resolve(code).into_owned();
        let v = Value::Map(vec![
            (Value::Integer(code), Value::Text(first)),
            (Value::Text(name.clone()), Value::Text(second.clone())),
        ]);
        let out = Normalizer::new(&resolver, DEFAULT_MAX_DEPTH).normalize("prop.cbor", v).unwrap();
        prop_assert_eq!(out, json!({ name: second }));
    }
}
