use coswid_core::codec;
use coswid_core::{Converter, CoswidError, Options, Value};
use serde_json::json;

/// Assert that template → CBOR → normalized JSON yields `expected`.
fn assert_roundtrip(template: &str, expected: serde_json::Value) {
    let converter = Converter::default();
    let cbor = converter
        .create("tmpl.json", template.as_bytes())
        .expect("create failed");
    let doc = converter
        .to_document("tmpl.cbor", &cbor)
        .expect("to_document failed");
    assert_eq!(
        doc, expected,
        "Roundtrip mismatch:\n  template: {template}\n  document: {doc}"
    );
}

fn cbor_of(v: Value) -> Vec<u8> {
    codec::encode("fixture", v).expect("encode failed")
}

// ============================================================================
// Template → CBOR → JSON
// ============================================================================

#[test]
fn minimal_template() {
    assert_roundtrip(
        r#"{"tag-id":"t-1","software-name":"demo","tag-version":0}"#,
        json!({"tag-id": "t-1", "tag-version": 0, "software-name": "demo"}),
    );
}

#[test]
fn minimal_template_keeps_integer_tag_version() {
    let converter = Converter::default();
    let cbor = converter
        .create("t", br#"{"tag-id":"t-1","software-name":"demo","tag-version":0}"#)
        .unwrap();
    let doc = converter.to_document("t", &cbor).unwrap();
    assert!(doc["tag-version"].is_i64());
    assert!(serde_json::to_string(&doc).unwrap().contains(r#""tag-version":0"#));
}

#[test]
fn full_template() {
    let template = r#"{
        "tag-id": "example.acme.roadrunner-sw-v1-0-0",
        "tag-version": 1,
        "software-name": "Roadrunner software bundle",
        "software-version": "1.0.0",
        "version-scheme": "semver",
        "entity": [
            {"entity-name": "ACME Ltd", "reg-id": "acme.example", "role": ["tagCreator", "softwareCreator"]},
            {"entity-name": "Coyote Inc", "role": "aggregator"}
        ],
        "link": {"href": "https://acme.example/roadrunner", "rel": "see-also"},
        "software-meta": {"product": "Roadrunner", "entitlement-data-required": false},
        "payload": {
            "file": {"fs-name": "roadrunner.bin", "size": 1024,
                     "hash": {"hash-alg-id": 1, "hash-value": "AQIDBA=="}}
        },
        "lang": "en-US"
    }"#;
    assert_roundtrip(
        template,
        json!({
            "tag-id": "example.acme.roadrunner-sw-v1-0-0",
            "tag-version": 1,
            "software-name": "Roadrunner software bundle",
            "software-version": "1.0.0",
            "version-scheme": 16384,
            "software-meta": {"entitlement-data-required": false, "product": "Roadrunner"},
            "entity": [
                {"entity-name": "ACME Ltd", "reg-id": "acme.example", "role": [1, 2]},
                {"entity-name": "Coyote Inc", "role": 3}
            ],
            "link": {"href": "https://acme.example/roadrunner", "rel": 9},
            "payload": {
                "file": {"fs-name": "roadrunner.bin", "size": 1024, "hash": [1, "AQIDBA=="]}
            },
            "lang": "en-US"
        }),
    );
}

#[test]
fn evidence_template() {
    assert_roundtrip(
        r#"{"tag-id":"e","software-name":"agent",
            "evidence":{"date":"2021-06-01T00:00:00Z","device-id":"dev-7",
                        "process":[{"process-name":"agentd","pid":42},{"pid":43}],
                        "resource":{"type":"license"}}}"#,
        json!({
            "tag-id": "e",
            "tag-version": 0,
            "software-name": "agent",
            "evidence": {
                "process": [{"process-name": "agentd", "pid": 42}, {"pid": 43}],
                "resource": {"type": "license"},
                "date": "2021-06-01T00:00:00Z",
                "device-id": "dev-7"
            }
        }),
    );
}

#[test]
fn custom_evidence_record_survives() {
    assert_roundtrip(
        r#"{"tag-id":"t","software-name":"d","evidence":{"type":"test","value":"test"}}"#,
        json!({
            "tag-id": "t",
            "tag-version": 0,
            "software-name": "d",
            "evidence": {"type": "test", "value": "test"}
        }),
    );
}

#[test]
fn custom_evidence_sits_beside_resources() {
    assert_roundtrip(
        r#"{"tag-id":"t","software-name":"d",
            "evidence":{"value":"quote-1","date":"2021-06-01T00:00:00Z","process":{"pid":7}}}"#,
        json!({
            "tag-id": "t",
            "tag-version": 0,
            "software-name": "d",
            "evidence": {"process": {"pid": 7}, "date": "2021-06-01T00:00:00Z", "value": "quote-1"}
        }),
    );
}

#[test]
fn display_is_two_space_pretty_json() {
    let converter = Converter::default();
    let cbor = converter
        .create("t", br#"{"tag-id":"t-1","software-name":"demo"}"#)
        .unwrap();
    let text = converter.display("t.cbor", &cbor).unwrap();
    assert_eq!(
        text,
        "{\n  \"tag-id\": \"t-1\",\n  \"tag-version\": 0,\n  \"software-name\": \"demo\"\n}"
    );
}

// ============================================================================
// Binary input produced elsewhere
// ============================================================================

#[test]
fn float_tag_version_coerces_to_integer() {
    let cbor = cbor_of(Value::int_map(vec![
        (0, Value::text("t-1")),
        (1, Value::text("demo")),
        (12, Value::Float(2.0)),
    ]));
    let doc = Converter::default().to_document("f.cbor", &cbor).unwrap();
    assert_eq!(doc["tag-version"], json!(2));
    assert!(doc["tag-version"].is_i64());
}

#[test]
fn text_tag_version_is_a_type_mismatch() {
    let cbor = cbor_of(Value::int_map(vec![
        (0, Value::text("t-1")),
        (1, Value::text("demo")),
        (12, Value::text("2")),
    ]));
    let err = Converter::default().to_document("mytag.cbor", &cbor).unwrap_err();
    assert!(matches!(
        err,
        CoswidError::TypeMismatch { ref artifact, ref field, found: "string", .. }
            if artifact == "mytag.cbor" && field == "tag-version"
    ));
    assert!(err.to_string().contains("mytag.cbor"), "{err}");
}

#[test]
fn byte_string_tag_id_is_base64() {
    let uuid = vec![0x5a; 16];
    let cbor = cbor_of(Value::int_map(vec![
        (0, Value::Bytes(uuid)),
        (1, Value::text("demo")),
    ]));
    let doc = Converter::default().to_document("u.cbor", &cbor).unwrap();
    assert_eq!(doc["tag-id"], json!("WlpaWlpaWlpaWlpaWlpaWg=="));
}

#[test]
fn tagged_coswid_is_unwrapped() {
    let inner = ciborium::value::Value::Map(vec![(
        ciborium::value::Value::Integer(0.into()),
        ciborium::value::Value::Text("t".into()),
    )]);
    let tagged = ciborium::value::Value::Tag(1398229316, Box::new(inner));
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(&tagged, &mut cbor).unwrap();

    let doc = Converter::default().to_document("tagged.cbor", &cbor).unwrap();
    assert_eq!(doc, json!({"tag-id": "t"}));
}

#[test]
fn original_tool_fixture_decodes() {
    // {1: 2}: software-name holding an integer.
    let err = Converter::default()
        .to_document("test.cbor", &[0xa1, 0x01, 0x02])
        .unwrap_err();
    assert!(matches!(err, CoswidError::TypeMismatch { .. }));
}

#[test]
fn unknown_keys_survive_as_decimal_names() {
    let cbor = cbor_of(Value::int_map(vec![(0, Value::text("t")), (1000, Value::Integer(5))]));
    let doc = Converter::default().to_document("x.cbor", &cbor).unwrap();
    assert_eq!(doc, json!({"tag-id": "t", "1000": 5}));
}

// ============================================================================
// Decode failures
// ============================================================================

#[test]
fn garbage_is_a_decode_error() {
    let err = Converter::default()
        .to_document("bad.cbor", &[0xff, 0x00])
        .unwrap_err();
    assert!(matches!(err, CoswidError::Decode { ref artifact, .. } if artifact == "bad.cbor"));
}

#[test]
fn empty_input_is_a_decode_error() {
    assert!(matches!(
        Converter::default().to_document("empty.cbor", &[]),
        Err(CoswidError::Decode { .. })
    ));
}

#[test]
fn non_map_root_is_a_decode_error() {
    let cbor = cbor_of(Value::Array(vec![Value::Integer(1)]));
    assert!(matches!(
        Converter::default().to_document("arr.cbor", &cbor),
        Err(CoswidError::Decode { .. })
    ));
}

#[test]
fn depth_option_is_honoured() {
    let deep = Value::int_map(vec![(
        6,
        Value::int_map(vec![(17, Value::int_map(vec![(7, Value::Array(vec![]))]))]),
    )]);
    let cbor = cbor_of(deep);

    let shallow = Converter::new(Options { max_depth: 3 });
    assert!(matches!(
        shallow.to_document("d.cbor", &cbor),
        Err(CoswidError::StructureTooDeep { max_depth: 3, .. })
    ));
    let roomy = Converter::new(Options { max_depth: 4 });
    assert!(roomy.to_document("d.cbor", &cbor).is_ok());
}
