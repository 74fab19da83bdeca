#![cfg(test)]

use bricolage::{
    generate_rust, CodeDecl, CompileError, ReifyErrorKind, ReifyOptions,
};

#[test]
fn test_generate_full_schema() {
    let input = r##"
    {
        "title": "A single tracked shipment",
        "type": "object",
        "required": ["id", "status"],
        "properties": {
            "id": {"type": "string"},
            "status": {"type": "string", "enum": ["pending", "shipped", "delivered"]},
            "weight": {"type": "number"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "origin": {"$ref": "#/definitions/address"},
            "parent": {"$ref": "#"}
        },
        "additionalProperties": false,
        "definitions": {
            "address": {
                "type": "object",
                "required": ["street"],
                "properties": {
                    "street": {"type": "string"},
                    "unit": {"type": "string"}
                }
            }
        }
    }
    "##;

    let source = generate_rust(input, "Shipment", &ReifyOptions::default()).unwrap();

    // declarations, in insertion order
    let struct_at = source.find("pub struct Shipment {").unwrap();
    let enum_at = source.find("pub enum Status {").unwrap();
    let address_at = source.find("pub struct Address {").unwrap();
    assert!(struct_at < enum_at);
    assert!(enum_at < address_at);

    // field typing
    assert!(source.contains("    pub id: String,"));
    assert!(source.contains("    pub status: Status,"));
    assert!(source.contains("    pub weight: Option<f64>,"));
    assert!(source.contains("    pub tags: Option<Vec<String>>,"));
    assert!(source.contains("    pub origin: Option<Address>,"));
    // self reference is value-sized, so it gets boxed
    assert!(source.contains("    pub parent: Option<Box<Shipment>>,"));

    // closed object rejects unknown keys
    assert!(source.contains(r#"bind::deny_extras(entries"#));

    // enum decode reports the stray literal
    assert!(source.contains("BindErrorKind::InvalidEnumValue"));

    // doc comment came through
    assert!(source.contains("/// A single tracked shipment"));
}

#[test]
fn test_generate_is_deterministic() {
    let input = r#"
    {
        "type": "object",
        "properties": {
            "mode": {"enum": ["on", "off"]},
            "values": {"type": "array", "items": {"oneOf": [{"type": "string"}, {"type": "number"}]}}
        }
    }
    "#;
    let first = generate_rust(input, "Config", &ReifyOptions::default()).unwrap();
    let second = generate_rust(input, "Config", &ReifyOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parse_errors_surface() {
    let err = generate_rust("{not json", "Broken", &ReifyOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn test_bind_errors_surface() {
    let err = generate_rust(r#"{"type": 42}"#, "Broken", &ReifyOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Bind(_)));
}

#[test]
fn test_reify_errors_surface() {
    let err = generate_rust(
        r##"{"properties": {"p": {"$ref": "#/definitions/missing"}}}"##,
        "Broken",
        &ReifyOptions::default(),
    )
    .unwrap_err();
    match err {
        CompileError::Reify(reify) => {
            assert_eq!(reify.kind, ReifyErrorKind::UnresolvedRef);
            assert_eq!(reify.path.to_string(), "#/properties/p");
        }
        other => panic!("expected reify error, got {:?}", other),
    }
}

#[test]
fn test_reify_module_shape() {
    use bricolage::{decode_schema, reify_module, Bric, ParseOptions};

    let doc = Bric::parse(
        r#"{"type": "object", "properties": {"x": {"type": "number"}}}"#,
        &ParseOptions::strict(),
    )
    .unwrap();
    let schema = decode_schema(&doc).unwrap();
    let module = reify_module(&schema, "Point", &ReifyOptions::default()).unwrap();
    assert_eq!(module.types.len(), 1);
    match &module.types[0] {
        CodeDecl::Struct { name, fields, .. } => {
            assert_eq!(name, "Point");
            assert_eq!(fields.len(), 1);
        }
        other => panic!("expected struct, got {:?}", other),
    }
}
