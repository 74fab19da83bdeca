#![cfg(test)]

//! Exercises the bind contracts through hand-written impls shaped exactly
//! like emitter output, against literal JSON inputs.

use bric::bind;
use bric::{BindError, BindErrorKind, Bric, FromBric, ParseOptions, ToBric};
use indexmap::IndexMap;

fn parse(text: &str) -> Bric {
    Bric::parse(text, &ParseOptions::strict()).expect("fixture must parse")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Prop {
    Value,
}

impl ToBric for Prop {
    fn to_bric(&self) -> Bric {
        match self {
            Prop::Value => Bric::Str("value".to_string()),
        }
    }
}

impl FromBric for Prop {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        if *value == Bric::Str("value".to_string()) {
            return Ok(Prop::Value);
        }
        Err(BindError::new(
            BindErrorKind::InvalidEnumValue { value: value.clone() },
            "Prop",
        ))
    }
}

#[test]
fn test_enum_case_mismatch() {
    assert_eq!(Prop::from_bric(&parse(r#""value""#)).unwrap(), Prop::Value);

    let err = Prop::from_bric(&parse(r#""BAD""#)).unwrap_err();
    assert_eq!(err.to_string(), r#"Invalid value "BAD" at # of type Prop"#);
}

macro_rules! nesting_level {
    ($name:ident, $key:literal, $field:ident: $inner:ty) => {
        #[derive(Debug, Clone, PartialEq)]
        struct $name {
            $field: $inner,
        }

        impl ToBric for $name {
            fn to_bric(&self) -> Bric {
                let mut entries = IndexMap::new();
                entries.insert($key.to_string(), self.$field.to_bric());
                Bric::Obj(entries)
            }
        }

        impl FromBric for $name {
            fn from_bric(value: &Bric) -> Result<Self, BindError> {
                let entries = bind::expect_object(value, stringify!($name))?;
                Ok($name {
                    $field: bind::req_field(entries, $key, stringify!($name))?,
                })
            }
        }
    };
}

nesting_level!(Nested5, "single", single: Prop);
nesting_level!(Nested4, "nested5", nested5: Nested5);
nesting_level!(Nested3, "nested4", nested4: Nested4);
nesting_level!(Nested2, "nested3", nested3: Nested3);
nesting_level!(Nested1, "nested2", nested2: Nested2);
nesting_level!(Outer, "nested1", nested1: Nested1);

#[test]
fn test_missing_required_nested_property() {
    let err = Outer::from_bric(&parse(r#"{"nested1": {}}"#)).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Missing required property "nested2" at #/nested1 of type Nested1"#
    );
}

#[test]
fn test_deeply_nested_error_path() {
    let input = parse(
        r#"{"nested1": {"nested2": {"nested3": {"nested4": {"nested5": {"single": "WRONG"}}}}}}"#,
    );
    let err = Outer::from_bric(&input).unwrap_err();
    assert_eq!(
        err.pointer.to_string(),
        "#/nested1/nested2/nested3/nested4/nested5/single"
    );
    assert_eq!(
        err.to_string(),
        r#"Invalid value "WRONG" at #/nested1/nested2/nested3/nested4/nested5/single of type Prop"#
    );

    let ok = Outer::from_bric(&parse(
        r#"{"nested1": {"nested2": {"nested3": {"nested4": {"nested5": {"single": "value"}}}}}}"#,
    ))
    .unwrap();
    assert_eq!(
        ok.nested1.nested2.nested3.nested4.nested5.single,
        Prop::Value
    );
}

#[derive(Debug, Clone, PartialEq)]
enum StringOrNumber {
    Choice1(String),
    Choice2(f64),
}

impl ToBric for StringOrNumber {
    fn to_bric(&self) -> Bric {
        match self {
            StringOrNumber::Choice1(value) => value.to_bric(),
            StringOrNumber::Choice2(value) => value.to_bric(),
        }
    }
}

impl FromBric for StringOrNumber {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let mut causes = Vec::new();
        let mut matched = Vec::new();
        let mut result = None;
        match <String as FromBric>::from_bric(value) {
            Ok(decoded) => {
                if result.is_none() {
                    result = Some(StringOrNumber::Choice1(decoded));
                }
                matched.push(0usize);
            }
            Err(cause) => causes.push(cause),
        }
        match <f64 as FromBric>::from_bric(value) {
            Ok(decoded) => {
                if result.is_none() {
                    result = Some(StringOrNumber::Choice2(decoded));
                }
                matched.push(1usize);
            }
            Err(cause) => causes.push(cause),
        }
        if matched.len() > 1 {
            return Err(BindError::new(
                BindErrorKind::ExactlyOneViolated { matched },
                "StringOrNumber",
            ));
        }
        match result {
            Some(decoded) => Ok(decoded),
            None => Err(BindError::new(
                BindErrorKind::NoAlternativeMatched { causes },
                "StringOrNumber",
            )),
        }
    }
}

#[test]
fn test_one_of_resolution() {
    assert_eq!(
        StringOrNumber::from_bric(&parse("1")).unwrap(),
        StringOrNumber::Choice2(1.0)
    );
    assert_eq!(
        StringOrNumber::from_bric(&parse(r#""x""#)).unwrap(),
        StringOrNumber::Choice1("x".to_string())
    );

    let err = StringOrNumber::from_bric(&parse("true")).unwrap_err();
    match err.kind {
        BindErrorKind::NoAlternativeMatched { causes } => assert_eq!(causes.len(), 2),
        other => panic!("expected NoAlternativeMatched, got {:?}", other),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum IntegerOrNumber {
    Choice1(i64),
    Choice2(f64),
}

impl FromBric for IntegerOrNumber {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let mut causes = Vec::new();
        let mut matched = Vec::new();
        let mut result = None;
        match <i64 as FromBric>::from_bric(value) {
            Ok(decoded) => {
                if result.is_none() {
                    result = Some(IntegerOrNumber::Choice1(decoded));
                }
                matched.push(0usize);
            }
            Err(cause) => causes.push(cause),
        }
        match <f64 as FromBric>::from_bric(value) {
            Ok(decoded) => {
                if result.is_none() {
                    result = Some(IntegerOrNumber::Choice2(decoded));
                }
                matched.push(1usize);
            }
            Err(cause) => causes.push(cause),
        }
        if matched.len() > 1 {
            return Err(BindError::new(
                BindErrorKind::ExactlyOneViolated { matched },
                "IntegerOrNumber",
            ));
        }
        match result {
            Some(decoded) => Ok(decoded),
            None => Err(BindError::new(
                BindErrorKind::NoAlternativeMatched { causes },
                "IntegerOrNumber",
            )),
        }
    }
}

#[test]
fn test_one_of_exactly_one_violated() {
    // an integer satisfies both alternatives
    let err = IntegerOrNumber::from_bric(&parse("1")).unwrap_err();
    assert_eq!(
        err.kind,
        BindErrorKind::ExactlyOneViolated { matched: vec![0, 1] }
    );
    // a fractional number satisfies only the second
    assert_eq!(
        IntegerOrNumber::from_bric(&parse("1.5")).unwrap(),
        IntegerOrNumber::Choice2(1.5)
    );
}

#[derive(Debug, Clone, PartialEq)]
struct ById {
    id: String,
    version: f64,
}

impl ToBric for ById {
    fn to_bric(&self) -> Bric {
        let mut entries = IndexMap::new();
        entries.insert("id".to_string(), self.id.to_bric());
        entries.insert("version".to_string(), self.version.to_bric());
        Bric::Obj(entries)
    }
}

impl FromBric for ById {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = bind::expect_object(value, "ById")?;
        Ok(ById {
            id: bind::req_field(entries, "id", "ById")?,
            version: bind::req_field(entries, "version", "ById")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ByName {
    name: String,
    realm: String,
}

impl ToBric for ByName {
    fn to_bric(&self) -> Bric {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), self.name.to_bric());
        entries.insert("realm".to_string(), self.realm.to_bric());
        Bric::Obj(entries)
    }
}

impl FromBric for ByName {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = bind::expect_object(value, "ByName")?;
        Ok(ByName {
            name: bind::req_field(entries, "name", "ByName")?,
            realm: bind::req_field(entries, "realm", "ByName")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lookup {
    ById(ById),
    ByName(ByName),
}

impl ToBric for Lookup {
    fn to_bric(&self) -> Bric {
        match self {
            Lookup::ById(value) => value.to_bric(),
            Lookup::ByName(value) => value.to_bric(),
        }
    }
}

impl FromBric for Lookup {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let mut causes = Vec::new();
        match <ById as FromBric>::from_bric(value) {
            Ok(decoded) => return Ok(Lookup::ById(decoded)),
            Err(cause) => causes.push(cause),
        }
        match <ByName as FromBric>::from_bric(value) {
            Ok(decoded) => return Ok(Lookup::ByName(decoded)),
            Err(cause) => causes.push(cause),
        }
        Err(BindError::new(
            BindErrorKind::NoAlternativeMatched { causes },
            "Lookup",
        ))
    }
}

#[test]
fn test_any_of_partial() {
    // the full required pair of one branch decodes
    let ok = Lookup::from_bric(&parse(r#"{"name": "a", "realm": "b"}"#)).unwrap();
    assert_eq!(
        ok,
        Lookup::ByName(ByName {
            name: "a".to_string(),
            realm: "b".to_string()
        })
    );

    // half of each branch satisfies neither; every cause is reported
    let err = Lookup::from_bric(&parse(r#"{"id": "a", "name": "b"}"#)).unwrap_err();
    match err.kind {
        BindErrorKind::NoAlternativeMatched { causes } => {
            assert_eq!(causes.len(), 2);
            assert_eq!(
                causes[0].kind,
                BindErrorKind::MissingRequired("version".to_string())
            );
            assert_eq!(
                causes[1].kind,
                BindErrorKind::MissingRequired("realm".to_string())
            );
        }
        other => panic!("expected NoAlternativeMatched, got {:?}", other),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Closed {
    name: String,
}

impl ToBric for Closed {
    fn to_bric(&self) -> Bric {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), self.name.to_bric());
        Bric::Obj(entries)
    }
}

impl FromBric for Closed {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = bind::expect_object(value, "Closed")?;
        bind::deny_extras(entries, &["name"], "Closed")?;
        Ok(Closed {
            name: bind::req_field(entries, "name", "Closed")?,
        })
    }
}

#[test]
fn test_additional_properties_forbidden() {
    assert!(Closed::from_bric(&parse(r#"{"name": "ok"}"#)).is_ok());

    let err = Closed::from_bric(&parse(r#"{"name": "ok", "sneaky": 1}"#)).unwrap_err();
    assert_eq!(
        err.kind,
        BindErrorKind::AdditionalPropertyForbidden("sneaky".to_string())
    );
    assert_eq!(err.pointer.to_string(), "#/sneaky");
}

#[derive(Debug, Clone, PartialEq)]
struct Open {
    name: String,
    additional_properties: IndexMap<String, Bric>,
}

impl ToBric for Open {
    fn to_bric(&self) -> Bric {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), self.name.to_bric());
        for (key, value) in &self.additional_properties {
            entries.insert(key.clone(), value.to_bric());
        }
        Bric::Obj(entries)
    }
}

impl FromBric for Open {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = bind::expect_object(value, "Open")?;
        Ok(Open {
            name: bind::req_field(entries, "name", "Open")?,
            additional_properties: bind::collect_extras(entries, &["name"])?,
        })
    }
}

#[test]
fn test_open_struct_captures_extras() {
    let input = parse(r#"{"name": "ok", "color": "red", "rank": 3}"#);
    let open = Open::from_bric(&input).unwrap();
    assert_eq!(open.additional_properties.len(), 2);
    assert_eq!(open.additional_properties["color"], Bric::from("red"));
}

#[test]
fn test_round_trip_fidelity() {
    // encode(decode(b)) == b for every scenario input that decodes
    let inputs = [
        r#""value""#,
        r#"{"nested1": {"nested2": {"nested3": {"nested4": {"nested5": {"single": "value"}}}}}}"#,
        r#"{"name": "a", "realm": "b"}"#,
        r#"{"name": "ok"}"#,
        r#"{"name": "ok", "color": "red", "rank": 3}"#,
    ];

    let b = parse(inputs[0]);
    assert_eq!(Prop::from_bric(&b).unwrap().to_bric(), b);

    let b = parse(inputs[1]);
    assert_eq!(Outer::from_bric(&b).unwrap().to_bric(), b);

    let b = parse(inputs[2]);
    assert_eq!(Lookup::from_bric(&b).unwrap().to_bric(), b);

    let b = parse(inputs[3]);
    assert_eq!(Closed::from_bric(&b).unwrap().to_bric(), b);

    let b = parse(inputs[4]);
    assert_eq!(Open::from_bric(&b).unwrap().to_bric(), b);

    // decode(encode(v)) == v from the other side
    let lookup = Lookup::ById(ById {
        id: "x".to_string(),
        version: 2.0,
    });
    assert_eq!(Lookup::from_bric(&lookup.to_bric()).unwrap(), lookup);
}
