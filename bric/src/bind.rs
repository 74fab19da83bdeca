//! The paired capabilities every generated type implements: encode to a
//! [`Bric`] and decode from one with a pointer-carrying error.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::pointer::{PathComponent, Pointer};
use crate::value::Bric;

/// Encoding is total; it never fails.
pub trait ToBric {
    fn to_bric(&self) -> Bric;
}

/// Decoding is partial; failures carry the pointer to the offending node.
pub trait FromBric: Sized {
    fn from_bric(value: &Bric) -> Result<Self, BindError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindErrorKind {
    #[error("Missing required property {0:?}")]
    MissingRequired(String),
    #[error("Expected {expected}, found {got}")]
    UnexpectedType { expected: String, got: String },
    #[error("Invalid value {}", .value)]
    InvalidEnumValue { value: Bric },
    #[error("Too few items, expected {expected} but found {got}")]
    TooFewItems { expected: usize, got: usize },
    #[error("Too many items, expected {expected} but found {got}")]
    TooManyItems { expected: usize, got: usize },
    #[error("Additional property {0:?} is forbidden")]
    AdditionalPropertyForbidden(String),
    #[error("Value matched a schema it must not match")]
    NotSchemaMatched,
    #[error("No alternative matched ({} candidates failed)", .causes.len())]
    NoAlternativeMatched { causes: Vec<BindError> },
    #[error("Exactly one alternative must match, but {} did", .matched.len())]
    ExactlyOneViolated { matched: Vec<usize> },
}

/// A decode failure. Components accumulate onto `pointer` as the error
/// travels up through [`BindError::inside`].
#[derive(Debug, Clone, PartialEq)]
pub struct BindError {
    pub kind: BindErrorKind,
    pub pointer: Pointer,
    pub type_name: String,
}

impl BindError {
    pub fn new(kind: BindErrorKind, type_name: impl Into<String>) -> Self {
        BindError {
            kind,
            pointer: Pointer::root(),
            type_name: type_name.into(),
        }
    }

    /// Shifts the error one level deeper: the caller descended through
    /// `component` to reach the value that failed.
    pub fn inside(mut self, component: PathComponent) -> Self {
        self.pointer.prepend(component);
        self
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} of type {}", self.kind, self.pointer, self.type_name)
    }
}

impl std::error::Error for BindError {}

fn type_error(expected: &str, got: &Bric, type_name: &str) -> BindError {
    BindError::new(
        BindErrorKind::UnexpectedType {
            expected: expected.to_string(),
            got: got.kind().to_string(),
        },
        type_name,
    )
}

/// Narrows `value` to an object, reporting against `type_name` otherwise.
pub fn expect_object<'a>(
    value: &'a Bric,
    type_name: &str,
) -> Result<&'a IndexMap<String, Bric>, BindError> {
    value
        .as_obj()
        .ok_or_else(|| type_error("object", value, type_name))
}

/// Narrows `value` to an array, reporting against `type_name` otherwise.
pub fn expect_array<'a>(value: &'a Bric, type_name: &str) -> Result<&'a [Bric], BindError> {
    value
        .as_arr()
        .ok_or_else(|| type_error("array", value, type_name))
}

/// Decodes a required property, threading the key into the error path.
pub fn req_field<T: FromBric>(
    object: &IndexMap<String, Bric>,
    key: &str,
    type_name: &str,
) -> Result<T, BindError> {
    let value = object
        .get(key)
        .ok_or_else(|| BindError::new(BindErrorKind::MissingRequired(key.to_string()), type_name))?;
    T::from_bric(value).map_err(|e| e.inside(PathComponent::key(key)))
}

/// Decodes an optional property: absent and `null` both map to `None`.
pub fn opt_field<T: FromBric>(
    object: &IndexMap<String, Bric>,
    key: &str,
) -> Result<Option<T>, BindError> {
    match object.get(key) {
        None => Ok(None),
        Some(Bric::Null) => Ok(None),
        Some(value) => T::from_bric(value)
            .map(Some)
            .map_err(|e| e.inside(PathComponent::key(key))),
    }
}

/// Rejects the first key of `object` not listed in `known`, pointing at it.
pub fn deny_extras(
    object: &IndexMap<String, Bric>,
    known: &[&str],
    type_name: &str,
) -> Result<(), BindError> {
    for key in object.keys() {
        if !known.contains(&key.as_str()) {
            return Err(BindError::new(
                BindErrorKind::AdditionalPropertyForbidden(key.clone()),
                type_name,
            )
            .inside(PathComponent::key(key.as_str())));
        }
    }
    Ok(())
}

/// Collects every key of `object` not listed in `known` into a typed open
/// mapping, decoding each value.
pub fn collect_extras<T: FromBric>(
    object: &IndexMap<String, Bric>,
    known: &[&str],
) -> Result<IndexMap<String, T>, BindError> {
    let mut extras = IndexMap::new();
    for (key, value) in object {
        if !known.contains(&key.as_str()) {
            let decoded =
                T::from_bric(value).map_err(|e| e.inside(PathComponent::key(key.as_str())))?;
            extras.insert(key.clone(), decoded);
        }
    }
    Ok(extras)
}

impl ToBric for Bric {
    fn to_bric(&self) -> Bric {
        self.clone()
    }
}

impl FromBric for Bric {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        Ok(value.clone())
    }
}

impl ToBric for bool {
    fn to_bric(&self) -> Bric {
        Bric::Bool(*self)
    }
}

impl FromBric for bool {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        value
            .as_bool()
            .ok_or_else(|| type_error("boolean", value, "bool"))
    }
}

impl ToBric for f64 {
    fn to_bric(&self) -> Bric {
        Bric::Num(*self)
    }
}

impl FromBric for f64 {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        value
            .as_num()
            .ok_or_else(|| type_error("number", value, "f64"))
    }
}

impl ToBric for i64 {
    fn to_bric(&self) -> Bric {
        Bric::Num(*self as f64)
    }
}

impl FromBric for i64 {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let n = value
            .as_num()
            .ok_or_else(|| type_error("integer", value, "i64"))?;
        if n.fract() == 0.0 && n.is_finite() {
            Ok(n as i64)
        } else {
            Err(type_error("integer", value, "i64"))
        }
    }
}

impl ToBric for u64 {
    fn to_bric(&self) -> Bric {
        Bric::Num(*self as f64)
    }
}

impl FromBric for u64 {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let n = value
            .as_num()
            .ok_or_else(|| type_error("integer", value, "u64"))?;
        if n.fract() == 0.0 && n.is_finite() && n >= 0.0 {
            Ok(n as u64)
        } else {
            Err(type_error("integer", value, "u64"))
        }
    }
}

impl ToBric for String {
    fn to_bric(&self) -> Bric {
        Bric::Str(self.clone())
    }
}

impl FromBric for String {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error("string", value, "String"))
    }
}

impl ToBric for () {
    fn to_bric(&self) -> Bric {
        Bric::Null
    }
}

impl FromBric for () {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        if value.is_null() {
            Ok(())
        } else {
            Err(type_error("null", value, "()"))
        }
    }
}

impl<T: ToBric> ToBric for Option<T> {
    fn to_bric(&self) -> Bric {
        match self {
            Some(value) => value.to_bric(),
            None => Bric::Null,
        }
    }
}

impl<T: FromBric> FromBric for Option<T> {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_bric(value).map(Some)
        }
    }
}

impl<T: ToBric> ToBric for Box<T> {
    fn to_bric(&self) -> Bric {
        (**self).to_bric()
    }
}

impl<T: FromBric> FromBric for Box<T> {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        T::from_bric(value).map(Box::new)
    }
}

impl<T: ToBric> ToBric for Vec<T> {
    fn to_bric(&self) -> Bric {
        Bric::Arr(self.iter().map(ToBric::to_bric).collect())
    }
}

impl<T: FromBric> FromBric for Vec<T> {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let items = expect_array(value, "Vec")?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_bric(item).map_err(|e| e.inside(PathComponent::index(index)))
            })
            .collect()
    }
}

impl<T: ToBric> ToBric for IndexMap<String, T> {
    fn to_bric(&self) -> Bric {
        Bric::Obj(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_bric()))
                .collect(),
        )
    }
}

impl<T: FromBric> FromBric for IndexMap<String, T> {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = expect_object(value, "Map")?;
        entries
            .iter()
            .map(|(key, value)| {
                T::from_bric(value)
                    .map(|decoded| (key.clone(), decoded))
                    .map_err(|e| e.inside(PathComponent::key(key.as_str())))
            })
            .collect()
    }
}

macro_rules! tuple_bind {
    ($len:expr => $($name:ident $index:tt),+) => {
        impl<$($name: ToBric),+> ToBric for ($($name,)+) {
            fn to_bric(&self) -> Bric {
                Bric::Arr(vec![$(self.$index.to_bric()),+])
            }
        }

        impl<$($name: FromBric),+> FromBric for ($($name,)+) {
            fn from_bric(value: &Bric) -> Result<Self, BindError> {
                let items = expect_array(value, "Tuple")?;
                if items.len() < $len {
                    return Err(BindError::new(
                        BindErrorKind::TooFewItems { expected: $len, got: items.len() },
                        "Tuple",
                    ));
                }
                if items.len() > $len {
                    return Err(BindError::new(
                        BindErrorKind::TooManyItems { expected: $len, got: items.len() },
                        "Tuple",
                    ));
                }
                Ok(($(
                    $name::from_bric(&items[$index])
                        .map_err(|e| e.inside(PathComponent::index($index)))?,
                )+))
            }
        }
    };
}

tuple_bind!(1 => A 0);
tuple_bind!(2 => A 0, B 1);
tuple_bind!(3 => A 0, B 1, C 2);
tuple_bind!(4 => A 0, B 1, C 2, D 3);
tuple_bind!(5 => A 0, B 1, C 2, D 3, E 4);
tuple_bind!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
tuple_bind!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple_bind!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;

    fn parse(text: &str) -> Bric {
        Bric::parse(text, &ParseOptions::strict()).expect("fixture must parse")
    }

    #[test]
    fn test_primitive_round_trips() {
        assert_eq!(bool::from_bric(&true.to_bric()).unwrap(), true);
        assert_eq!(f64::from_bric(&1.5.to_bric()).unwrap(), 1.5);
        assert_eq!(i64::from_bric(&(-7i64).to_bric()).unwrap(), -7);
        assert_eq!(
            String::from_bric(&"hi".to_string().to_bric()).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_integer_rejects_fractional() {
        let err = i64::from_bric(&Bric::Num(1.5)).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::UnexpectedType { .. }));
    }

    #[test]
    fn test_vec_threads_index_into_path() {
        let err = Vec::<i64>::from_bric(&parse(r#"[1, "two", 3]"#)).unwrap_err();
        assert_eq!(err.pointer.to_string(), "#/1");
    }

    #[test]
    fn test_map_threads_key_into_path() {
        let err = IndexMap::<String, bool>::from_bric(&parse(r#"{"ok": true, "bad": 3}"#))
            .unwrap_err();
        assert_eq!(err.pointer.to_string(), "#/bad");
    }

    #[test]
    fn test_tuple_arity_errors() {
        let short = <(f64, String)>::from_bric(&parse("[1]")).unwrap_err();
        assert_eq!(
            short.kind,
            BindErrorKind::TooFewItems { expected: 2, got: 1 }
        );
        let long = <(f64, String)>::from_bric(&parse(r#"[1, "a", true]"#)).unwrap_err();
        assert_eq!(
            long.kind,
            BindErrorKind::TooManyItems { expected: 2, got: 3 }
        );
        let ok = <(f64, String)>::from_bric(&parse(r#"[1, "a"]"#)).unwrap();
        assert_eq!(ok, (1.0, "a".to_string()));
    }

    #[test]
    fn test_error_message_format() {
        let err = BindError::new(
            BindErrorKind::InvalidEnumValue {
                value: Bric::from("BAD"),
            },
            "Prop",
        );
        assert_eq!(err.to_string(), r#"Invalid value "BAD" at # of type Prop"#);

        let nested = BindError::new(
            BindErrorKind::MissingRequired("nested2".to_string()),
            "Nested1",
        )
        .inside(PathComponent::key("nested1"));
        assert_eq!(
            nested.to_string(),
            r#"Missing required property "nested2" at #/nested1 of type Nested1"#
        );
    }

    #[test]
    fn test_req_and_opt_field() {
        let obj = parse(r#"{"a": 1}"#);
        let entries = expect_object(&obj, "T").unwrap();
        assert_eq!(req_field::<f64>(entries, "a", "T").unwrap(), 1.0);
        let err = req_field::<f64>(entries, "b", "T").unwrap_err();
        assert_eq!(err.kind, BindErrorKind::MissingRequired("b".to_string()));
        assert_eq!(opt_field::<f64>(entries, "b").unwrap(), None);
    }

    #[test]
    fn test_deny_and_collect_extras() {
        let obj = parse(r#"{"a": 1, "mystery": true}"#);
        let entries = expect_object(&obj, "T").unwrap();

        let err = deny_extras(entries, &["a"], "T").unwrap_err();
        assert_eq!(
            err.kind,
            BindErrorKind::AdditionalPropertyForbidden("mystery".to_string())
        );
        assert_eq!(err.pointer.to_string(), "#/mystery");

        let extras = collect_extras::<Bric>(entries, &["a"]).unwrap();
        assert_eq!(extras.len(), 1);
        assert_eq!(extras["mystery"], Bric::Bool(true));
    }
}
