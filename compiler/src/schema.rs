//! A typed, decoded representation of a JSON Schema document (draft-04
//! keywords the reifier understands).
//!
//! `Schema` implements the bind contracts by hand; this is the bootstrapped
//! model of exactly the code the emitter generates for user schemas.

use bric::bind::expect_object;
use bric::{BindError, BindErrorKind, Bric, FromBric, PathComponent, ToBric};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SimpleType {
    pub fn as_str(self) -> &'static str {
        match self {
            SimpleType::Null => "null",
            SimpleType::Boolean => "boolean",
            SimpleType::Integer => "integer",
            SimpleType::Number => "number",
            SimpleType::String => "string",
            SimpleType::Array => "array",
            SimpleType::Object => "object",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(SimpleType::Null),
            "boolean" => Some(SimpleType::Boolean),
            "integer" => Some(SimpleType::Integer),
            "number" => Some(SimpleType::Number),
            "string" => Some(SimpleType::String),
            "array" => Some(SimpleType::Array),
            "object" => Some(SimpleType::Object),
            _ => None,
        }
    }
}

impl ToBric for SimpleType {
    fn to_bric(&self) -> Bric {
        Bric::Str(self.as_str().to_string())
    }
}

impl FromBric for SimpleType {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let name = String::from_bric(value)?;
        SimpleType::from_name(&name).ok_or_else(|| {
            BindError::new(
                BindErrorKind::InvalidEnumValue {
                    value: value.clone(),
                },
                "SimpleType",
            )
        })
    }
}

/// A keyword that accepts either a single value or a list of them,
/// remembering which spelling the document used.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ToBric> ToBric for OneOrMany<T> {
    fn to_bric(&self) -> Bric {
        match self {
            OneOrMany::One(value) => value.to_bric(),
            OneOrMany::Many(values) => values.to_bric(),
        }
    }
}

impl<T: FromBric> FromBric for OneOrMany<T> {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        match value {
            Bric::Arr(_) => Vec::<T>::from_bric(value).map(OneOrMany::Many),
            _ => T::from_bric(value).map(OneOrMany::One),
        }
    }
}

/// The `additionalProperties` keyword: a blanket allow/forbid or a schema
/// for the open property set.
#[derive(Debug, Clone, PartialEq)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl ToBric for Additional {
    fn to_bric(&self) -> Bric {
        match self {
            Additional::Allowed(allowed) => Bric::Bool(*allowed),
            Additional::Schema(schema) => schema.to_bric(),
        }
    }
}

impl FromBric for Additional {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        match value {
            Bric::Bool(allowed) => Ok(Additional::Allowed(*allowed)),
            Bric::Obj(_) => Schema::from_bric(value).map(|s| Additional::Schema(Box::new(s))),
            other => Err(BindError::new(
                BindErrorKind::UnexpectedType {
                    expected: "boolean or schema".to_string(),
                    got: other.kind().to_string(),
                },
                "Additional",
            )),
        }
    }
}

/// The `items` keyword: one schema for every element, or one per position.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    One(Box<Schema>),
    Tuple(Vec<Schema>),
}

impl ToBric for Items {
    fn to_bric(&self) -> Bric {
        match self {
            Items::One(schema) => schema.to_bric(),
            Items::Tuple(schemas) => schemas.to_bric(),
        }
    }
}

impl FromBric for Items {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        match value {
            Bric::Arr(_) => Vec::<Schema>::from_bric(value).map(Items::Tuple),
            Bric::Obj(_) => Schema::from_bric(value).map(|s| Items::One(Box::new(s))),
            other => Err(BindError::new(
                BindErrorKind::UnexpectedType {
                    expected: "schema or array of schemas".to_string(),
                    got: other.kind().to_string(),
                },
                "Items",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub id:          Option<String>,
    pub reference:   Option<String>,
    pub title:       Option<String>,
    pub description: Option<String>,
    pub types:       Option<OneOrMany<SimpleType>>,
    pub required:    Vec<String>,
    pub properties:  IndexMap<String, Schema>,
    pub additional:  Option<Additional>,
    pub items:       Option<Items>,
    pub enum_values: Option<Vec<Bric>>,
    pub const_value: Option<Bric>,
    pub all_of:      Option<Vec<Schema>>,
    pub any_of:      Option<Vec<Schema>>,
    pub one_of:      Option<Vec<Schema>>,
    pub not:         Option<Box<Schema>>,
    pub definitions: IndexMap<String, Schema>,
    pub min_items:   Option<u64>,
    pub max_items:   Option<u64>,
    pub default:     Option<Bric>,
    /// Keywords the reifier does not understand, preserved verbatim.
    pub extensions:  IndexMap<String, Bric>,
}

impl Schema {
    /// The single type named by `type`, when there is exactly one.
    pub fn single_type(&self) -> Option<SimpleType> {
        match &self.types {
            Some(types) if types.len() == 1 => types.first().copied(),
            _ => None,
        }
    }

    pub fn has_type(&self, ty: SimpleType) -> bool {
        self.types
            .as_ref()
            .map_or(false, |types| types.iter().any(|t| *t == ty))
    }

    /// A schema is object-shaped when it names the object type or lists
    /// properties, even without an explicit `type`.
    pub fn is_object_shaped(&self) -> bool {
        self.has_type(SimpleType::Object) || !self.properties.is_empty()
    }
}

/// Decodes a parsed schema document into the typed model.
pub fn decode_schema(value: &Bric) -> Result<Schema, BindError> {
    Schema::from_bric(value)
}

impl FromBric for Schema {
    fn from_bric(value: &Bric) -> Result<Self, BindError> {
        let entries = expect_object(value, "Schema")?;
        let mut schema = Schema::default();
        for (key, value) in entries {
            let inside = |e: BindError| e.inside(PathComponent::key(key.as_str()));
            match key.as_str() {
                "id" => schema.id = Some(String::from_bric(value).map_err(inside)?),
                "$ref" => schema.reference = Some(String::from_bric(value).map_err(inside)?),
                "title" => schema.title = Some(String::from_bric(value).map_err(inside)?),
                "description" => {
                    schema.description = Some(String::from_bric(value).map_err(inside)?)
                }
                "type" => schema.types = Some(OneOrMany::from_bric(value).map_err(inside)?),
                "required" => schema.required = Vec::from_bric(value).map_err(inside)?,
                "properties" => schema.properties = IndexMap::from_bric(value).map_err(inside)?,
                "additionalProperties" => {
                    schema.additional = Some(Additional::from_bric(value).map_err(inside)?)
                }
                "items" => schema.items = Some(Items::from_bric(value).map_err(inside)?),
                "enum" => schema.enum_values = Some(Vec::from_bric(value).map_err(inside)?),
                "const" => schema.const_value = Some(value.clone()),
                "allOf" => schema.all_of = Some(Vec::from_bric(value).map_err(inside)?),
                "anyOf" => schema.any_of = Some(Vec::from_bric(value).map_err(inside)?),
                "oneOf" => schema.one_of = Some(Vec::from_bric(value).map_err(inside)?),
                "not" => schema.not = Some(Box::from_bric(value).map_err(inside)?),
                "definitions" => {
                    schema.definitions = IndexMap::from_bric(value).map_err(inside)?
                }
                "minItems" => schema.min_items = Some(u64::from_bric(value).map_err(inside)?),
                "maxItems" => schema.max_items = Some(u64::from_bric(value).map_err(inside)?),
                "default" => schema.default = Some(value.clone()),
                _ => {
                    schema.extensions.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(schema)
    }
}

impl ToBric for Schema {
    fn to_bric(&self) -> Bric {
        let mut entries = IndexMap::new();
        if let Some(id) = &self.id {
            entries.insert("id".to_string(), id.to_bric());
        }
        if let Some(reference) = &self.reference {
            entries.insert("$ref".to_string(), reference.to_bric());
        }
        if let Some(title) = &self.title {
            entries.insert("title".to_string(), title.to_bric());
        }
        if let Some(description) = &self.description {
            entries.insert("description".to_string(), description.to_bric());
        }
        if let Some(types) = &self.types {
            entries.insert("type".to_string(), types.to_bric());
        }
        if !self.required.is_empty() {
            entries.insert("required".to_string(), self.required.to_bric());
        }
        if !self.properties.is_empty() {
            entries.insert("properties".to_string(), self.properties.to_bric());
        }
        if let Some(additional) = &self.additional {
            entries.insert("additionalProperties".to_string(), additional.to_bric());
        }
        if let Some(items) = &self.items {
            entries.insert("items".to_string(), items.to_bric());
        }
        if let Some(enum_values) = &self.enum_values {
            entries.insert("enum".to_string(), enum_values.to_bric());
        }
        if let Some(const_value) = &self.const_value {
            entries.insert("const".to_string(), const_value.clone());
        }
        if let Some(all_of) = &self.all_of {
            entries.insert("allOf".to_string(), all_of.to_bric());
        }
        if let Some(any_of) = &self.any_of {
            entries.insert("anyOf".to_string(), any_of.to_bric());
        }
        if let Some(one_of) = &self.one_of {
            entries.insert("oneOf".to_string(), one_of.to_bric());
        }
        if let Some(not) = &self.not {
            entries.insert("not".to_string(), not.to_bric());
        }
        if !self.definitions.is_empty() {
            entries.insert("definitions".to_string(), self.definitions.to_bric());
        }
        if let Some(min_items) = &self.min_items {
            entries.insert("minItems".to_string(), min_items.to_bric());
        }
        if let Some(max_items) = &self.max_items {
            entries.insert("maxItems".to_string(), max_items.to_bric());
        }
        if let Some(default) = &self.default {
            entries.insert("default".to_string(), default.clone());
        }
        for (key, value) in &self.extensions {
            entries.insert(key.clone(), value.clone());
        }
        Bric::Obj(entries)
    }
}
