//! The language-neutral IR the reifier populates and the emitter renders.
//! Pure data; behavior lives in `reify` and `emit`.

use std::collections::BTreeSet;

use bric::Bric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Double,
    Str,
    Null,
    Bric,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeType {
    Primitive(Primitive),
    Named(String),
    Array(Box<CodeType>),
    Optional(Box<CodeType>),
    Tuple(Vec<CodeType>),
    /// An open mapping from string keys to `T`.
    Map(Box<CodeType>),
    /// A boxed wrapper breaking recursive value size.
    Indirect(Box<CodeType>),
}

impl CodeType {
    pub fn optional(self) -> CodeType {
        match self {
            already @ CodeType::Optional(_) => already,
            other => CodeType::Optional(Box::new(other)),
        }
    }

    pub fn indirect(self) -> CodeType {
        CodeType::Indirect(Box::new(self))
    }

    /// Whether this type mentions `name` anywhere, ignoring `Indirect`
    /// wrappers that already break the cycle.
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            CodeType::Primitive(_) => false,
            CodeType::Named(n) => n == name,
            CodeType::Array(inner) | CodeType::Optional(inner) | CodeType::Map(inner) => {
                inner.mentions(name)
            }
            CodeType::Tuple(items) => items.iter().any(|item| item.mentions(name)),
            CodeType::Indirect(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Crate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// The original property key, preserved verbatim for the wire format.
    pub json_name: String,
    pub ty: CodeType,
    pub required: bool,
    pub default: Option<Bric>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub name: String,
    pub payload: Option<CodeType>,
}

/// How a struct treats object keys beyond its declared fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraProps {
    /// `additionalProperties: false` — decode rejects unknown keys.
    Forbid,
    /// Unknown keys are captured into a `Map` of `Bric`.
    Capture,
    /// Unknown keys are captured into a typed open mapping.
    Typed(CodeType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeDecl {
    Struct {
        name: String,
        doc: Option<String>,
        access: Access,
        fields: Vec<Field>,
        extra: ExtraProps,
        /// A type the decoder must fail to match (`not` semantics).
        deny: Option<CodeType>,
        nested: Vec<CodeDecl>,
        conformances: BTreeSet<String>,
    },
    Sum {
        name: String,
        doc: Option<String>,
        access: Access,
        cases: Vec<Case>,
        /// `true` for `oneOf`: exactly one case must decode. `false` for
        /// `anyOf`: the first clean decode wins.
        exclusive: bool,
        nested: Vec<CodeDecl>,
        conformances: BTreeSet<String>,
    },
    Enum {
        name: String,
        doc: Option<String>,
        access: Access,
        raw: Primitive,
        cases: Vec<(String, Bric)>,
    },
    Alias {
        name: String,
        doc: Option<String>,
        access: Access,
        target: CodeType,
    },
}

impl CodeDecl {
    pub fn name(&self) -> &str {
        match self {
            CodeDecl::Struct { name, .. }
            | CodeDecl::Sum { name, .. }
            | CodeDecl::Enum { name, .. }
            | CodeDecl::Alias { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeModule {
    /// Declarations in insertion order; the reifier only ever appends.
    pub types: Vec<CodeDecl>,
    pub imports: BTreeSet<String>,
}
