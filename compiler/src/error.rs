use bric::{BindError, ParseError, Pointer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReifyErrorKind {
    AmbiguousAllOf,
    MixedEnumKinds,
    UnresolvedRef,
    EmptyComposition,
    UnsupportedKeyword,
}

impl std::fmt::Display for ReifyErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReifyErrorKind::AmbiguousAllOf => "ambiguous allOf",
            ReifyErrorKind::MixedEnumKinds => "mixed enum kinds",
            ReifyErrorKind::UnresolvedRef => "unresolved reference",
            ReifyErrorKind::EmptyComposition => "empty composition",
            ReifyErrorKind::UnsupportedKeyword => "unsupported keyword",
        };
        f.write_str(name)
    }
}

/// Fatal for the schema subtree it points into; the reifier never
/// partial-emits.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Reify error ({kind}) at {path}: {message}")]
pub struct ReifyError {
    pub kind: ReifyErrorKind,
    pub path: Pointer,
    pub message: String,
}

impl ReifyError {
    pub fn new(kind: ReifyErrorKind, path: Pointer, message: impl Into<String>) -> Self {
        ReifyError {
            kind,
            path,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Reify(#[from] ReifyError),
}
