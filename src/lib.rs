//! bricolage
//!
//! A JSON-Schema driven source code generator. Point it at a draft-04
//! schema document and it produces strongly typed Rust declarations that
//! convert to and from the generic [`Bric`] value tree.
//!
//! - [`Bric`], the JSON value model, plus a pull parser with a pluggable
//!   builder (re-exported from the `bric` crate)
//! - [`ToBric`] / [`FromBric`], the bind contracts generated code implements
//! - [`decode_schema`], [`reify_module`], [`emit_module`], the pipeline
//!   stages (re-exported from `bricolage-compiler`)
//!
//! ```
//! use bricolage::{generate_rust, ReifyOptions};
//!
//! let schema = r#"{
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {"name": {"type": "string"}}
//! }"#;
//! let source = generate_rust(schema, "Widget", &ReifyOptions::default()).unwrap();
//! assert!(source.contains("pub struct Widget"));
//! ```

pub use bric::{
    parse_with, BindError, BindErrorKind, Bric, BricBuilder, Bricolage, FromBric, ParseError,
    ParseErrorKind, ParseOptions, PathComponent, Pointer, ToBric,
};
pub use bricolage_compiler::{
    decode_schema, emit, emit_module, generate, reify, reify_module, Access, CodeDecl, CodeModule,
    CodeType, CompileError, Logger, MemorySink, ReifyError, ReifyErrorKind, ReifyOptions, Schema,
    SimpleType, Sink, Source, Target,
};

/// Generates Rust source from JSON Schema text in one call.
pub fn generate_rust(
    schema_text: &str,
    id: &str,
    options: &ReifyOptions,
) -> Result<String, CompileError> {
    generate(schema_text, id, options, Target::Rust)
}

pub mod bind {
    pub use bric::bind::*;
}

pub mod error {
    pub use bric::{BindError, ParseError};
    pub use bricolage_compiler::{CompileError, ReifyError, ReifyErrorKind};
}
