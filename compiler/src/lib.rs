//! bricolage-compiler
//!
//! This crate implements:
//!  1) A typed model of JSON Schema documents, decoded through the bind
//!     contracts (`decode_schema`),
//!  2) The reifier (`reify`, `reify_module`): schema subtree → code
//!     declarations, with name allocation and recursion breaking,
//!  3) The emitter (`emit`, `emit_module`): code module → Rust source,
//!  4) Error types (`ReifyError`, `CompileError`).

pub mod code;
pub mod emit;
pub mod error;
pub mod io;
pub mod reify;
pub mod schema;
pub mod utils;

pub use code::{Access, Case, CodeDecl, CodeModule, CodeType, ExtraProps, Field, Primitive};
pub use emit::{emit, emit_module, Target};
pub use error::{CompileError, ReifyError, ReifyErrorKind};
pub use io::{Logger, MemorySink, Sink, Source};
pub use reify::{reify, reify_module, ReifyOptions};
pub use schema::{decode_schema, Additional, Items, OneOrMany, Schema, SimpleType};

use bric::{Bric, ParseOptions};

/// Runs the whole pipeline: parse the schema text, decode it into the typed
/// model, reify a module, and render it for `target`.
pub fn generate(
    schema_text: &str,
    id: &str,
    options: &ReifyOptions,
    target: Target,
) -> Result<String, CompileError> {
    let document = Bric::parse(schema_text, &ParseOptions::strict())?;
    let schema = decode_schema(&document)?;
    let module = reify_module(&schema, id, options)?;
    Ok(emit_module(&module, target))
}
