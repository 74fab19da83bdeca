//! Generic JSON value model ("Bric"), a pull parser with a pluggable
//! builder, and the encode/decode contracts generated code implements.
//!
//! ```
//! use bric::{Bric, ParseOptions};
//!
//! let value = Bric::parse(r#"{"name": "widget", "count": 3}"#, &ParseOptions::strict()).unwrap();
//! assert_eq!(value.as_obj().unwrap()["count"], Bric::Num(3.0));
//! assert_eq!(Bric::parse(&value.encode(), &ParseOptions::strict()).unwrap(), value);
//! ```

pub mod bind;
pub mod parser;
pub mod pointer;
pub mod value;

pub use bind::{BindError, BindErrorKind, FromBric, ToBric};
pub use parser::{parse_with, BricBuilder, Bricolage, ParseError, ParseErrorKind, ParseOptions};
pub use pointer::{PathComponent, Pointer};
pub use value::Bric;
