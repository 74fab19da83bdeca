use std::fmt;

use indexmap::IndexMap;

use crate::parser::{parse_with, BricBuilder, ParseError, ParseOptions};
use crate::pointer::{PathComponent, Pointer};

/// A generic JSON value tree.
///
/// `Bric` is both the output of the pull parser and the intermediate the bind
/// contracts convert through. Object keys keep their insertion order so that
/// everything downstream of a parse is deterministic.
#[derive(Debug, Clone)]
pub enum Bric {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Arr(Vec<Bric>),
    Obj(IndexMap<String, Bric>),
}

impl Bric {
    /// Parse JSON text into a `Bric` using the native builder.
    pub fn parse(text: &str, options: &ParseOptions) -> Result<Bric, ParseError> {
        parse_with(text, options, &mut BricBuilder)
    }

    /// The variant name, used by decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Bric::Null => "null",
            Bric::Bool(_) => "boolean",
            Bric::Num(_) => "number",
            Bric::Str(_) => "string",
            Bric::Arr(_) => "array",
            Bric::Obj(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Bric::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Bric::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match *self {
            Bric::Num(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bric::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&[Bric]> {
        match self {
            Bric::Arr(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&IndexMap<String, Bric>> {
        match self {
            Bric::Obj(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a descendant by pointer. Returns `None` when any component
    /// does not resolve.
    pub fn find(&self, pointer: &Pointer) -> Option<&Bric> {
        let mut current = self;
        for component in pointer.components() {
            current = match (current, component) {
                (Bric::Obj(entries), PathComponent::Key(key)) => entries.get(key.as_str())?,
                (Bric::Arr(values), PathComponent::Index(index)) => values.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Produces a new value with the subtree at `path` replaced by
    /// `new_value`. Missing object keys are created along the way; an array
    /// index past the end appends.
    pub fn update(self, new_value: Bric, path: &[PathComponent]) -> Bric {
        let Some((head, rest)) = path.split_first() else {
            return new_value;
        };
        match head {
            PathComponent::Key(key) => {
                let mut entries = match self {
                    Bric::Obj(entries) => entries,
                    _ => IndexMap::new(),
                };
                if let Some(slot) = entries.get_mut(key.as_str()) {
                    let child = std::mem::replace(slot, Bric::Null);
                    *slot = child.update(new_value, rest);
                } else {
                    entries.insert(key.clone(), Bric::Null.update(new_value, rest));
                }
                Bric::Obj(entries)
            }
            PathComponent::Index(index) => {
                let mut values = match self {
                    Bric::Arr(values) => values,
                    _ => Vec::new(),
                };
                if *index < values.len() {
                    let child = std::mem::replace(&mut values[*index], Bric::Null);
                    values[*index] = child.update(new_value, rest);
                } else {
                    values.push(Bric::Null.update(new_value, rest));
                }
                Bric::Arr(values)
            }
        }
    }

    /// Rewrites the tree bottom-up: `f` sees every node, children before
    /// parents, along with the pointer to that node.
    pub fn alter<F: Fn(&Pointer, Bric) -> Bric>(self, f: F) -> Bric {
        self.alter_at(&Pointer::root(), &f)
    }

    fn alter_at<F: Fn(&Pointer, Bric) -> Bric>(self, at: &Pointer, f: &F) -> Bric {
        let rebuilt = match self {
            Bric::Arr(values) => Bric::Arr(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| value.alter_at(&at.push(PathComponent::index(index)), f))
                    .collect(),
            ),
            Bric::Obj(entries) => Bric::Obj(
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        let child = value.alter_at(&at.push(PathComponent::key(key.as_str())), f);
                        (key, child)
                    })
                    .collect(),
            ),
            scalar => scalar,
        };
        f(at, rebuilt)
    }

    /// Renders compact JSON. Non-finite numbers become `null`.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    /// Renders JSON with two-space indentation.
    pub fn encode_pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Bric::Null => out.push_str("null"),
            Bric::Bool(true) => out.push_str("true"),
            Bric::Bool(false) => out.push_str("false"),
            Bric::Num(n) => write_number(*n, out),
            Bric::Str(s) => write_escaped(s, out),
            Bric::Arr(values) => {
                out.push('[');
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    value.write_compact(out);
                }
                out.push(']');
            }
            Bric::Obj(entries) => {
                out.push('{');
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    write_escaped(key, out);
                    out.push(':');
                    value.write_compact(out);
                }
                out.push('}');
            }
        }
    }

    fn write_pretty(&self, out: &mut String, level: usize) {
        match self {
            Bric::Arr(values) if !values.is_empty() => {
                out.push_str("[\n");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        out.push_str(",\n");
                    }
                    indent(out, level + 1);
                    value.write_pretty(out, level + 1);
                }
                out.push('\n');
                indent(out, level);
                out.push(']');
            }
            Bric::Obj(entries) if !entries.is_empty() => {
                out.push_str("{\n");
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push_str(",\n");
                    }
                    indent(out, level + 1);
                    write_escaped(key, out);
                    out.push_str(": ");
                    value.write_pretty(out, level + 1);
                }
                out.push('\n');
                indent(out, level);
                out.push('}');
            }
            other => other.write_compact(out),
        }
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_number(n: f64, out: &mut String) {
    if n.is_finite() {
        // `{}` on f64 is the shortest representation that parses back to the
        // same bits, which is what the round-trip law needs
        out.push_str(&format!("{}", n));
    } else {
        out.push_str("null");
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl PartialEq for Bric {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Bric::Null, Bric::Null) => true,
            (Bric::Bool(a), Bric::Bool(b)) => a == b,
            // bitwise, except that -0.0 and 0.0 compare equal
            (Bric::Num(a), Bric::Num(b)) => a == b || a.to_bits() == b.to_bits(),
            (Bric::Str(a), Bric::Str(b)) => a == b,
            (Bric::Arr(a), Bric::Arr(b)) => a == b,
            // IndexMap equality ignores insertion order
            (Bric::Obj(a), Bric::Obj(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Bric {}

impl fmt::Display for Bric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<bool> for Bric {
    fn from(value: bool) -> Self {
        Bric::Bool(value)
    }
}

impl From<f64> for Bric {
    fn from(value: f64) -> Self {
        Bric::Num(value)
    }
}

impl From<i64> for Bric {
    fn from(value: i64) -> Self {
        Bric::Num(value as f64)
    }
}

impl From<&str> for Bric {
    fn from(value: &str) -> Self {
        Bric::Str(value.to_string())
    }
}

impl From<String> for Bric {
    fn from(value: String) -> Self {
        Bric::Str(value)
    }
}

impl From<Vec<Bric>> for Bric {
    fn from(values: Vec<Bric>) -> Self {
        Bric::Arr(values)
    }
}

impl From<IndexMap<String, Bric>> for Bric {
    fn from(entries: IndexMap<String, Bric>) -> Self {
        Bric::Obj(entries)
    }
}
