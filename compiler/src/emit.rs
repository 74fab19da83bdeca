//! Renders a [`CodeModule`] to Rust source: each declaration, its `ToBric`
//! impl (field-by-field construction), and its `FromBric` impl
//! (field-by-field deconstruction with pointer threading).
//!
//! Output is deterministic: declarations in insertion order, fields in
//! reified order, imports sorted.

use bric::Bric;

use crate::code::{Access, Case, CodeDecl, CodeModule, CodeType, ExtraProps, Field, Primitive};
use crate::io::Sink;
use crate::utils::to_snake_case;

/// The language the emitter renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Rust,
}

/// Renders the whole module as one source file.
pub fn emit_module(module: &CodeModule, target: Target) -> String {
    match target {
        Target::Rust => emit_rust(module),
    }
}

/// Renders the module and writes it through the sink, one file per module.
pub fn emit(module: &CodeModule, target: Target, sink: &mut dyn Sink) -> std::io::Result<()> {
    let name = module
        .types
        .first()
        .map(|decl| format!("{}.rs", to_snake_case(decl.name())))
        .unwrap_or_else(|| "generated.rs".to_string());
    sink.write(&name, &emit_module(module, target))
}

fn emit_rust(module: &CodeModule) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push("// Generated by bricolage. Do not edit.".to_string());
    out.push(String::new());
    for import in &module.imports {
        out.push(format!("use {};", import));
    }
    out.push(String::new());
    for decl in &module.types {
        emit_decl(decl, &mut out);
    }
    while out.last().map_or(false, |line| line.is_empty()) {
        out.pop();
    }
    out.push(String::new());
    out.join("\n")
}

fn emit_decl(decl: &CodeDecl, out: &mut Vec<String>) {
    match decl {
        CodeDecl::Struct {
            name,
            doc,
            access,
            fields,
            extra,
            deny,
            nested,
            conformances,
        } => {
            emit_struct(name, doc.as_deref(), *access, fields, extra, deny, conformances, out);
            for child in nested {
                emit_decl(child, out);
            }
        }
        CodeDecl::Sum {
            name,
            doc,
            access,
            cases,
            exclusive,
            nested,
            conformances,
        } => {
            emit_sum(name, doc.as_deref(), *access, cases, *exclusive, conformances, out);
            for child in nested {
                emit_decl(child, out);
            }
        }
        CodeDecl::Enum {
            name,
            doc,
            access,
            raw: _,
            cases,
        } => emit_enum(name, doc.as_deref(), *access, cases, out),
        CodeDecl::Alias {
            name,
            doc,
            access,
            target,
        } => {
            emit_doc(doc.as_deref(), "", out);
            out.push(format!(
                "{}type {} = {};",
                access_prefix(*access),
                name,
                rust_type(target)
            ));
            out.push(String::new());
        }
    }
}

fn emit_doc(doc: Option<&str>, indent: &str, out: &mut Vec<String>) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            out.push(format!("{}/// {}", indent, line).trim_end().to_string());
        }
    }
}

fn access_prefix(access: Access) -> &'static str {
    match access {
        Access::Public => "pub ",
        Access::Crate => "pub(crate) ",
    }
}

fn derive_line(conformances: &std::collections::BTreeSet<String>, copy: bool) -> String {
    let mut traits = vec!["Debug".to_string(), "Clone".to_string()];
    if copy {
        traits.push("Copy".to_string());
    }
    for conformance in conformances {
        if !traits.iter().any(|t| t == conformance) {
            traits.push(conformance.clone());
        }
    }
    format!("#[derive({})]", traits.join(", "))
}

/// The distinguished field capturing open properties; excluded from strict
/// additional-property checks.
const EXTRA_FIELD: &str = "additional_properties";

fn emit_struct(
    name: &str,
    doc: Option<&str>,
    access: Access,
    fields: &[Field],
    extra: &ExtraProps,
    deny: &Option<CodeType>,
    conformances: &std::collections::BTreeSet<String>,
    out: &mut Vec<String>,
) {
    let prefix = access_prefix(access);
    emit_doc(doc, "", out);
    out.push(derive_line(conformances, false));
    out.push(format!("{}struct {} {{", prefix, name));
    for field in fields {
        emit_doc(field.doc.as_deref(), "    ", out);
        out.push(format!("    {}{}: {},", prefix, field.name, rust_type(&field.ty)));
    }
    match extra {
        ExtraProps::Forbid => {}
        ExtraProps::Capture => {
            out.push(format!(
                "    {}{}: IndexMap<String, Bric>,",
                prefix, EXTRA_FIELD
            ));
        }
        ExtraProps::Typed(ty) => {
            out.push(format!(
                "    {}{}: IndexMap<String, {}>,",
                prefix,
                EXTRA_FIELD,
                rust_type(ty)
            ));
        }
    }
    out.push("}".to_string());
    out.push(String::new());

    // encode: straight field-by-field construction
    out.push(format!("impl ToBric for {} {{", name));
    out.push("    fn to_bric(&self) -> Bric {".to_string());
    out.push("        let mut entries = IndexMap::new();".to_string());
    for field in fields {
        if is_optional(&field.ty) {
            out.push(format!(
                "        if let Some(value) = &self.{} {{",
                field.name
            ));
            out.push(format!(
                "            entries.insert({:?}.to_string(), value.to_bric());",
                field.json_name
            ));
            out.push("        }".to_string());
        } else {
            out.push(format!(
                "        entries.insert({:?}.to_string(), self.{}.to_bric());",
                field.json_name, field.name
            ));
        }
    }
    if !matches!(extra, ExtraProps::Forbid) {
        out.push(format!("        for (key, value) in &self.{} {{", EXTRA_FIELD));
        out.push("            entries.insert(key.clone(), value.to_bric());".to_string());
        out.push("        }".to_string());
    }
    out.push("        Bric::Obj(entries)".to_string());
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());

    // decode: field-by-field deconstruction with pointer threading
    out.push(format!("impl FromBric for {} {{", name));
    out.push("    fn from_bric(value: &Bric) -> Result<Self, BindError> {".to_string());
    if let Some(deny_ty) = deny {
        out.push(format!(
            "        if <{} as FromBric>::from_bric(value).is_ok() {{",
            rust_type(deny_ty)
        ));
        out.push(format!(
            "            return Err(BindError::new(BindErrorKind::NotSchemaMatched, {:?}));",
            name
        ));
        out.push("        }".to_string());
    }
    out.push(format!(
        "        let entries = bind::expect_object(value, {:?})?;",
        name
    ));
    let known: Vec<String> = fields
        .iter()
        .map(|field| format!("{:?}", field.json_name))
        .collect();
    if matches!(extra, ExtraProps::Forbid) {
        out.push(format!(
            "        bind::deny_extras(entries, &[{}], {:?})?;",
            known.join(", "),
            name
        ));
    }
    out.push(format!("        Ok({} {{", name));
    for field in fields {
        if field.required {
            out.push(format!(
                "            {}: bind::req_field(entries, {:?}, {:?})?,",
                field.name, field.json_name, name
            ));
        } else if let Some(default) = &field.default {
            out.push(format!(
                "            {}: match bind::opt_field(entries, {:?})? {{",
                field.name, field.json_name
            ));
            out.push("                Some(decoded) => decoded,".to_string());
            out.push(format!(
                "                None => FromBric::from_bric(&{})",
                bric_expr(default)
            ));
            out.push(format!(
                "                    .map_err(|e| e.inside(bric::PathComponent::key({:?})))?,",
                field.json_name
            ));
            out.push("            },".to_string());
        } else {
            out.push(format!(
                "            {}: bind::opt_field(entries, {:?})?,",
                field.name, field.json_name
            ));
        }
    }
    match extra {
        ExtraProps::Forbid => {}
        ExtraProps::Capture | ExtraProps::Typed(_) => {
            out.push(format!(
                "            {}: bind::collect_extras(entries, &[{}])?,",
                EXTRA_FIELD,
                known.join(", ")
            ));
        }
    }
    out.push("        })".to_string());
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

fn emit_sum(
    name: &str,
    doc: Option<&str>,
    access: Access,
    cases: &[Case],
    exclusive: bool,
    conformances: &std::collections::BTreeSet<String>,
    out: &mut Vec<String>,
) {
    let prefix = access_prefix(access);
    emit_doc(doc, "", out);
    out.push(derive_line(conformances, false));
    out.push(format!("{}enum {} {{", prefix, name));
    for case in cases {
        match &case.payload {
            Some(payload) => out.push(format!("    {}({}),", case.name, rust_type(payload))),
            None => out.push(format!("    {},", case.name)),
        }
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("impl ToBric for {} {{", name));
    out.push("    fn to_bric(&self) -> Bric {".to_string());
    out.push("        match self {".to_string());
    for case in cases {
        match &case.payload {
            Some(_) => out.push(format!(
                "            {}::{}(value) => value.to_bric(),",
                name, case.name
            )),
            None => out.push(format!("            {}::{} => Bric::Null,", name, case.name)),
        }
    }
    out.push("        }".to_string());
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("impl FromBric for {} {{", name));
    out.push("    fn from_bric(value: &Bric) -> Result<Self, BindError> {".to_string());
    out.push("        let mut causes = Vec::new();".to_string());
    if exclusive {
        // every alternative is tried; exactly one may match
        out.push("        let mut matched = Vec::new();".to_string());
        out.push("        let mut result = None;".to_string());
        for (index, case) in cases.iter().enumerate() {
            let decode_ty = case
                .payload
                .as_ref()
                .map(rust_type)
                .unwrap_or_else(|| "()".to_string());
            out.push(format!(
                "        match <{} as FromBric>::from_bric(value) {{",
                decode_ty
            ));
            out.push("            Ok(decoded) => {".to_string());
            out.push("                if result.is_none() {".to_string());
            match &case.payload {
                Some(_) => out.push(format!(
                    "                    result = Some({}::{}(decoded));",
                    name, case.name
                )),
                None => {
                    out.push("                    let _ = decoded;".to_string());
                    out.push(format!(
                        "                    result = Some({}::{});",
                        name, case.name
                    ));
                }
            }
            out.push("                }".to_string());
            out.push(format!("                matched.push({}usize);", index));
            out.push("            }".to_string());
            out.push("            Err(cause) => causes.push(cause),".to_string());
            out.push("        }".to_string());
        }
        out.push("        if matched.len() > 1 {".to_string());
        out.push(format!(
            "            return Err(BindError::new(BindErrorKind::ExactlyOneViolated {{ matched }}, {:?}));",
            name
        ));
        out.push("        }".to_string());
        out.push("        match result {".to_string());
        out.push("            Some(decoded) => Ok(decoded),".to_string());
        out.push(format!(
            "            None => Err(BindError::new(BindErrorKind::NoAlternativeMatched {{ causes }}, {:?})),",
            name
        ));
        out.push("        }".to_string());
    } else {
        // first alternative that decodes cleanly wins
        for case in cases {
            let decode_ty = case
                .payload
                .as_ref()
                .map(rust_type)
                .unwrap_or_else(|| "()".to_string());
            out.push(format!(
                "        match <{} as FromBric>::from_bric(value) {{",
                decode_ty
            ));
            match &case.payload {
                Some(_) => out.push(format!(
                    "            Ok(decoded) => return Ok({}::{}(decoded)),",
                    name, case.name
                )),
                None => out.push(format!(
                    "            Ok(_) => return Ok({}::{}),",
                    name, case.name
                )),
            }
            out.push("            Err(cause) => causes.push(cause),".to_string());
            out.push("        }".to_string());
        }
        out.push(format!(
            "        Err(BindError::new(BindErrorKind::NoAlternativeMatched {{ causes }}, {:?}))",
            name
        ));
    }
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

fn emit_enum(
    name: &str,
    doc: Option<&str>,
    access: Access,
    cases: &[(String, Bric)],
    out: &mut Vec<String>,
) {
    let prefix = access_prefix(access);
    emit_doc(doc, "", out);
    out.push("#[derive(Debug, Clone, Copy, PartialEq)]".to_string());
    out.push(format!("{}enum {} {{", prefix, name));
    for (case_name, _) in cases {
        out.push(format!("    {},", case_name));
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("impl ToBric for {} {{", name));
    out.push("    fn to_bric(&self) -> Bric {".to_string());
    out.push("        match self {".to_string());
    for (case_name, literal) in cases {
        out.push(format!(
            "            {}::{} => {},",
            name,
            case_name,
            bric_expr(literal)
        ));
    }
    out.push("        }".to_string());
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("impl FromBric for {} {{", name));
    out.push("    fn from_bric(value: &Bric) -> Result<Self, BindError> {".to_string());
    for (case_name, literal) in cases {
        out.push(format!("        if *value == {} {{", bric_expr(literal)));
        out.push(format!("            return Ok({}::{});", name, case_name));
        out.push("        }".to_string());
    }
    out.push("        Err(BindError::new(".to_string());
    out.push(
        "            BindErrorKind::InvalidEnumValue { value: value.clone() },".to_string(),
    );
    out.push(format!("            {:?},", name));
    out.push("        ))".to_string());
    out.push("    }".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

fn is_optional(ty: &CodeType) -> bool {
    matches!(ty, CodeType::Optional(_))
}

/// Renders a type reference for the Rust target.
pub fn rust_type(ty: &CodeType) -> String {
    match ty {
        CodeType::Primitive(Primitive::Bool) => "bool".to_string(),
        CodeType::Primitive(Primitive::Int) => "i64".to_string(),
        CodeType::Primitive(Primitive::Double) => "f64".to_string(),
        CodeType::Primitive(Primitive::Str) => "String".to_string(),
        CodeType::Primitive(Primitive::Null) => "()".to_string(),
        CodeType::Primitive(Primitive::Bric) => "Bric".to_string(),
        CodeType::Named(name) => name.clone(),
        CodeType::Array(inner) => format!("Vec<{}>", rust_type(inner)),
        CodeType::Optional(inner) => format!("Option<{}>", rust_type(inner)),
        CodeType::Map(inner) => format!("IndexMap<String, {}>", rust_type(inner)),
        CodeType::Indirect(inner) => format!("Box<{}>", rust_type(inner)),
        CodeType::Tuple(items) => {
            let rendered: Vec<String> = items.iter().map(rust_type).collect();
            if rendered.len() == 1 {
                format!("({},)", rendered[0])
            } else {
                format!("({})", rendered.join(", "))
            }
        }
    }
}

/// Renders a `Bric` literal as a Rust expression constructing it.
fn bric_expr(value: &Bric) -> String {
    match value {
        Bric::Null => "Bric::Null".to_string(),
        Bric::Bool(b) => format!("Bric::Bool({})", b),
        Bric::Num(n) => format!("Bric::Num({:?}f64)", n),
        Bric::Str(s) => format!("Bric::Str({:?}.to_string())", s),
        Bric::Arr(items) => {
            let rendered: Vec<String> = items.iter().map(bric_expr).collect();
            format!("Bric::Arr(vec![{}])", rendered.join(", "))
        }
        Bric::Obj(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("({:?}.to_string(), {})", key, bric_expr(value)))
                .collect();
            format!("Bric::Obj(IndexMap::from([{}]))", rendered.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reify::{reify_module, ReifyOptions};
    use crate::schema::decode_schema;
    use bric::ParseOptions;

    fn generate(text: &str, id: &str) -> String {
        let doc = Bric::parse(text, &ParseOptions::strict()).expect("fixture must parse");
        let schema = decode_schema(&doc).expect("fixture must decode");
        let module = reify_module(&schema, id, &ReifyOptions::default()).expect("must reify");
        emit_module(&module, Target::Rust)
    }

    #[test]
    fn test_emit_struct() {
        let source = generate(
            r#"{
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "count": {"type": "integer"}
                },
                "additionalProperties": false
            }"#,
            "Widget",
        );
        assert!(source.contains("pub struct Widget {"));
        assert!(source.contains("    pub name: String,"));
        assert!(source.contains("    pub count: Option<i64>,"));
        assert!(source.contains(r#"bind::deny_extras(entries, &["name", "count"], "Widget")?;"#));
        assert!(source.contains(r#"name: bind::req_field(entries, "name", "Widget")?,"#));
        assert!(source.contains(r#"count: bind::opt_field(entries, "count")?,"#));
        // closed struct captures nothing
        assert!(!source.contains("additional_properties"));
    }

    #[test]
    fn test_emit_open_struct_captures_extras() {
        let source = generate(
            r#"{"type": "object", "properties": {"a": {"type": "string"}}}"#,
            "Open",
        );
        assert!(source.contains("    pub additional_properties: IndexMap<String, Bric>,"));
        assert!(source.contains(r#"bind::collect_extras(entries, &["a"])?"#));
    }

    #[test]
    fn test_emit_enum() {
        let source = generate(r#"{"type": "string", "enum": ["value"]}"#, "Prop");
        assert!(source.contains("pub enum Prop {"));
        assert!(source.contains("    Value,"));
        assert!(source.contains(r#"if *value == Bric::Str("value".to_string()) {"#));
        assert!(source.contains("BindErrorKind::InvalidEnumValue { value: value.clone() },"));
    }

    #[test]
    fn test_emit_one_of_checks_exclusivity() {
        let source = generate(
            r#"{"oneOf": [{"type": "string"}, {"type": "number"}]}"#,
            "Value",
        );
        assert!(source.contains("    Choice1(String),"));
        assert!(source.contains("    Choice2(f64),"));
        assert!(source.contains("BindErrorKind::ExactlyOneViolated { matched }"));
        assert!(source.contains("BindErrorKind::NoAlternativeMatched { causes }"));
    }

    #[test]
    fn test_emit_any_of_returns_first_match() {
        let source = generate(
            r#"{"anyOf": [{"type": "string"}, {"type": "number"}]}"#,
            "Loose",
        );
        assert!(source.contains("Ok(decoded) => return Ok(Loose::Choice1(decoded)),"));
        assert!(!source.contains("ExactlyOneViolated"));
    }

    #[test]
    fn test_emit_alias_and_tuple() {
        let source = generate(
            r#"{"type": "array", "items": [{"type": "number"}, {"type": "string"}]}"#,
            "Pair",
        );
        assert!(source.contains("pub type Pair = (f64, String);"));
    }

    #[test]
    fn test_emit_recursive_struct_boxes_children() {
        let source = generate(
            r##"{
                "type": "object",
                "required": ["value"],
                "properties": {
                    "value": {"type": "number"},
                    "next": {"$ref": "#"}
                }
            }"##,
            "Node",
        );
        assert!(source.contains("    pub next: Option<Box<Node>>,"));
    }

    #[test]
    fn test_emit_default_field() {
        let source = generate(
            r#"{
                "type": "object",
                "properties": {
                    "role": {"type": "string", "default": "user"}
                }
            }"#,
            "Account",
        );
        assert!(source.contains("    pub role: String,"));
        assert!(source.contains(r#"None => FromBric::from_bric(&Bric::Str("user".to_string()))"#));
    }

    #[test]
    fn test_emit_is_deterministic() {
        let text = r#"{
            "type": "object",
            "properties": {
                "kind": {"enum": ["x", "y"]},
                "parts": {"type": "array", "items": {"oneOf": [{"type": "string"}, {"type": "number"}]}}
            }
        }"#;
        assert_eq!(generate(text, "Root"), generate(text, "Root"));
    }

    #[test]
    fn test_emit_writes_through_sink() {
        let doc = Bric::parse(r#"{"type": "string"}"#, &ParseOptions::strict()).unwrap();
        let schema = decode_schema(&doc).unwrap();
        let module = reify_module(&schema, "Label", &ReifyOptions::default()).unwrap();
        let mut sink = crate::io::MemorySink::default();
        emit(&module, Target::Rust, &mut sink).unwrap();
        assert_eq!(sink.files.len(), 1);
        assert_eq!(sink.files[0].0, "label.rs");
        assert!(sink.files[0].1.contains("pub type Label = String;"));
    }
}
