//! Translates a decoded [`Schema`] into code declarations: allocates names,
//! picks the structural form, and populates a [`CodeModule`].

use std::collections::{BTreeSet, HashMap, HashSet};

use bric::{Bric, PathComponent, Pointer};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::code::{
    Access, Case, CodeDecl, CodeModule, CodeType, ExtraProps, Field, Primitive,
};
use crate::error::{ReifyError, ReifyErrorKind};
use crate::schema::{Additional, Items, Schema, SimpleType};
use crate::utils::{quote, to_pascal_case, to_snake_case, RUST_KEYWORDS};

lazy_static! {
    static ref NON_IDENT: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
}

fn default_accessor(_path: &[String]) -> Access {
    Access::Public
}

/// Knobs the caller threads into reification. The hooks must be pure
/// functions of their inputs; the reifier may invoke them repeatedly.
pub struct ReifyOptions {
    /// Chooses the access level per declaration path.
    pub accessor: fn(&[String]) -> Access,
    /// User hook to override a raw name before sanitation; commonly maps
    /// the root `"#"` to something presentable.
    pub renamer: Option<Box<dyn Fn(&[String], &str) -> Option<String>>>,
    /// Structs with more fields than this get every named field boxed to
    /// keep values small.
    pub indirect_count_threshold: usize,
    pub generate_equals: bool,
    /// Identifiers that may not be used verbatim in the target language.
    pub keywords_to_avoid: HashSet<String>,
    /// Keep schema property order in emitted fields; otherwise sort by name.
    pub preserve_property_order: bool,
}

impl Default for ReifyOptions {
    fn default() -> Self {
        ReifyOptions {
            accessor: default_accessor,
            renamer: None,
            indirect_count_threshold: 16,
            generate_equals: true,
            keywords_to_avoid: RUST_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            preserve_property_order: true,
        }
    }
}

/// Reifies `schema` and its `definitions` into a complete module.
pub fn reify_module(
    schema: &Schema,
    id: &str,
    options: &ReifyOptions,
) -> Result<CodeModule, ReifyError> {
    let mut reifier = Reifier::new(schema, id, &[], options);
    let mut module = CodeModule::default();

    let root_name = reifier.root_name.clone();
    let root = reifier.reify_at(schema, &root_name, &[], &Pointer::root())?;
    module.types.push(root);
    module.types.append(&mut reifier.pending);

    for (key, definition) in &schema.definitions {
        let name = reifier.definition_names[key].clone();
        let path = Pointer::root()
            .push(PathComponent::key("definitions"))
            .push(PathComponent::key(key.as_str()));
        let decl = reifier.reify_at(definition, &name, &[], &path)?;
        module.types.push(decl);
        module.types.append(&mut reifier.pending);
    }

    break_cycles(&mut module.types);

    module
        .imports
        .insert("bric::{BindError, BindErrorKind, Bric, FromBric, ToBric}".to_string());
    module.imports.insert("bric::bind".to_string());
    if module_has_struct(&module.types) {
        module.imports.insert("indexmap::IndexMap".to_string());
    }
    Ok(module)
}

/// Reifies a single schema subtree into one declaration (with its nested
/// declarations), without walking `definitions`.
pub fn reify(
    schema: &Schema,
    id: &str,
    parents: &[String],
    options: &ReifyOptions,
) -> Result<CodeDecl, ReifyError> {
    let mut reifier = Reifier::new(schema, id, parents, options);
    let name = if parents.is_empty() {
        reifier.root_name.clone()
    } else {
        reifier.decl_name(parents, id)
    };
    let decl = reifier.reify_at(schema, &name, parents, &Pointer::root())?;
    // companions hoisted out of aliases tag along as nested declarations
    // when the result can hold them
    let decl = match decl {
        CodeDecl::Struct { name, doc, access, fields, extra, deny, mut nested, conformances } => {
            nested.append(&mut reifier.pending);
            CodeDecl::Struct { name, doc, access, fields, extra, deny, nested, conformances }
        }
        CodeDecl::Sum { name, doc, access, cases, exclusive, mut nested, conformances } => {
            nested.append(&mut reifier.pending);
            CodeDecl::Sum { name, doc, access, cases, exclusive, nested, conformances }
        }
        other => other,
    };
    let mut decls = vec![decl];
    break_cycles(&mut decls);
    Ok(decls.remove(0))
}

fn module_has_struct(decls: &[CodeDecl]) -> bool {
    decls.iter().any(|decl| match decl {
        CodeDecl::Struct { .. } => true,
        CodeDecl::Sum { nested, .. } => module_has_struct(nested),
        _ => false,
    })
}

struct Reifier<'a> {
    options: &'a ReifyOptions,
    root_name: String,
    definition_names: IndexMap<String, String>,
    definition_schemas: IndexMap<String, Schema>,
    /// Every allocated declaration name. One flat scope: nested declarations
    /// are emitted as siblings, so their names must not collide either.
    taken: HashSet<String>,
    /// Structural declarations reified for alias targets (array items); they
    /// have no struct to nest under and surface at module level.
    pending: Vec<CodeDecl>,
}

impl<'a> Reifier<'a> {
    fn new(schema: &Schema, id: &str, parents: &[String], options: &'a ReifyOptions) -> Self {
        let mut reifier = Reifier {
            options,
            root_name: String::new(),
            definition_names: IndexMap::new(),
            definition_schemas: schema.definitions.clone(),
            taken: parents.iter().cloned().collect(),
            pending: Vec::new(),
        };
        reifier.root_name = match parents.first() {
            Some(outermost) => outermost.clone(),
            None => reifier.decl_name(&[], id),
        };
        for key in schema.definitions.keys() {
            let name = reifier.decl_name(&[], key);
            reifier.definition_names.insert(key.clone(), name);
        }
        reifier
    }

    /// `renamer(parents, raw)` wins over the sanitize pipeline; either way
    /// the result is made unique across the module.
    fn decl_name(&mut self, parents: &[String], raw: &str) -> String {
        let renamed = self
            .options
            .renamer
            .as_ref()
            .and_then(|renamer| renamer(parents, raw));
        let base = match renamed {
            Some(name) => self.sanitize(&name),
            None => self.sanitize(&to_pascal_case(raw)),
        };
        let name = uniquify(base, &self.taken);
        self.taken.insert(name.clone());
        name
    }

    fn sanitize(&self, raw: &str) -> String {
        let mut name = NON_IDENT.replace_all(raw, "_").into_owned();
        if name.is_empty() || name.chars().all(|c| c == '_') {
            return "_".to_string();
        }
        if name.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if self.options.keywords_to_avoid.contains(&name) {
            name.push('_');
        }
        name
    }

    fn access(&self, parents: &[String], name: &str) -> (Access, Vec<String>) {
        let mut path: Vec<String> = parents.to_vec();
        path.push(name.to_string());
        ((self.options.accessor)(&path), path)
    }

    /// The decision table. First match wins.
    fn reify_at(
        &mut self,
        schema: &Schema,
        name: &str,
        parents: &[String],
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        let (access, child_parents) = self.access(parents, name);
        let doc = schema
            .description
            .clone()
            .or_else(|| schema.title.clone());

        if let Some(reference) = &schema.reference {
            let target = self.resolve_reference(reference, path)?;
            return Ok(CodeDecl::Alias {
                name: name.to_string(),
                doc,
                access,
                target,
            });
        }

        let literals = match (&schema.enum_values, &schema.const_value) {
            (Some(values), _) => Some(values.clone()),
            (None, Some(value)) => Some(vec![value.clone()]),
            (None, None) => None,
        };
        if let Some(literals) = literals {
            return self.reify_enum(&literals, name, doc, access, path);
        }

        if let Some(branches) = &schema.one_of {
            return self.reify_sum(branches, true, name, doc, access, &child_parents, path);
        }
        if let Some(branches) = &schema.any_of {
            return self.reify_sum(branches, false, name, doc, access, &child_parents, path);
        }
        if let Some(branches) = &schema.all_of {
            return self.reify_all_of(schema, branches, name, doc, access, &child_parents, path);
        }

        if schema.not.is_some() {
            return self.reify_not(schema, name, parents, path);
        }

        if schema.is_object_shaped() {
            return self.reify_struct(schema, name, doc, access, &child_parents, path);
        }

        if schema.has_type(SimpleType::Array) || schema.items.is_some() {
            let target = self.reify_array_target(schema, &child_parents, path)?;
            return Ok(CodeDecl::Alias {
                name: name.to_string(),
                doc,
                access,
                target,
            });
        }

        if let Some(types) = &schema.types {
            let target = primitive_target(types.iter().copied().collect::<Vec<_>>());
            return Ok(CodeDecl::Alias {
                name: name.to_string(),
                doc,
                access,
                target,
            });
        }

        // no type information at all
        Ok(CodeDecl::Alias {
            name: name.to_string(),
            doc,
            access,
            target: CodeType::Primitive(Primitive::Bric),
        })
    }

    fn resolve_reference(
        &self,
        reference: &str,
        path: &Pointer,
    ) -> Result<CodeType, ReifyError> {
        if reference == "#" {
            return Ok(CodeType::Named(self.root_name.clone()));
        }
        if let Some(key) = reference.strip_prefix("#/definitions/") {
            if let Some(name) = self.definition_names.get(key) {
                return Ok(CodeType::Named(name.clone()));
            }
            return Err(ReifyError::new(
                ReifyErrorKind::UnresolvedRef,
                path.clone(),
                format!("no definition named {}", quote(key)),
            ));
        }
        Err(ReifyError::new(
            ReifyErrorKind::UnresolvedRef,
            path.clone(),
            format!(
                "only local fragment references are supported, found {}",
                quote(reference)
            ),
        ))
    }

    fn reify_enum(
        &mut self,
        literals: &[Bric],
        name: &str,
        doc: Option<String>,
        access: Access,
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        if literals.is_empty() {
            return Err(ReifyError::new(
                ReifyErrorKind::EmptyComposition,
                path.clone(),
                "enum must list at least one literal",
            ));
        }
        let raw = match &literals[0] {
            Bric::Str(_) => Primitive::Str,
            Bric::Num(_) => Primitive::Double,
            Bric::Bool(_) => Primitive::Bool,
            Bric::Null => Primitive::Null,
            other => {
                return Err(ReifyError::new(
                    ReifyErrorKind::MixedEnumKinds,
                    path.clone(),
                    format!("enum literal of kind {} is not primitive", other.kind()),
                ))
            }
        };
        let mut used = HashSet::new();
        let mut cases = Vec::with_capacity(literals.len());
        for (index, literal) in literals.iter().enumerate() {
            if literal.kind() != literals[0].kind() {
                return Err(ReifyError::new(
                    ReifyErrorKind::MixedEnumKinds,
                    path.clone(),
                    format!(
                        "enum mixes {} and {} literals",
                        literals[0].kind(),
                        literal.kind()
                    ),
                ));
            }
            let base = match literal {
                Bric::Str(text) if !text.is_empty() => {
                    let sanitized = self.sanitize(&to_pascal_case(text));
                    if sanitized == "_" {
                        format!("Case{}", index)
                    } else {
                        sanitized
                    }
                }
                _ => format!("Case{}", index),
            };
            let case_name = uniquify(base, &used);
            used.insert(case_name.clone());
            cases.push((case_name, literal.clone()));
        }
        Ok(CodeDecl::Enum {
            name: name.to_string(),
            doc,
            access,
            raw,
            cases,
        })
    }

    fn reify_sum(
        &mut self,
        branches: &[Schema],
        exclusive: bool,
        name: &str,
        doc: Option<String>,
        access: Access,
        child_parents: &[String],
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        let keyword = if exclusive { "oneOf" } else { "anyOf" };
        if branches.is_empty() {
            return Err(ReifyError::new(
                ReifyErrorKind::EmptyComposition,
                path.clone(),
                format!("{} must list at least one alternative", keyword),
            ));
        }
        let mut nested = Vec::new();
        let mut cases = Vec::with_capacity(branches.len());
        let mut used = HashSet::new();
        for (index, branch) in branches.iter().enumerate() {
            let raw = branch
                .title
                .clone()
                .unwrap_or_else(|| format!("Choice{}", index + 1));
            let branch_path = path
                .push(PathComponent::key(keyword))
                .push(PathComponent::index(index));
            let ty = self.reify_child(branch, &raw, child_parents, &branch_path, &mut nested)?;
            let case_name = uniquify(self.sanitize(&to_pascal_case(&raw)), &used);
            used.insert(case_name.clone());
            let payload = match ty {
                CodeType::Primitive(Primitive::Null) => None,
                other => Some(other),
            };
            cases.push(Case {
                name: case_name,
                payload,
            });
        }
        let mut conformances = BTreeSet::new();
        if self.options.generate_equals {
            conformances.insert("PartialEq".to_string());
        }
        Ok(CodeDecl::Sum {
            name: name.to_string(),
            doc,
            access,
            cases,
            exclusive,
            nested,
            conformances,
        })
    }

    fn reify_all_of(
        &mut self,
        outer: &Schema,
        branches: &[Schema],
        name: &str,
        doc: Option<String>,
        access: Access,
        child_parents: &[String],
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        if branches.is_empty() {
            return Err(ReifyError::new(
                ReifyErrorKind::EmptyComposition,
                path.clone(),
                "allOf must list at least one schema",
            ));
        }
        let mut nested = Vec::new();
        let mut fields: Vec<Field> = Vec::new();
        let mut used = HashSet::new();

        // the outer schema's own properties contribute first
        let mut contributors: Vec<(Schema, Pointer)> = Vec::new();
        if !outer.properties.is_empty() {
            let mut own = outer.clone();
            own.all_of = None;
            contributors.push((own, path.clone()));
        }
        for (index, branch) in branches.iter().enumerate() {
            let branch_path = path
                .push(PathComponent::key("allOf"))
                .push(PathComponent::index(index));
            let resolved = self.resolve_branch(branch, &branch_path)?;
            if !resolved.is_object_shaped() {
                return Err(ReifyError::new(
                    ReifyErrorKind::UnsupportedKeyword,
                    branch_path,
                    "allOf branch must be object-shaped",
                ));
            }
            contributors.push((resolved, branch_path));
        }

        for (contributor, contributor_path) in &contributors {
            let new_fields = self.struct_fields(
                contributor,
                child_parents,
                contributor_path,
                &mut nested,
                &mut used,
            )?;
            for field in new_fields {
                if let Some(existing) = fields.iter().find(|f| f.json_name == field.json_name) {
                    if existing.ty == field.ty {
                        continue;
                    }
                    return Err(ReifyError::new(
                        ReifyErrorKind::AmbiguousAllOf,
                        contributor_path.clone(),
                        format!(
                            "property {} is contributed twice with different types",
                            quote(&field.json_name)
                        ),
                    ));
                }
                fields.push(field);
            }
        }

        let extra = self.extra_props(outer, child_parents, path, &mut nested)?;
        Ok(self.finish_struct(name, doc, access, fields, extra, None, nested))
    }

    /// Follows a local `$ref` branch into `definitions` so its fields can be
    /// merged; anything else is returned as-is.
    fn resolve_branch(&self, branch: &Schema, path: &Pointer) -> Result<Schema, ReifyError> {
        match &branch.reference {
            None => Ok(branch.clone()),
            Some(reference) => {
                if let Some(key) = reference.strip_prefix("#/definitions/") {
                    if let Some(schema) = self.definition_schemas.get(key) {
                        return Ok(schema.clone());
                    }
                }
                Err(ReifyError::new(
                    ReifyErrorKind::UnresolvedRef,
                    path.clone(),
                    format!("cannot merge fields through {}", quote(reference)),
                ))
            }
        }
    }

    fn reify_not(
        &mut self,
        schema: &Schema,
        name: &str,
        parents: &[String],
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        let negative = schema.not.as_ref().map(|n| n.as_ref().clone());
        let mut positive = schema.clone();
        positive.not = None;
        let decl = self.reify_at(&positive, name, parents, path)?;
        let (_, child_parents) = self.access(parents, name);

        let mut nested_deny = Vec::new();
        let deny_ty = match negative {
            Some(negative) => Some(self.reify_child(
                &negative,
                "Not",
                &child_parents,
                &path.push(PathComponent::key("not")),
                &mut nested_deny,
            )?),
            None => None,
        };

        match decl {
            CodeDecl::Struct {
                name,
                doc,
                access,
                fields,
                extra,
                deny: _,
                mut nested,
                conformances,
            } => {
                nested.extend(nested_deny);
                Ok(CodeDecl::Struct {
                    name,
                    doc,
                    access,
                    fields,
                    extra,
                    deny: deny_ty,
                    nested,
                    conformances,
                })
            }
            // a bare `not` with no positive shape still decodes as a guard
            // around an open object
            CodeDecl::Alias { name, doc, access, target }
                if target == CodeType::Primitive(Primitive::Bric) =>
            {
                let mut conformances = BTreeSet::new();
                if self.options.generate_equals {
                    conformances.insert("PartialEq".to_string());
                }
                Ok(CodeDecl::Struct {
                    name,
                    doc,
                    access,
                    fields: Vec::new(),
                    extra: ExtraProps::Capture,
                    deny: deny_ty,
                    nested: nested_deny,
                    conformances,
                })
            }
            _ => Err(ReifyError::new(
                ReifyErrorKind::UnsupportedKeyword,
                path.clone(),
                "not requires an object-shaped positive schema",
            )),
        }
    }

    fn reify_struct(
        &mut self,
        schema: &Schema,
        name: &str,
        doc: Option<String>,
        access: Access,
        child_parents: &[String],
        path: &Pointer,
    ) -> Result<CodeDecl, ReifyError> {
        let mut nested = Vec::new();
        let mut used = HashSet::new();
        let fields = self.struct_fields(schema, child_parents, path, &mut nested, &mut used)?;
        let extra = self.extra_props(schema, child_parents, path, &mut nested)?;
        Ok(self.finish_struct(name, doc, access, fields, extra, None, nested))
    }

    fn struct_fields(
        &mut self,
        schema: &Schema,
        child_parents: &[String],
        path: &Pointer,
        nested: &mut Vec<CodeDecl>,
        used: &mut HashSet<String>,
    ) -> Result<Vec<Field>, ReifyError> {
        // the capture field's name is spoken for
        used.insert("additional_properties".to_string());

        let mut properties: Vec<(&String, &Schema)> = schema.properties.iter().collect();
        if !self.options.preserve_property_order {
            properties.sort_by(|a, b| a.0.cmp(b.0));
        }

        let mut fields = Vec::with_capacity(properties.len());
        for (key, property) in properties {
            let field_name = uniquify(self.sanitize(&to_snake_case(key)), used);
            used.insert(field_name.clone());
            let property_path = path
                .push(PathComponent::key("properties"))
                .push(PathComponent::key(key.as_str()));
            let mut ty =
                self.reify_child(property, key, child_parents, &property_path, nested)?;
            let required = schema.required.iter().any(|r| r == key);
            let default = property.default.clone();
            if !required && default.is_none() {
                ty = ty.optional();
            }
            fields.push(Field {
                name: field_name,
                json_name: key.clone(),
                ty,
                required,
                default,
                doc: property.description.clone(),
            });
        }

        // required names without a matching property decode as raw values
        for key in &schema.required {
            if !schema.properties.contains_key(key.as_str()) {
                let field_name = uniquify(self.sanitize(&to_snake_case(key)), used);
                used.insert(field_name.clone());
                fields.push(Field {
                    name: field_name,
                    json_name: key.clone(),
                    ty: CodeType::Primitive(Primitive::Bric),
                    required: true,
                    default: None,
                    doc: None,
                });
            }
        }
        Ok(fields)
    }

    fn extra_props(
        &mut self,
        schema: &Schema,
        child_parents: &[String],
        path: &Pointer,
        nested: &mut Vec<CodeDecl>,
    ) -> Result<ExtraProps, ReifyError> {
        match &schema.additional {
            Some(Additional::Allowed(false)) => Ok(ExtraProps::Forbid),
            Some(Additional::Allowed(true)) | None => Ok(ExtraProps::Capture),
            Some(Additional::Schema(extra)) => {
                let ty = self.reify_child(
                    extra,
                    "Additional",
                    child_parents,
                    &path.push(PathComponent::key("additionalProperties")),
                    nested,
                )?;
                Ok(ExtraProps::Typed(ty))
            }
        }
    }

    fn finish_struct(
        &mut self,
        name: &str,
        doc: Option<String>,
        access: Access,
        mut fields: Vec<Field>,
        extra: ExtraProps,
        deny: Option<CodeType>,
        nested: Vec<CodeDecl>,
    ) -> CodeDecl {
        if fields.len() > self.options.indirect_count_threshold {
            for field in &mut fields {
                field.ty = boxed_everywhere(field.ty.clone());
            }
        }
        let mut conformances = BTreeSet::new();
        if self.options.generate_equals {
            conformances.insert("PartialEq".to_string());
        }
        CodeDecl::Struct {
            name: name.to_string(),
            doc,
            access,
            fields,
            extra,
            deny,
            nested,
            conformances,
        }
    }

    fn reify_array_target(
        &mut self,
        schema: &Schema,
        child_parents: &[String],
        path: &Pointer,
    ) -> Result<CodeType, ReifyError> {
        let mut scratch = Vec::new();
        match &schema.items {
            None => Ok(CodeType::Array(Box::new(CodeType::Primitive(
                Primitive::Bric,
            )))),
            Some(Items::One(item)) => {
                let raw = item.title.clone().unwrap_or_else(|| "Item".to_string());
                let ty = self.reify_child(
                    item,
                    &raw,
                    child_parents,
                    &path.push(PathComponent::key("items")),
                    &mut scratch,
                )?;
                self.adopt(scratch);
                match (schema.min_items, schema.max_items) {
                    (Some(min), Some(max)) if min == max && (1..=8).contains(&min) => {
                        Ok(CodeType::Tuple(vec![ty; min as usize]))
                    }
                    _ => Ok(CodeType::Array(Box::new(ty))),
                }
            }
            Some(Items::Tuple(items)) => {
                let mut types = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let raw = item
                        .title
                        .clone()
                        .unwrap_or_else(|| format!("Item{}", index + 1));
                    let item_path = path
                        .push(PathComponent::key("items"))
                        .push(PathComponent::index(index));
                    types.push(self.reify_child(
                        item,
                        &raw,
                        child_parents,
                        &item_path,
                        &mut scratch,
                    )?);
                }
                self.adopt(scratch);
                Ok(CodeType::Tuple(types))
            }
        }
    }

    /// Item declarations of an alias have no struct to nest under; they
    /// become module-level declarations.
    fn adopt(&mut self, decls: Vec<CodeDecl>) {
        self.pending.extend(decls);
    }

    /// Reifies a child schema under `raw`. Aliases collapse into the type
    /// they point at; anything structural lands in `nested` and is referred
    /// to by name.
    fn reify_child(
        &mut self,
        schema: &Schema,
        raw: &str,
        parents: &[String],
        path: &Pointer,
        nested: &mut Vec<CodeDecl>,
    ) -> Result<CodeType, ReifyError> {
        let name = self.decl_name(parents, raw);
        let decl = self.reify_at(schema, &name, parents, path)?;
        match decl {
            CodeDecl::Alias { target, .. } => {
                self.taken.remove(&name);
                Ok(target)
            }
            other => {
                nested.push(other);
                Ok(CodeType::Named(name))
            }
        }
    }
}

fn uniquify(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn primitive_target(types: Vec<SimpleType>) -> CodeType {
    let non_null: Vec<SimpleType> = types
        .iter()
        .copied()
        .filter(|t| *t != SimpleType::Null)
        .collect();
    let nullable = non_null.len() < types.len();
    let base = match non_null.first() {
        None => return CodeType::Primitive(Primitive::Null),
        Some(SimpleType::Boolean) => CodeType::Primitive(Primitive::Bool),
        Some(SimpleType::Integer) => CodeType::Primitive(Primitive::Int),
        Some(SimpleType::Number) => CodeType::Primitive(Primitive::Double),
        Some(SimpleType::String) => CodeType::Primitive(Primitive::Str),
        // a bare "object"/"array" or a wider union carries no more shape
        // than a raw value
        Some(_) => CodeType::Primitive(Primitive::Bric),
    };
    if nullable && non_null.len() == 1 {
        base.optional()
    } else if non_null.len() > 1 {
        CodeType::Primitive(Primitive::Bric)
    } else {
        base
    }
}

/// Wraps every named reference in `Indirect`, used when a struct grows past
/// the field-count threshold.
fn boxed_everywhere(ty: CodeType) -> CodeType {
    match ty {
        named @ CodeType::Named(_) => named.indirect(),
        CodeType::Optional(inner) => CodeType::Optional(Box::new(boxed_everywhere(*inner))),
        CodeType::Tuple(items) => {
            CodeType::Tuple(items.into_iter().map(boxed_everywhere).collect())
        }
        other => other,
    }
}

/// Wraps value-sized references to `target` in `Indirect`. `Array` and
/// `Map` already live on the heap and stop the walk.
fn boxed_named(ty: CodeType, target: &str) -> CodeType {
    match ty {
        CodeType::Named(name) if name == target => CodeType::Named(name).indirect(),
        CodeType::Optional(inner) => CodeType::Optional(Box::new(boxed_named(*inner, target))),
        CodeType::Tuple(items) => CodeType::Tuple(
            items
                .into_iter()
                .map(|item| boxed_named(item, target))
                .collect(),
        ),
        other => other,
    }
}

/// Collects named references in value-sized positions of `ty`.
fn named_value_refs(ty: &CodeType, out: &mut Vec<String>) {
    match ty {
        CodeType::Named(name) => out.push(name.clone()),
        CodeType::Optional(inner) => named_value_refs(inner, out),
        CodeType::Tuple(items) => {
            for item in items {
                named_value_refs(item, out);
            }
        }
        _ => {}
    }
}

/// Detects declarations that contain themselves, directly or transitively,
/// in value-sized fields and boxes the references that close each cycle.
fn break_cycles(decls: &mut Vec<CodeDecl>) {
    fn collect<'a>(decl: &'a CodeDecl, index: &mut HashMap<String, Vec<String>>) {
        let mut refs = Vec::new();
        match decl {
            CodeDecl::Struct { fields, nested, .. } => {
                for field in fields {
                    named_value_refs(&field.ty, &mut refs);
                }
                for child in nested {
                    collect(child, index);
                }
            }
            CodeDecl::Sum { cases, nested, .. } => {
                for case in cases {
                    if let Some(payload) = &case.payload {
                        named_value_refs(payload, &mut refs);
                    }
                }
                for child in nested {
                    collect(child, index);
                }
            }
            CodeDecl::Alias { target, .. } => named_value_refs(target, &mut refs),
            CodeDecl::Enum { .. } => {}
        }
        index.insert(decl.name().to_string(), refs);
    }

    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    for decl in decls.iter() {
        collect(decl, &mut edges);
    }

    // tri-state walk: 0 unvisited, 1 visiting, 2 done; an edge into a node
    // still being visited closes a cycle
    let mut state: HashMap<String, u8> = HashMap::new();
    let mut to_box: Vec<(String, String)> = Vec::new();

    fn visit(
        name: &str,
        edges: &HashMap<String, Vec<String>>,
        state: &mut HashMap<String, u8>,
        to_box: &mut Vec<(String, String)>,
    ) {
        state.insert(name.to_string(), 1);
        if let Some(targets) = edges.get(name) {
            for target in targets {
                match state.get(target.as_str()).copied().unwrap_or(0) {
                    1 => to_box.push((name.to_string(), target.clone())),
                    0 if edges.contains_key(target.as_str()) => {
                        visit(target, edges, state, to_box)
                    }
                    _ => {}
                }
            }
        }
        state.insert(name.to_string(), 2);
    }

    let names: Vec<String> = decls.iter().map(|d| d.name().to_string()).collect();
    for name in &names {
        if state.get(name.as_str()).copied().unwrap_or(0) == 0 {
            visit(name, &edges, &mut state, &mut to_box);
        }
    }

    if to_box.is_empty() {
        return;
    }

    fn apply(decl: &mut CodeDecl, owner: &str, target: &str) {
        match decl {
            CodeDecl::Struct { name, fields, nested, .. } => {
                if name == owner {
                    for field in fields {
                        field.ty = boxed_named(field.ty.clone(), target);
                    }
                }
                for child in nested {
                    apply(child, owner, target);
                }
            }
            CodeDecl::Sum { name, cases, nested, .. } => {
                if name == owner {
                    for case in cases {
                        if let Some(payload) = case.payload.take() {
                            case.payload = Some(boxed_named(payload, target));
                        }
                    }
                }
                for child in nested {
                    apply(child, owner, target);
                }
            }
            CodeDecl::Alias { name, target: alias_target, .. } => {
                if name == owner {
                    *alias_target = boxed_named(alias_target.clone(), target);
                }
            }
            CodeDecl::Enum { .. } => {}
        }
    }

    for (owner, target) in to_box {
        for decl in decls.iter_mut() {
            apply(decl, &owner, &target);
        }
    }
}
