//! Rust target: serde-annotated model structs and a typed request builder
//! chain.
//!
//! Each model module renders into `models/src/<module>.rs` with one flat
//! module file per package; the client surface renders into
//! `client/src/<builder>.rs`, one file per resource builder.

use tracing::debug;

use vrap_core::client::{BodyParam, ChildAccessor, ClientModel, RequestModel, ResourceModel};
use vrap_core::graph::{ScalarKind, TypeDeclKind};
use vrap_core::imports::imports_for;
use vrap_core::lowering::{lower, lower_enum, LoweredField, TypeEncoding};
use vrap_core::naming::snake_case;
use vrap_core::{Backend, CodegenError, ImportRef, ModulePlan, OutputUnit, TypeResolver, VrapType};

/// Rust code generation target.
#[derive(Debug, Default)]
pub struct RustBackend;

/// Identifiers that need escaping in generated field and module positions.
/// `crate`, `self`, `super` and `Self` cannot be raw identifiers and get a
/// trailing underscore instead.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while",
];

fn field_ident(name: &str) -> String {
    let snake = snake_case(name);
    if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else if matches!(snake.as_str(), "crate" | "self" | "super") {
        format!("{snake}_")
    } else {
        snake
    }
}

/// Flat module file name for a package path, e.g. `com/example/types`
/// becomes `com_example_types`.
fn module_file(package: &str) -> String {
    if package.is_empty() {
        "models".to_string()
    } else {
        package.replace('/', "_")
    }
}

fn scalar_type(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "bool",
        ScalarKind::Integer => "i32",
        ScalarKind::Long => "i64",
        ScalarKind::Double => "f64",
        ScalarKind::String => "String",
        ScalarKind::DateTime => "DateTime<Utc>",
        ScalarKind::Date => "NaiveDate",
        ScalarKind::Time => "NaiveTime",
        ScalarKind::File => "std::fs::File",
        ScalarKind::Any => "serde_json::Value",
    }
}

fn rust_type(ty: &VrapType) -> String {
    match ty {
        VrapType::Object { simple_name, .. } | VrapType::Enum { simple_name, .. } => {
            simple_name.clone()
        }
        VrapType::Scalar(kind) => scalar_type(*kind).to_string(),
        VrapType::Array(item) => format!("Vec<{}>", rust_type(item)),
        VrapType::Nil => "serde_json::Value".to_string(),
    }
}

fn field_type(field: &LoweredField) -> String {
    let mut ty = rust_type(&field.ty);
    if field.indirect {
        ty = format!("Box<{ty}>");
    }
    if field.optional {
        ty = format!("Option<{ty}>");
    }
    ty
}

fn push_field(out: &mut String, field: &LoweredField, indent: &str) {
    let ident = field_ident(&field.name);
    // Only the `r#` prefix is transparent to serde; underscore-suffixed
    // escapes like `self_` change the emitted key and need a rename.
    let plain = ident.strip_prefix("r#").unwrap_or(ident.as_str());
    if field.deprecated {
        out.push_str(indent);
        out.push_str("#[deprecated]\n");
    }
    if plain != field.wire_name {
        out.push_str(indent);
        out.push_str(&format!("#[serde(rename = \"{}\")]\n", field.wire_name));
    }
    if field.optional {
        out.push_str(indent);
        out.push_str("#[serde(skip_serializing_if = \"Option::is_none\", default)]\n");
    }
    out.push_str(indent);
    out.push_str(&format!("pub {ident}: {},\n", field_type(field)));
}

/// Chrono imports needed by the scalar kinds appearing in a module.
fn chrono_names(resolver: &TypeResolver<'_>, plan: &ModulePlan) -> Vec<&'static str> {
    let mut names = Vec::new();
    let graph = resolver.graph();
    let mut visit = |ty: &VrapType| match ty.flattened() {
        VrapType::Scalar(ScalarKind::DateTime) => {
            for n in ["DateTime", "Utc"] {
                if !names.contains(&n) {
                    names.push(n);
                }
            }
        }
        VrapType::Scalar(ScalarKind::Date) => {
            if !names.contains(&"NaiveDate") {
                names.push("NaiveDate");
            }
        }
        VrapType::Scalar(ScalarKind::Time) => {
            if !names.contains(&"NaiveTime") {
                names.push("NaiveTime");
            }
        }
        _ => {}
    };
    for &id in &plan.types {
        for prop in graph.all_properties(id) {
            visit(&resolver.resolve(&prop.ty));
        }
        if graph.is_discriminated(id) {
            if let Some((_, obj)) = graph.object(id) {
                for sub in graph.named_subtypes(obj) {
                    for prop in graph.all_properties(sub.id) {
                        visit(&resolver.resolve(&prop.ty));
                    }
                }
            }
        }
    }
    names.sort_unstable();
    names
}

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn container_dependency(&self) -> Option<ImportRef> {
        Some(ImportRef::external("std/collections", "HashMap"))
    }

    fn render_module(
        &self,
        resolver: &TypeResolver<'_>,
        module: &ModulePlan,
    ) -> Result<Vec<OutputUnit>, CodegenError> {
        let mut out = String::new();
        out.push_str("use serde::{Deserialize, Serialize};\n");

        let chrono = chrono_names(resolver, module);
        if !chrono.is_empty() {
            out.push_str(&format!("use chrono::{{{}}};\n", chrono.join(", ")));
        }
        let container = self.container_dependency();
        for group in imports_for(resolver, &module.types, &module.package, container.as_ref()) {
            if group.external {
                out.push_str(&format!(
                    "use {}::{{{}}};\n",
                    group.package.replace('/', "::"),
                    group.names.join(", ")
                ));
            } else {
                out.push_str(&format!(
                    "use crate::{}::{{{}}};\n",
                    module_file(&group.package),
                    group.names.join(", ")
                ));
            }
        }
        out.push('\n');

        for &id in &module.types {
            let Some(decl) = resolver.graph().get(id) else {
                continue;
            };
            let vrap = resolver.resolve_id(id);
            let Some(name) = vrap.simple_name() else {
                continue;
            };
            match &decl.kind {
                TypeDeclKind::StringEnum(_) => {
                    let encoding = lower_enum(resolver, id)?;
                    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]\n");
                    out.push_str(&format!("pub enum {name} {{\n"));
                    for value in &encoding.values {
                        out.push_str(&format!("    #[serde(rename = \"{}\")]\n", value.wire));
                        out.push_str(&format!("    {},\n", value.variant));
                    }
                    out.push_str("}\n\n");
                }
                TypeDeclKind::Object(_) => match lower(resolver, id)? {
                    TypeEncoding::Map { value } => {
                        out.push_str(&format!(
                            "pub type {name} = HashMap<String, {}>;\n\n",
                            rust_type(&value)
                        ));
                    }
                    TypeEncoding::Union {
                        discriminator,
                        variants,
                    } => {
                        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
                        out.push_str(&format!("#[serde(tag = \"{discriminator}\")]\n"));
                        out.push_str(&format!("pub enum {name} {{\n"));
                        for variant in &variants {
                            let variant_name =
                                variant.ty.simple_name().unwrap_or(variant.tag.as_str());
                            out.push_str(&format!("    #[serde(rename = \"{}\")]\n", variant.tag));
                            if variant.fields.is_empty() {
                                out.push_str(&format!("    {variant_name},\n"));
                            } else {
                                out.push_str(&format!("    {variant_name} {{\n"));
                                for field in &variant.fields {
                                    push_field(&mut out, field, "        ");
                                }
                                out.push_str("    },\n");
                            }
                        }
                        out.push_str("}\n\n");
                    }
                    TypeEncoding::Struct { fields } => {
                        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
                        out.push_str(&format!("pub struct {name} {{\n"));
                        for field in &fields {
                            push_field(&mut out, field, "    ");
                        }
                        out.push_str("}\n\n");
                    }
                },
            }
        }

        let path = format!("models/src/{}.rs", module_file(&module.package));
        debug!(%path, "rendered rust module");
        Ok(vec![OutputUnit::new(path, out)])
    }

    fn render_client(
        &self,
        _resolver: &TypeResolver<'_>,
        client: &ClientModel,
    ) -> Result<Vec<OutputUnit>, CodegenError> {
        client
            .resources
            .iter()
            .map(|resource| {
                let path = format!("client/src/{}.rs", snake_case(&resource.name));
                Ok(OutputUnit::new(path, render_builder(resource)))
            })
            .collect()
    }
}

fn render_builder(resource: &ResourceModel) -> String {
    let mut out = String::new();
    out.push_str("#[derive(Debug, Clone)]\n");
    out.push_str(&format!("pub struct {} {{\n", resource.name));
    for param in &resource.path_params {
        out.push_str(&format!("    pub {}: String,\n", field_ident(param)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {} {{\n", resource.name));
    for child in &resource.children {
        push_child_accessor(&mut out, resource, child);
    }
    for request in &resource.requests {
        push_request_method(&mut out, resource, request);
    }
    out.push_str("}\n");

    for request in &resource.requests {
        out.push('\n');
        push_request_type(&mut out, request);
    }
    out
}

fn push_child_accessor(out: &mut String, resource: &ResourceModel, child: &ChildAccessor) {
    let args: Vec<String> = child
        .args
        .iter()
        .map(|a| format!("{}: impl Into<String>", field_ident(a)))
        .collect();
    out.push_str(&format!(
        "    pub fn {}(&self{}{}) -> crate::{}::{} {{\n",
        snake_case(&child.name),
        if args.is_empty() { "" } else { ", " },
        args.join(", "),
        snake_case(&child.resource_name),
        child.resource_name
    ));
    out.push_str(&format!(
        "        crate::{}::{} {{\n",
        snake_case(&child.resource_name),
        child.resource_name
    ));
    for param in &resource.path_params {
        let ident = field_ident(param);
        out.push_str(&format!("            {ident}: self.{ident}.clone(),\n"));
    }
    for arg in &child.args {
        let ident = field_ident(arg);
        out.push_str(&format!("            {ident}: {ident}.into(),\n"));
    }
    out.push_str("        }\n    }\n\n");
}

fn push_request_method(out: &mut String, resource: &ResourceModel, request: &RequestModel) {
    let mut args = Vec::new();
    if let BodyParam::Typed(ty) = &request.body {
        args.push(format!("body: {}", rust_type(ty)));
    }
    if matches!(request.body, BodyParam::FormEntries) {
        args.push("form: Vec<(String, String)>".to_string());
    }
    if matches!(request.body, BodyParam::Opaque) {
        args.push("body: Vec<u8>".to_string());
    }
    out.push_str(&format!(
        "    pub fn {}(&self{}{}) -> {} {{\n",
        request.verb.as_str(),
        if args.is_empty() { "" } else { ", " },
        args.join(", "),
        request.name
    ));
    out.push_str(&format!("        {} {{\n", request.name));
    for param in &resource.path_params {
        let ident = field_ident(param);
        out.push_str(&format!("            {ident}: self.{ident}.clone(),\n"));
    }
    match &request.body {
        BodyParam::Typed(_) => out.push_str("            body,\n"),
        BodyParam::FormEntries => out.push_str("            form,\n"),
        BodyParam::Opaque => out.push_str("            body,\n"),
        BodyParam::None => {}
    }
    for param in &request.query_params {
        out.push_str(&format!("            {}: None,\n", field_ident(&param.name)));
    }
    out.push_str("        }\n    }\n\n");
}

fn push_request_type(out: &mut String, request: &RequestModel) {
    out.push_str("#[derive(Debug, Clone)]\n");
    out.push_str(&format!("pub struct {} {{\n", request.name));
    for param in &request.path_params {
        out.push_str(&format!("    pub {}: String,\n", field_ident(param)));
    }
    match &request.body {
        BodyParam::Typed(ty) => out.push_str(&format!("    pub body: {},\n", rust_type(ty))),
        BodyParam::FormEntries => out.push_str("    pub form: Vec<(String, String)>,\n"),
        BodyParam::Opaque => out.push_str("    pub body: Vec<u8>,\n"),
        BodyParam::None => {}
    }
    for param in &request.query_params {
        out.push_str(&format!(
            "    pub {}: Option<{}>,\n",
            field_ident(&param.name),
            rust_type(&param.ty)
        ));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {} {{\n", request.name));
    out.push_str("    pub fn uri(&self) -> String {\n");
    let mut uri_expr = format!("        let mut uri = \"{}\".to_string();\n", request.full_uri);
    for param in &request.path_params {
        uri_expr.push_str(&format!(
            "        uri = uri.replace(\"{{{param}}}\", &self.{});\n",
            field_ident(param)
        ));
    }
    out.push_str(&uri_expr);
    out.push_str("        uri\n    }\n");

    if !request.query_params.is_empty() {
        out.push_str("\n    pub fn query_pairs(&self) -> Vec<(String, String)> {\n");
        out.push_str("        let mut pairs = Vec::new();\n");
        for param in &request.query_params {
            let ident = field_ident(&param.name);
            let key = match &param.placeholder {
                // The wire key is formed at call time from the placeholder
                // value, not from a fixed name.
                Some(ph) => format!(
                    "\"{}\".replace(\"<{}>\", &self.{ident}.clone().unwrap_or_default())",
                    ph.template, ph.placeholder
                ),
                None => format!("\"{}\".to_string()", param.wire_name),
            };
            out.push_str(&format!(
                "        if let Some(value) = &self.{ident} {{\n"
            ));
            out.push_str(&format!(
                "            pairs.push(({key}, value.to_string()));\n"
            ));
            out.push_str("        }\n");
        }
        out.push_str("        pairs\n    }\n");
    }
    out.push_str("}\n");
}
