//! TypeScript target: interface declarations, literal-union enums and a
//! fetch-style request builder chain.
//!
//! Modules render one flat file per package under `models/`, the client
//! surface one file per builder under `client/`.

use tracing::debug;

use vrap_core::client::{BodyParam, ChildAccessor, ClientModel, RequestModel, ResourceModel};
use vrap_core::graph::{ScalarKind, TypeDeclKind};
use vrap_core::imports::imports_for;
use vrap_core::lowering::{lower, lower_enum, LoweredField, TypeEncoding};
use vrap_core::naming::lower_camel_case;
use vrap_core::{Backend, CodegenError, ImportRef, ModulePlan, OutputUnit, TypeResolver, VrapType};

/// TypeScript code generation target.
#[derive(Debug, Default)]
pub struct TsBackend;

fn module_file(package: &str) -> String {
    if package.is_empty() {
        "models".to_string()
    } else {
        package.replace('/', "_")
    }
}

fn scalar_type(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "boolean",
        ScalarKind::Integer | ScalarKind::Long | ScalarKind::Double => "number",
        // Temporal kinds travel as ISO strings on the wire.
        ScalarKind::String | ScalarKind::DateTime | ScalarKind::Date | ScalarKind::Time => {
            "string"
        }
        ScalarKind::File => "Blob",
        ScalarKind::Any => "unknown",
    }
}

fn ts_type(ty: &VrapType) -> String {
    match ty {
        VrapType::Object { simple_name, .. } | VrapType::Enum { simple_name, .. } => {
            simple_name.clone()
        }
        VrapType::Scalar(kind) => scalar_type(*kind).to_string(),
        VrapType::Array(item) => format!("{}[]", ts_type(item)),
        VrapType::Nil => "unknown".to_string(),
    }
}

/// Property keys that are not plain identifiers must be quoted.
fn property_key(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c == '$' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if plain {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

fn push_field(out: &mut String, field: &LoweredField, indent: &str) {
    if field.deprecated {
        out.push_str(indent);
        out.push_str("/** @deprecated */\n");
    }
    out.push_str(indent);
    out.push_str(&format!(
        "{}{}: {};\n",
        property_key(&field.wire_name),
        if field.optional { "?" } else { "" },
        // Structural typing keeps recursion legal without indirection.
        ts_type(&field.ty)
    ));
}

impl Backend for TsBackend {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn container_dependency(&self) -> Option<ImportRef> {
        // `Record<string, V>` is built in.
        None
    }

    fn render_module(
        &self,
        resolver: &TypeResolver<'_>,
        module: &ModulePlan,
    ) -> Result<Vec<OutputUnit>, CodegenError> {
        let mut out = String::new();
        for group in imports_for(resolver, &module.types, &module.package, None) {
            if group.external {
                continue;
            }
            out.push_str(&format!(
                "import {{ {} }} from \"./{}\";\n",
                group.names.join(", "),
                module_file(&group.package)
            ));
        }
        if !out.is_empty() {
            out.push('\n');
        }

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
                    let literals: Vec<String> = encoding
                        .values
                        .iter()
                        .map(|v| format!("\"{}\"", v.wire))
                        .collect();
                    out.push_str(&format!(
                        "export type {name} = {};\n\n",
                        literals.join(" | ")
                    ));
                }
                TypeDeclKind::Object(_) => match lower(resolver, id)? {
                    TypeEncoding::Map { value } => {
                        out.push_str(&format!(
                            "export type {name} = Record<string, {}>;\n\n",
                            ts_type(&value)
                        ));
                    }
                    TypeEncoding::Union { variants, .. } => {
                        // The leaf interfaces carry the literal tag; the
                        // alias just distributes over them.
                        let arms: Vec<String> = variants
                            .iter()
                            .map(|v| v.ty.simple_name().unwrap_or(v.tag.as_str()).to_string())
                            .collect();
                        out.push_str(&format!(
                            "export type {name} = {};\n\n",
                            arms.join(" | ")
                        ));
                    }
                    TypeEncoding::Struct { fields } => {
                        out.push_str(&format!("export interface {name} {{\n"));
                        let graph = resolver.graph();
                        let tagged = graph
                            .object(id)
                            .and_then(|(_, obj)| obj.discriminator_value.clone())
                            .zip(graph.discriminator(id));
                        if let Some((tag, disc)) = tagged {
                            out.push_str(&format!(
                                "  {}: \"{tag}\";\n",
                                property_key(disc)
                            ));
                        }
                        for field in &fields {
                            push_field(&mut out, field, "  ");
                        }
                        out.push_str("}\n\n");
                    }
                },
            }
        }

        let path = format!("models/{}.ts", module_file(&module.package));
        debug!(%path, "rendered typescript module");
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
                let path = format!("client/{}.ts", lower_camel_case(&resource.name));
                Ok(OutputUnit::new(path, render_builder(resource)))
            })
            .collect()
    }
}

fn render_builder(resource: &ResourceModel) -> String {
    let mut out = String::new();
    for child in &resource.children {
        out.push_str(&format!(
            "import {{ {} }} from \"./{}\";\n",
            child.resource_name,
            lower_camel_case(&child.resource_name)
        ));
    }
    if !resource.children.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("export class {} {{\n", resource.name));
    out.push_str("  constructor(");
    let ctor: Vec<String> = resource
        .path_params
        .iter()
        .map(|p| format!("readonly {}: string", lower_camel_case(p)))
        .collect();
    out.push_str(&ctor.join(", "));
    out.push_str(") {}\n");

    for child in &resource.children {
        push_child_accessor(&mut out, resource, child);
    }
    for request in &resource.requests {
        push_request_method(&mut out, resource, request);
    }
    out.push_str("}\n");
    out
}

fn push_child_accessor(out: &mut String, resource: &ResourceModel, child: &ChildAccessor) {
    let params: Vec<String> = child
        .args
        .iter()
        .map(|a| format!("{}: string", lower_camel_case(a)))
        .collect();
    let mut args: Vec<String> = resource
        .path_params
        .iter()
        .map(|p| format!("this.{}", lower_camel_case(p)))
        .collect();
    args.extend(child.args.iter().map(|a| lower_camel_case(a)));
    out.push_str(&format!(
        "\n  {}({}): {} {{\n    return new {}({});\n  }}\n",
        child.name,
        params.join(", "),
        child.resource_name,
        child.resource_name,
        args.join(", ")
    ));
}

fn push_request_method(out: &mut String, resource: &ResourceModel, request: &RequestModel) {
    let mut uri = format!("`{}`", request.full_uri);
    for param in &resource.path_params {
        uri = uri.replace(
            &format!("{{{param}}}"),
            &format!("${{this.{}}}", lower_camel_case(param)),
        );
    }

    let mut params = Vec::new();
    match &request.body {
        BodyParam::Typed(ty) => params.push(format!("body: {}", ts_type(ty))),
        BodyParam::FormEntries => params.push("form: [string, string][]".to_string()),
        BodyParam::Opaque => params.push("body: BodyInit".to_string()),
        BodyParam::None => {}
    }
    if !request.query_params.is_empty() {
        let fields: Vec<String> = request
            .query_params
            .iter()
            .map(|p| format!("{}?: {}", property_key(&p.name), ts_type(&p.ty)))
            .collect();
        params.push(format!("query?: {{ {} }}", fields.join("; ")));
    }

    out.push_str(&format!(
        "\n  {}({}): Request {{\n",
        request.verb.as_str(),
        params.join(", ")
    ));
    out.push_str(&format!("    const uri = {uri};\n"));
    match &request.body {
        BodyParam::Typed(_) => {
            out.push_str(&format!(
                "    return new Request(uri, {{ method: \"{}\", body: JSON.stringify(body) }});\n",
                request.verb.as_str().to_uppercase()
            ));
        }
        BodyParam::FormEntries => {
            out.push_str("    const data = new FormData();\n");
            out.push_str("    for (const [key, value] of form) data.append(key, value);\n");
            out.push_str(&format!(
                "    return new Request(uri, {{ method: \"{}\", body: data }});\n",
                request.verb.as_str().to_uppercase()
            ));
        }
        BodyParam::Opaque => {
            out.push_str(&format!(
                "    return new Request(uri, {{ method: \"{}\", body }});\n",
                request.verb.as_str().to_uppercase()
            ));
        }
        BodyParam::None => {
            out.push_str(&format!(
                "    return new Request(uri, {{ method: \"{}\" }});\n",
                request.verb.as_str().to_uppercase()
            ));
        }
    }
    out.push_str("  }\n");
}
