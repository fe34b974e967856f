//! Client-side request model derived from the resource tree.
//!
//! The resource tree lowers into a flat, deterministic list of resource
//! builders and request types. All naming decisions happen here once, so
//! every backend emits the same builder chain and the same request type
//! names for the same tree.

use crate::graph::{
    uri_variables, BodyDecl, MediaKind, MethodNode, PlaceholderParam, ResourceNode,
};
use crate::naming::{lower_camel_case, upper_camel_case, uri_to_name};
use crate::resolver::TypeResolver;
use crate::types::VrapType;

/// The whole client surface: one builder per resource node, depth-first in
/// tree order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientModel {
    pub resources: Vec<ResourceModel>,
}

/// One resource builder: its accessors into child resources and the
/// requests its methods produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceModel {
    /// Builder type name derived from the full URI, e.g.
    /// `ThingsByThingIdRequestBuilder`.
    pub name: String,
    pub full_uri: String,
    pub relative_uri: String,
    /// Path variables accumulated along the full URI, in order.
    pub path_params: Vec<String>,
    /// The variables this resource itself introduces (a suffix of
    /// `path_params`).
    pub own_params: Vec<String>,
    pub children: Vec<ChildAccessor>,
    pub requests: Vec<RequestModel>,
}

/// An accessor method from a resource builder to a child builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildAccessor {
    /// Accessor method name in `lowerCamelCase`; backends re-case as needed.
    /// Literal segments keep their name, variable segments become
    /// `with` + the variable, e.g. `withThingId`.
    pub name: String,
    /// Builder type name of the child resource.
    pub resource_name: String,
    /// Path variables the accessor itself introduces.
    pub args: Vec<String>,
}

/// One request type: a method on a resource, fully named and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestModel {
    /// Request type name: the full URI's derived name plus the capitalized
    /// verb, e.g. `ThingsByThingIdGet`.
    pub name: String,
    pub verb: crate::graph::HttpVerb,
    pub full_uri: String,
    pub path_params: Vec<String>,
    pub query_params: Vec<QueryParamModel>,
    pub body: BodyParam,
}

/// A lowered query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParamModel {
    /// Method parameter name in `lowerCamelCase`.
    pub name: String,
    /// Wire name; for placeholder parameters this is the template with the
    /// `<placeholder>` marker still in place, substituted at call time.
    pub wire_name: String,
    pub ty: VrapType,
    pub required: bool,
    pub placeholder: Option<PlaceholderParam>,
}

/// The request body surface of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyParam {
    /// No body.
    None,
    /// JSON body with a resolved model type.
    Typed(VrapType),
    /// Form-data body: a list of string key/value entries.
    FormEntries,
    /// Anything else travels as raw bytes.
    Opaque,
}

/// Build the client model from the resource tree. Deterministic: output
/// order follows the tree, depth-first, methods in declaration order.
pub fn build(resolver: &TypeResolver<'_>) -> ClientModel {
    let mut resources = Vec::new();
    for node in &resolver.graph().resources {
        collect_resource(resolver, node, &mut resources);
    }
    ClientModel { resources }
}

fn collect_resource(
    resolver: &TypeResolver<'_>,
    node: &ResourceNode,
    out: &mut Vec<ResourceModel>,
) {
    let name = format!("{}RequestBuilder", uri_to_name(&node.full_uri));
    let path_params = uri_variables(&node.full_uri);

    let children = node
        .resources
        .iter()
        .map(|child| ChildAccessor {
            name: accessor_name(&child.relative_uri),
            resource_name: format!("{}RequestBuilder", uri_to_name(&child.full_uri)),
            args: uri_variables(&child.relative_uri),
        })
        .collect();

    let requests = node
        .methods
        .iter()
        .map(|method| build_request(resolver, node, method))
        .collect();

    out.push(ResourceModel {
        name,
        full_uri: node.full_uri.clone(),
        relative_uri: node.relative_uri.clone(),
        path_params,
        own_params: uri_variables(&node.relative_uri),
        children,
        requests,
    });

    for child in &node.resources {
        collect_resource(resolver, child, out);
    }
}

/// Accessor name for a relative URI: literal segments camel-join, variable
/// segments contribute `With` + the variable name.
fn accessor_name(relative_uri: &str) -> String {
    let mut name = String::new();
    for segment in relative_uri.split('/').filter(|s| !s.is_empty()) {
        if let Some(var) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            name.push_str("With");
            name.push_str(&upper_camel_case(var));
        } else {
            name.push_str(&upper_camel_case(segment));
        }
    }
    lower_camel_case(&name)
}

fn build_request(
    resolver: &TypeResolver<'_>,
    node: &ResourceNode,
    method: &MethodNode,
) -> RequestModel {
    let name = format!("{}{}", uri_to_name(&node.full_uri), method.verb.capitalized());
    let query_params = method
        .query_params
        .iter()
        .map(|param| lower_query_param(resolver, param))
        .collect();
    RequestModel {
        name,
        verb: method.verb,
        full_uri: node.full_uri.clone(),
        path_params: uri_variables(&node.full_uri),
        query_params,
        body: lower_body(resolver, method.body.as_ref()),
    }
}

fn lower_query_param(
    resolver: &TypeResolver<'_>,
    param: &crate::graph::QueryParamDecl,
) -> QueryParamModel {
    match &param.placeholder {
        Some(ph) => QueryParamModel {
            // The annotation replaces the declared name: callers pass the
            // placeholder value and the template yields the wire key.
            name: lower_camel_case(&ph.placeholder),
            wire_name: ph.template.clone(),
            ty: resolver.resolve(&param.ty),
            required: param.required,
            placeholder: Some(ph.clone()),
        },
        None => QueryParamModel {
            name: lower_camel_case(&param.name),
            wire_name: param.name.clone(),
            ty: resolver.resolve(&param.ty),
            required: param.required,
            placeholder: None,
        },
    }
}

/// Body lowering: JSON bodies with a nominal model type are strongly typed,
/// form-data becomes an entry list, everything else is opaque bytes.
fn lower_body(resolver: &TypeResolver<'_>, body: Option<&BodyDecl>) -> BodyParam {
    let Some(body) = body else {
        return BodyParam::None;
    };
    match body.media {
        MediaKind::FormData => BodyParam::FormEntries,
        MediaKind::Json => {
            let resolved = resolver.resolve(&body.ty);
            match resolved {
                VrapType::Object { .. } | VrapType::Enum { .. } | VrapType::Array(_) => {
                    BodyParam::Typed(resolved)
                }
                _ => BodyParam::Opaque,
            }
        }
        MediaKind::Binary => BodyParam::Opaque,
    }
}

/// The set of distinct model types referenced by a client model's bodies;
/// used for client-module imports. Sorted and deduplicated.
pub fn body_types(model: &ClientModel) -> Vec<VrapType> {
    let mut types: Vec<VrapType> = model
        .resources
        .iter()
        .flat_map(|r| &r.requests)
        .filter_map(|req| match &req.body {
            BodyParam::Typed(ty) => Some(ty.flattened().clone()),
            _ => None,
        })
        .collect();
    types.sort_by(|a, b| {
        (a.package().unwrap_or(""), a.simple_name().unwrap_or(""))
            .cmp(&(b.package().unwrap_or(""), b.simple_name().unwrap_or("")))
    });
    types.dedup();
    types
}
