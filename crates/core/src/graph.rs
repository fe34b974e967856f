//! Upstream parsed API graph.
//!
//! This is the input contract of the generator: a host tool (RAML/OpenAPI
//! parser) produces an immutable, arena-style graph of type declarations and
//! a resource tree, then hands it to the core. The core never parses text
//! itself.
//!
//! Nodes reference each other through [`TypeId`] indices into
//! [`ApiGraph::types`]; the graph is immutable for the duration of a
//! generation run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity of a declared type within an [`ApiGraph`].
///
/// Doubles as the memoization key for type resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TypeId(pub usize);

/// Scalar axis of the type model, independent of any target language.
///
/// Backends map each kind to a native type name through their scalar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    Boolean,
    Integer,
    Long,
    Double,
    String,
    DateTime,
    Date,
    Time,
    File,
    Any,
}

impl ScalarKind {
    /// Canonical, target-independent name of the scalar.
    pub fn canonical_name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Integer => "integer",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Date => "date",
            ScalarKind::Time => "time",
            ScalarKind::File => "file",
            ScalarKind::Any => "any",
        }
    }
}

/// A type reference as it appears on properties, bodies and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Reference to a declared type.
    Ref(TypeId),
    /// A scalar from the default namespace.
    Scalar(ScalarKind),
    /// Homogeneous ordered sequence; nests recursively.
    Array(Box<TypeExpr>),
    /// Union of alternatives; resolved to the common base type when one
    /// exists, otherwise to the any-typed fallback.
    Union(Vec<TypeExpr>),
    /// Absence of a type.
    Nil,
}

/// A declared type reachable from the API description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub id: TypeId,
    pub name: String,
    /// Declared namespace annotation; falls back to the configured base
    /// package when absent.
    #[serde(default)]
    pub namespace: Option<String>,
    pub kind: TypeDeclKind,
}

/// The two declarable shapes of the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDeclKind {
    Object(ObjectDecl),
    StringEnum(EnumDecl),
}

/// An object type: properties, inheritance and discriminator metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectDecl {
    #[serde(default)]
    pub supertype: Option<TypeId>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    /// Discriminator property name; present on the polymorphic root.
    #[serde(default)]
    pub discriminator: Option<String>,
    /// Concrete discriminator value; present only on leaf variants.
    #[serde(default)]
    pub discriminator_value: Option<String>,
    /// Declared subtypes, in declaration order.
    #[serde(default)]
    pub subtypes: Vec<TypeId>,
    /// Explicit `asMap` annotation.
    #[serde(default)]
    pub as_map: bool,
}

/// A closed string-backed enumeration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub values: Vec<String>,
}

/// A property of an object type. The name may be a pattern (`/.*/`),
/// signaling map-like semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub deprecated: bool,
}

fn default_true() -> bool {
    true
}

impl PropertyDecl {
    /// Whether the declared name is a pattern rather than a literal key.
    pub fn is_pattern(&self) -> bool {
        self.name.len() >= 2 && self.name.starts_with('/') && self.name.ends_with('/')
    }
}

/// HTTP verb of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Patch => "patch",
            HttpVerb::Delete => "delete",
            HttpVerb::Head => "head",
            HttpVerb::Options => "options",
        }
    }

    /// Capitalized form, used in request type names.
    pub fn capitalized(self) -> &'static str {
        match self {
            HttpVerb::Get => "Get",
            HttpVerb::Post => "Post",
            HttpVerb::Put => "Put",
            HttpVerb::Patch => "Patch",
            HttpVerb::Delete => "Delete",
            HttpVerb::Head => "Head",
            HttpVerb::Options => "Options",
        }
    }
}

/// Media kind of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Json,
    FormData,
    Binary,
}

/// A request body declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDecl {
    pub media: MediaKind,
    pub ty: TypeExpr,
}

/// `placeholderParam` annotation on a query parameter: the wire name is
/// derived from `template` by substituting the `<placeholder>` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderParam {
    pub placeholder: String,
    pub template: String,
}

/// A query parameter of a method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParamDecl {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<PlaceholderParam>,
}

/// A method on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodNode {
    pub verb: HttpVerb,
    #[serde(default)]
    pub query_params: Vec<QueryParamDecl>,
    #[serde(default)]
    pub body: Option<BodyDecl>,
}

/// A node of the resource tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Full URI template from the API root, e.g. `/things/{thingId}/parts`.
    pub full_uri: String,
    /// URI template relative to the parent resource.
    pub relative_uri: String,
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
    #[serde(default)]
    pub methods: Vec<MethodNode>,
}

/// The parsed API graph: every declared type plus the resource tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiGraph {
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
}

impl ApiGraph {
    /// Look up a declaration; absent ids yield `None` (resolution stays
    /// total and maps them to `Nil`).
    pub fn get(&self, id: TypeId) -> Option<&TypeDecl> {
        self.types.get(id.0).filter(|decl| decl.id == id)
    }

    /// Look up an object declaration.
    pub fn object(&self, id: TypeId) -> Option<(&TypeDecl, &ObjectDecl)> {
        self.get(id).and_then(|decl| match &decl.kind {
            TypeDeclKind::Object(obj) => Some((decl, obj)),
            TypeDeclKind::StringEnum(_) => None,
        })
    }

    /// All properties of an object, inherited first, own properties
    /// overriding inherited ones of the same name.
    pub fn all_properties(&self, id: TypeId) -> Vec<&PropertyDecl> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if !seen.insert(current) {
                // Inheritance cycle; ordering reports it as a fatal error,
                // here we just stop walking.
                break;
            }
            let Some((_, obj)) = self.object(current) else {
                break;
            };
            chain.push(obj);
            cursor = obj.supertype;
        }

        let mut props: Vec<&PropertyDecl> = Vec::new();
        for obj in chain.iter().rev() {
            for prop in &obj.properties {
                if let Some(slot) = props.iter_mut().find(|p| p.name == prop.name) {
                    *slot = prop;
                } else {
                    props.push(prop);
                }
            }
        }
        props
    }

    /// Properties inherited from the supertype chain.
    pub fn super_properties(&self, id: TypeId) -> Vec<&PropertyDecl> {
        self.object(id)
            .and_then(|(_, obj)| obj.supertype)
            .map(|parent| self.all_properties(parent))
            .unwrap_or_default()
    }

    /// Declared subtypes that are themselves named object declarations.
    pub fn named_subtypes(&self, obj: &ObjectDecl) -> Vec<&TypeDecl> {
        obj.subtypes
            .iter()
            .filter_map(|&sub| self.get(sub))
            .collect()
    }

    /// The discriminator property name in effect for a type, declared on
    /// itself or inherited from an ancestor.
    pub fn discriminator(&self, id: TypeId) -> Option<&str> {
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if !seen.insert(current) {
                break;
            }
            let (_, obj) = self.object(current)?;
            if let Some(disc) = &obj.discriminator {
                return Some(disc.as_str());
            }
            cursor = obj.supertype;
        }
        None
    }

    /// Whether a type is the root of a discriminated hierarchy: it has a
    /// discriminator in effect, no concrete discriminator value of its own,
    /// and its parent is not already a leaf variant.
    pub fn is_discriminated(&self, id: TypeId) -> bool {
        let Some((_, obj)) = self.object(id) else {
            return false;
        };
        if self.discriminator(id).is_none() || obj.discriminator_value.is_some() {
            return false;
        }
        if let Some(parent) = obj.supertype {
            if let Some((_, parent_obj)) = self.object(parent) {
                if parent_obj.discriminator_value.is_some() {
                    return false;
                }
            }
        }
        true
    }

    /// Whether a type is map-like: explicitly annotated (on itself or its
    /// supertype), or every one of its (non-empty) properties is a pattern
    /// property.
    pub fn is_map_type(&self, id: TypeId) -> bool {
        let Some((_, obj)) = self.object(id) else {
            return false;
        };
        if obj.as_map {
            return true;
        }
        if let Some(parent) = obj.supertype {
            if let Some((_, parent_obj)) = self.object(parent) {
                if parent_obj.as_map {
                    return true;
                }
            }
        }
        let props = self.all_properties(id);
        !props.is_empty() && props.iter().all(|p| p.is_pattern())
    }
}

/// Ordered path-variable names of a URI template, e.g. `{id}` yields `id`.
pub fn uri_variables(template: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut current = String::new();
    let mut in_var = false;
    for c in template.chars() {
        match c {
            '{' => {
                in_var = true;
                current.clear();
            }
            '}' => {
                if in_var && !current.is_empty() {
                    vars.push(std::mem::take(&mut current));
                }
                in_var = false;
            }
            _ if in_var => current.push(c),
            _ => {}
        }
    }
    vars
}

/// Incremental construction of an [`ApiGraph`], the shape host parsers use.
///
/// `finish` derives each object's `subtypes` list from the declared
/// supertype edges so callers only state the relationship once.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    types: Vec<TypeDecl>,
    resources: Vec<ResourceNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty object declaration; fill it in via [`Self::object_mut`].
    pub fn add_object(&mut self, name: &str, namespace: Option<&str>) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(TypeDecl {
            id,
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            kind: TypeDeclKind::Object(ObjectDecl::default()),
        });
        id
    }

    /// Add a string enumeration declaration.
    pub fn add_enum(&mut self, name: &str, namespace: Option<&str>, values: &[&str]) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(TypeDecl {
            id,
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            kind: TypeDeclKind::StringEnum(EnumDecl {
                values: values.iter().map(|v| (*v).to_string()).collect(),
            }),
        });
        id
    }

    /// Mutable access to an object declaration added earlier.
    pub fn object_mut(&mut self, id: TypeId) -> Option<&mut ObjectDecl> {
        self.types.get_mut(id.0).and_then(|decl| match &mut decl.kind {
            TypeDeclKind::Object(obj) => Some(obj),
            TypeDeclKind::StringEnum(_) => None,
        })
    }

    /// Add a root resource.
    pub fn add_resource(&mut self, resource: ResourceNode) {
        self.resources.push(resource);
    }

    pub fn finish(mut self) -> ApiGraph {
        // Derive subtype lists from supertype edges, in declaration order.
        let edges: Vec<(TypeId, TypeId)> = self
            .types
            .iter()
            .filter_map(|decl| match &decl.kind {
                TypeDeclKind::Object(obj) => obj.supertype.map(|parent| (parent, decl.id)),
                TypeDeclKind::StringEnum(_) => None,
            })
            .collect();
        for (parent, child) in edges {
            if let Some(obj) = self.object_mut(parent) {
                if !obj.subtypes.contains(&child) {
                    obj.subtypes.push(child);
                }
            }
        }
        ApiGraph {
            types: self.types,
            resources: self.resources,
        }
    }
}
