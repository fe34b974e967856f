//! Lowering of object declarations into backend-neutral encodings.
//!
//! Each object type lowers into exactly one of three shapes: an associative
//! map, a discriminated union, or a plain struct. Backends render these
//! encodings without re-deriving any polymorphism decisions, so every target
//! agrees on the shape of every type.

use tracing::debug;

use crate::deps::is_recursive;
use crate::error::CodegenError;
use crate::graph::{PropertyDecl, TypeDeclKind, TypeId};
use crate::resolver::TypeResolver;
use crate::types::VrapType;

/// A struct or variant field after lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredField {
    /// Source property name; backends apply their own case convention.
    pub name: String,
    /// Exact wire key for serialization attributes.
    pub wire_name: String,
    pub ty: VrapType,
    pub optional: bool,
    /// Field type participates in a reference cycle through this type and
    /// must be stored through an indirection.
    pub indirect: bool,
    pub deprecated: bool,
}

/// One variant of a discriminated union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionVariant {
    /// Resolved type of the variant declaration.
    pub ty: VrapType,
    /// Wire value of the discriminator for this variant.
    pub tag: String,
    /// The variant's own fields, discriminator excluded.
    pub fields: Vec<LoweredField>,
}

/// The three encodings an object type can lower to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeEncoding {
    /// String-keyed associative container.
    Map { value: VrapType },
    /// Discriminated union over named subtypes.
    Union {
        discriminator: String,
        variants: Vec<UnionVariant>,
    },
    /// Plain record with inherited and own fields merged.
    Struct { fields: Vec<LoweredField> },
}

/// A lowered string enumeration: wire values paired with their
/// upper-camel-cased variant names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEncoding {
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Exact wire string.
    pub wire: String,
    /// Target-side variant name.
    pub variant: String,
}

/// Lower an object declaration into its encoding.
///
/// Precedence is fixed: map-like types become `Map` even when they also sit
/// in a hierarchy; discriminated roots become `Union`; everything else
/// becomes `Struct`.
pub fn lower(resolver: &TypeResolver<'_>, id: TypeId) -> Result<TypeEncoding, CodegenError> {
    let graph = resolver.graph();
    let Some((decl, _)) = graph.object(id) else {
        return Err(CodegenError::Resolution {
            node: format!("#{}", id.0),
            reason: "not an object declaration".into(),
        });
    };

    if graph.is_map_type(id) {
        let value = map_value_type(resolver, id);
        debug!(name = %decl.name, "lowered as map");
        return Ok(TypeEncoding::Map { value });
    }

    if graph.is_discriminated(id) {
        return lower_union(resolver, id);
    }

    Ok(TypeEncoding::Struct {
        fields: struct_fields(resolver, id),
    })
}

/// Lower a string enumeration. Empty value lists are rejected: a closed
/// enum with no members cannot be instantiated on any target.
pub fn lower_enum(resolver: &TypeResolver<'_>, id: TypeId) -> Result<EnumEncoding, CodegenError> {
    let graph = resolver.graph();
    let Some(decl) = graph.get(id) else {
        return Err(CodegenError::Resolution {
            node: format!("#{}", id.0),
            reason: "unknown declaration".into(),
        });
    };
    let TypeDeclKind::StringEnum(en) = &decl.kind else {
        return Err(CodegenError::Resolution {
            node: decl.name.clone(),
            reason: "not a string enumeration".into(),
        });
    };
    if en.values.is_empty() {
        return Err(CodegenError::Unsupported {
            type_name: decl.name.clone(),
            reason: "enumeration has no values".into(),
        });
    }
    Ok(EnumEncoding {
        values: en
            .values
            .iter()
            .map(|v| EnumValue {
                wire: v.clone(),
                variant: crate::naming::upper_camel_case(v),
            })
            .collect(),
    })
}

/// Value type of a map-like object: the resolved type of its pattern
/// property when the patterns agree, the any-typed fallback otherwise.
fn map_value_type(resolver: &TypeResolver<'_>, id: TypeId) -> VrapType {
    let graph = resolver.graph();
    let mut value: Option<VrapType> = None;
    for prop in graph.all_properties(id) {
        if !prop.is_pattern() {
            continue;
        }
        let resolved = resolver.resolve(&prop.ty);
        match &value {
            None => value = Some(resolved),
            Some(existing) if *existing == resolved => {}
            Some(_) => return VrapType::Scalar(crate::graph::ScalarKind::Any),
        }
    }
    value.unwrap_or(VrapType::Scalar(crate::graph::ScalarKind::Any))
}

fn lower_union(resolver: &TypeResolver<'_>, id: TypeId) -> Result<TypeEncoding, CodegenError> {
    let graph = resolver.graph();
    let Some((decl, obj)) = graph.object(id) else {
        return Err(CodegenError::Resolution {
            node: format!("#{}", id.0),
            reason: "not an object declaration".into(),
        });
    };
    let Some(discriminator) = graph.discriminator(id) else {
        return Err(CodegenError::Resolution {
            node: decl.name.clone(),
            reason: "discriminated type lost its discriminator".into(),
        });
    };

    let mut variants = Vec::new();
    for sub in graph.named_subtypes(obj) {
        let Some((_, sub_obj)) = graph.object(sub.id) else {
            continue;
        };
        let Some(tag) = &sub_obj.discriminator_value else {
            // Abstract intermediate subtypes contribute their own leaves
            // through their subtype lists, not a variant of their own.
            if let TypeEncoding::Union {
                variants: nested, ..
            } = lower_union(resolver, sub.id)?
            {
                variants.extend(nested);
            }
            continue;
        };
        // Variant payload is the subtype's own fields; inherited fields stay
        // on the root and the discriminator is implied by the tag.
        let fields = own_fields(resolver, sub.id, discriminator, id);
        variants.push(UnionVariant {
            ty: resolver.resolve_id(sub.id),
            tag: tag.clone(),
            fields,
        });
    }
    debug!(name = %decl.name, variants = variants.len(), "lowered as union");

    Ok(TypeEncoding::Union {
        discriminator: discriminator.to_string(),
        variants,
    })
}

/// Merged inherited-and-own fields of a struct, with the effective
/// discriminator property dropped when the type is a tagged leaf.
fn struct_fields(resolver: &TypeResolver<'_>, id: TypeId) -> Vec<LoweredField> {
    let graph = resolver.graph();
    let implied = graph
        .object(id)
        .and_then(|(_, obj)| obj.discriminator_value.as_ref())
        .and_then(|_| graph.discriminator(id));
    graph
        .all_properties(id)
        .into_iter()
        .filter(|prop| Some(prop.name.as_str()) != implied)
        .map(|prop| lower_field(resolver, prop, id))
        .collect()
}

/// A subtype's own (non-inherited) fields, minus the discriminator.
fn own_fields(
    resolver: &TypeResolver<'_>,
    id: TypeId,
    discriminator: &str,
    context: TypeId,
) -> Vec<LoweredField> {
    let graph = resolver.graph();
    let Some((_, obj)) = graph.object(id) else {
        return Vec::new();
    };
    obj.properties
        .iter()
        .filter(|prop| prop.name != discriminator)
        .map(|prop| {
            let mut field = lower_field(resolver, prop, id);
            // Fields rendered inline inside the union must also account for
            // cycles back through the enclosing root.
            if !field.indirect {
                if let Some(target) = resolver.referenced_decl(&prop.ty) {
                    field.indirect = is_recursive(resolver, target, &[context, id]);
                }
            }
            field
        })
        .collect()
}

fn lower_field(resolver: &TypeResolver<'_>, prop: &PropertyDecl, owner: TypeId) -> LoweredField {
    let ty = resolver.resolve(&prop.ty);
    let indirect = resolver
        .referenced_decl(&prop.ty)
        .is_some_and(|target| is_recursive(resolver, target, &[owner]));
    // A pattern property surviving into a struct (the type also has literal
    // properties) has no usable key and becomes the `value` field.
    let name = if prop.is_pattern() {
        "value".to_string()
    } else {
        prop.name.clone()
    };
    LoweredField {
        wire_name: name.clone(),
        name,
        ty,
        optional: !prop.required,
        indirect,
        deprecated: prop.deprecated,
    }
}
