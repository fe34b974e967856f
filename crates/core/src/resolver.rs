//! Mapping from graph nodes to the [`VrapType`] IR.
//!
//! The resolver is built once per run: every declared type is resolved
//! eagerly at construction so the cache is complete, collision-checked and
//! read-only before any (possibly parallel) rendering starts. It is an
//! explicit object handed to the algorithms that need it, never ambient
//! state.

use std::collections::HashMap;

use tracing::warn;

use crate::error::CodegenError;
use crate::generator::GeneratorConfig;
use crate::graph::{ApiGraph, ScalarKind, TypeDeclKind, TypeExpr, TypeId};
use crate::naming::{module_path, upper_camel_case};
use crate::types::VrapType;

/// Upper bound on supertype-chain climbing when searching for a union's
/// common base; malformed graphs must not loop forever.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Build-once, read-many resolver from [`TypeId`] to [`VrapType`].
#[derive(Debug)]
pub struct TypeResolver<'a> {
    graph: &'a ApiGraph,
    by_id: HashMap<TypeId, VrapType>,
}

impl<'a> TypeResolver<'a> {
    /// Resolve every declared type up front.
    ///
    /// Fails with [`CodegenError::NameCollision`] when two distinct nodes
    /// resolve to the same `(package, simple_name)` pair.
    pub fn new(graph: &'a ApiGraph, config: &GeneratorConfig) -> Result<Self, CodegenError> {
        let mut by_id = HashMap::with_capacity(graph.types.len());
        let mut seen: HashMap<VrapType, String> = HashMap::with_capacity(graph.types.len());

        for decl in &graph.types {
            let namespace = decl
                .namespace
                .as_deref()
                .unwrap_or(config.base_package.as_str());
            let package = module_path(namespace);
            let simple_name = upper_camel_case(&decl.name);
            let resolved = match &decl.kind {
                TypeDeclKind::Object(_) => VrapType::object(package, simple_name),
                TypeDeclKind::StringEnum(_) => VrapType::enumeration(package, simple_name),
            };

            if let Some(first) = seen.insert(resolved.clone(), decl.name.clone()) {
                let (package, simple_name) = match &resolved {
                    VrapType::Object { package, simple_name }
                    | VrapType::Enum { package, simple_name } => {
                        (package.clone(), simple_name.clone())
                    }
                    _ => (String::new(), String::new()),
                };
                return Err(CodegenError::NameCollision {
                    package,
                    simple_name,
                    first,
                    second: decl.name.clone(),
                });
            }
            by_id.insert(decl.id, resolved);
        }

        Ok(Self { graph, by_id })
    }

    /// The graph this resolver was built over.
    pub fn graph(&self) -> &'a ApiGraph {
        self.graph
    }

    /// Memoized per-node resolution; absent nodes map to `Nil`.
    pub fn resolve_id(&self, id: TypeId) -> VrapType {
        self.by_id.get(&id).cloned().unwrap_or(VrapType::Nil)
    }

    /// Resolve a type expression. Total and deterministic: unresolvable
    /// shapes degrade to `Nil` or the any-typed fallback, never fail.
    pub fn resolve(&self, expr: &TypeExpr) -> VrapType {
        match expr {
            TypeExpr::Ref(id) => self.resolve_id(*id),
            TypeExpr::Scalar(kind) => VrapType::Scalar(*kind),
            TypeExpr::Array(item) => VrapType::Array(Box::new(self.resolve(item))),
            TypeExpr::Union(variants) => self.resolve_union(variants),
            TypeExpr::Nil => VrapType::Nil,
        }
    }

    /// The declared-type id behind an expression, if any. Unions contribute
    /// their common base type; arrays are not unwrapped (a sequence already
    /// provides indirection).
    pub fn referenced_decl(&self, expr: &TypeExpr) -> Option<TypeId> {
        match expr {
            TypeExpr::Ref(id) => Some(*id),
            TypeExpr::Union(variants) => self.common_base(variants),
            _ => None,
        }
    }

    /// A union lowers to the common base type of its variants when one
    /// exists; otherwise to the opaque any-typed fallback.
    fn resolve_union(&self, variants: &[TypeExpr]) -> VrapType {
        if variants.len() == 1 {
            return self.resolve(&variants[0]);
        }
        match self.common_base(variants) {
            Some(base) => self.resolve_id(base),
            None => {
                warn!(
                    variant_count = variants.len(),
                    "union without common base type, falling back to any"
                );
                VrapType::Scalar(ScalarKind::Any)
            }
        }
    }

    /// Nearest common supertype of the referenced object types, climbing the
    /// hierarchy until all candidates agree.
    fn common_base(&self, variants: &[TypeExpr]) -> Option<TypeId> {
        let ids: Vec<TypeId> = variants
            .iter()
            .filter_map(|v| match v {
                TypeExpr::Ref(id) => Some(*id),
                _ => None,
            })
            .collect();
        if ids.len() != variants.len() {
            return None;
        }
        self.common_base_of(&ids, 0)
    }

    fn common_base_of(&self, ids: &[TypeId], depth: usize) -> Option<TypeId> {
        if depth > MAX_HIERARCHY_DEPTH || ids.is_empty() {
            return None;
        }
        let first = ids[0];
        if ids.iter().all(|&id| id == first) {
            return Some(first);
        }
        let parents: Vec<TypeId> = ids
            .iter()
            .filter_map(|&id| self.graph.object(id).and_then(|(_, obj)| obj.supertype))
            .collect();
        if parents.len() != ids.len() {
            return None;
        }
        self.common_base_of(&parents, depth + 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default()
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut g = GraphBuilder::new();
        let cart = g.add_object("Cart", Some("models/cart"));
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();

        let first = resolver.resolve(&TypeExpr::Ref(cart));
        let second = resolver.resolve(&TypeExpr::Ref(cart));
        assert_eq!(first, second);
        assert_eq!(first, VrapType::object("models/cart", "Cart"));
    }

    #[test]
    fn test_absent_node_resolves_to_nil() {
        let graph = GraphBuilder::new().finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();
        assert_eq!(resolver.resolve(&TypeExpr::Ref(TypeId(42))), VrapType::Nil);
        assert_eq!(resolver.resolve(&TypeExpr::Nil), VrapType::Nil);
    }

    #[test]
    fn test_namespace_normalization() {
        let mut g = GraphBuilder::new();
        let t = g.add_object("shipping-method", Some("com.example.type"));
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();
        assert_eq!(
            resolver.resolve_id(t),
            VrapType::object("com/example/types", "ShippingMethod")
        );
    }

    #[test]
    fn test_collision_is_detected() {
        let mut g = GraphBuilder::new();
        g.add_object("cart-discount", Some("models"));
        g.add_object("CartDiscount", Some("models"));
        let graph = g.finish();
        let err = TypeResolver::new(&graph, &config()).unwrap_err();
        assert!(matches!(err, CodegenError::NameCollision { .. }));
    }

    #[test]
    fn test_array_resolution_nests() {
        let mut g = GraphBuilder::new();
        let item = g.add_object("Item", Some("models"));
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();
        let resolved = resolver.resolve(&TypeExpr::Array(Box::new(TypeExpr::Array(Box::new(
            TypeExpr::Ref(item),
        )))));
        assert_eq!(
            resolved,
            VrapType::Array(Box::new(VrapType::Array(Box::new(VrapType::object(
                "models", "Item"
            )))))
        );
    }

    #[test]
    fn test_union_common_base() {
        let mut g = GraphBuilder::new();
        let base = g.add_object("Update", Some("models"));
        let a = g.add_object("SetName", Some("models"));
        let b = g.add_object("SetKey", Some("models"));
        g.object_mut(a).unwrap().supertype = Some(base);
        g.object_mut(b).unwrap().supertype = Some(base);
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();

        let resolved = resolver.resolve(&TypeExpr::Union(vec![TypeExpr::Ref(a), TypeExpr::Ref(b)]));
        assert_eq!(resolved, VrapType::object("models", "Update"));
    }

    #[test]
    fn test_union_without_common_base_falls_back_to_any() {
        let mut g = GraphBuilder::new();
        let a = g.add_object("Left", Some("models"));
        let b = g.add_object("Right", Some("models"));
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &config()).unwrap();

        let resolved = resolver.resolve(&TypeExpr::Union(vec![TypeExpr::Ref(a), TypeExpr::Ref(b)]));
        assert_eq!(resolved, VrapType::Scalar(ScalarKind::Any));
    }
}
