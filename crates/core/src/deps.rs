//! Declaration ordering and cycle analysis.
//!
//! Two concerns live here: the topological "supertype before subtype" order
//! used when laying out a module, and the reachability check that decides
//! whether a field must be stored through an indirection because its type
//! participates in a reference cycle.

use std::collections::HashSet;

use crate::error::CodegenError;
use crate::graph::{ApiGraph, TypeExpr, TypeId};
use crate::resolver::TypeResolver;
use crate::types::VrapType;

/// Topological declaration order over a set of types, keyed by the supertype
/// edge. Each type is emitted right after its in-set supertype chain, so
/// types with no supertype relationship keep their exact input order. A
/// cyclic supertype chain is a malformed graph and fails with
/// [`CodegenError::InheritanceCycle`].
pub fn declaration_order(
    graph: &ApiGraph,
    ids: &[TypeId],
) -> Result<Vec<TypeId>, CodegenError> {
    let in_set: HashSet<TypeId> = ids.iter().copied().collect();
    let mut emitted: HashSet<TypeId> = HashSet::with_capacity(ids.len());
    let mut on_stack: HashSet<TypeId> = HashSet::new();
    let mut order = Vec::with_capacity(ids.len());
    for &id in ids {
        emit_after_supertypes(graph, id, &in_set, &mut emitted, &mut on_stack, &mut order)?;
    }
    Ok(order)
}

fn emit_after_supertypes(
    graph: &ApiGraph,
    id: TypeId,
    in_set: &HashSet<TypeId>,
    emitted: &mut HashSet<TypeId>,
    on_stack: &mut HashSet<TypeId>,
    order: &mut Vec<TypeId>,
) -> Result<(), CodegenError> {
    if emitted.contains(&id) {
        return Ok(());
    }
    if !on_stack.insert(id) {
        let name = graph
            .get(id)
            .map(|decl| decl.name.clone())
            .unwrap_or_default();
        return Err(CodegenError::InheritanceCycle { type_name: name });
    }
    if let Some(parent) = graph.object(id).and_then(|(_, obj)| obj.supertype) {
        if in_set.contains(&parent) {
            emit_after_supertypes(graph, parent, in_set, emitted, on_stack, order)?;
        }
    }
    on_stack.remove(&id);
    emitted.insert(id);
    order.push(id);
    Ok(())
}

/// Whether declaring a field of type `start` by value inside the types on
/// `context` would produce a structurally infinite type.
///
/// Depth-first walk over property types and, for discriminated types, the
/// named-subtype edges, with a visited set keyed by resolved [`VrapType`]
/// equality. True when the walk reaches a type equal to `start` or to any
/// type on the caller's context stack (the chain of enclosing types currently
/// being rendered). Arrays are not descended into: a sequence already stores
/// its items through indirection and therefore breaks the cycle.
pub fn is_recursive(resolver: &TypeResolver<'_>, start: TypeId, context: &[TypeId]) -> bool {
    let graph = resolver.graph();
    let start_vrap = resolver.resolve_id(start);
    let context_vraps: Vec<VrapType> = context.iter().map(|&id| resolver.resolve_id(id)).collect();
    if context_vraps.contains(&start_vrap) {
        return true;
    }

    let mut to_check: Vec<TypeId> = Vec::new();
    let mut visited: HashSet<VrapType> = HashSet::new();
    push_edges(resolver, start, &mut to_check);

    while let Some(next) = to_check.pop() {
        let next_vrap = resolver.resolve_id(next);
        if !visited.insert(next_vrap.clone()) {
            continue;
        }
        if next_vrap == start_vrap || context_vraps.contains(&next_vrap) {
            return true;
        }
        if graph.object(next).is_some() {
            push_edges(resolver, next, &mut to_check);
        }
    }
    false
}

/// Push the outgoing edges of an object type: every property's referenced
/// declaration plus, when the type is a discriminated root, its named
/// subtypes.
fn push_edges(resolver: &TypeResolver<'_>, id: TypeId, to_check: &mut Vec<TypeId>) {
    let graph = resolver.graph();
    for prop in graph.all_properties(id) {
        if let Some(target) = referenced_without_indirection(resolver, &prop.ty) {
            to_check.push(target);
        }
    }
    if graph.is_discriminated(id) {
        if let Some((_, obj)) = graph.object(id) {
            for sub in graph.named_subtypes(obj) {
                to_check.push(sub.id);
            }
        }
    }
}

/// The declaration a field would embed by value: direct references and union
/// common bases, but not array items.
fn referenced_without_indirection(resolver: &TypeResolver<'_>, expr: &TypeExpr) -> Option<TypeId> {
    match expr {
        TypeExpr::Array(_) => None,
        other => resolver.referenced_decl(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::graph::{GraphBuilder, PropertyDecl, ScalarKind};

    fn prop(name: &str, ty: TypeExpr) -> PropertyDecl {
        PropertyDecl {
            name: name.into(),
            ty,
            required: true,
            deprecated: false,
        }
    }

    #[test]
    fn test_supertype_before_subtype() {
        let mut g = GraphBuilder::new();
        let child = g.add_object("Child", None);
        let base = g.add_object("Base", None);
        g.object_mut(child).unwrap().supertype = Some(base);
        let graph = g.finish();

        let order = declaration_order(&graph, &[child, base]).unwrap();
        assert_eq!(order, vec![base, child]);
    }

    #[test]
    fn test_blocked_node_does_not_fall_behind_unrelated_ones() {
        // A subtype listed before its supertype slots in right after it;
        // unrelated types keep their input position.
        let mut g = GraphBuilder::new();
        let b = g.add_object("B", None);
        let a = g.add_object("A", None);
        let c = g.add_object("C", None);
        g.object_mut(b).unwrap().supertype = Some(a);
        let graph = g.finish();

        let order = declaration_order(&graph, &[b, a, c]).unwrap();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_stable_order_without_edges() {
        let mut g = GraphBuilder::new();
        let a = g.add_object("A", None);
        let b = g.add_object("B", None);
        let c = g.add_object("C", None);
        let graph = g.finish();

        let order = declaration_order(&graph, &[c, a, b]).unwrap();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn test_inheritance_cycle_is_fatal() {
        let mut g = GraphBuilder::new();
        let a = g.add_object("A", None);
        let b = g.add_object("B", None);
        g.object_mut(a).unwrap().supertype = Some(b);
        g.object_mut(b).unwrap().supertype = Some(a);
        let graph = g.finish();

        let err = declaration_order(&graph, &[a, b]).unwrap_err();
        assert!(matches!(err, CodegenError::InheritanceCycle { .. }));
    }

    #[test]
    fn test_self_reference_is_recursive() {
        let mut g = GraphBuilder::new();
        let node = g.add_object("Node", None);
        g.object_mut(node).unwrap().properties = vec![prop("next", TypeExpr::Ref(node))];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        assert!(is_recursive(&resolver, node, &[]));
    }

    #[test]
    fn test_mutual_reference_is_recursive() {
        let mut g = GraphBuilder::new();
        let a = g.add_object("A", None);
        let b = g.add_object("B", None);
        g.object_mut(a).unwrap().properties = vec![prop("b", TypeExpr::Ref(b))];
        g.object_mut(b).unwrap().properties = vec![prop("a", TypeExpr::Ref(a))];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        assert!(is_recursive(&resolver, a, &[]));
        assert!(is_recursive(&resolver, b, &[]));
    }

    #[test]
    fn test_array_breaks_the_cycle() {
        let mut g = GraphBuilder::new();
        let node = g.add_object("Tree", None);
        g.object_mut(node).unwrap().properties = vec![prop(
            "children",
            TypeExpr::Array(Box::new(TypeExpr::Ref(node))),
        )];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        assert!(!is_recursive(&resolver, node, &[]));
    }

    #[test]
    fn test_plain_chain_is_not_recursive() {
        let mut g = GraphBuilder::new();
        let leaf = g.add_object("Leaf", None);
        let root = g.add_object("Root", None);
        g.object_mut(leaf).unwrap().properties =
            vec![prop("label", TypeExpr::Scalar(ScalarKind::String))];
        g.object_mut(root).unwrap().properties = vec![prop("leaf", TypeExpr::Ref(leaf))];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        assert!(!is_recursive(&resolver, root, &[]));
        assert!(!is_recursive(&resolver, leaf, &[]));
    }

    #[test]
    fn test_context_stack_detects_subtype_back_edge() {
        // A discriminated root whose subtype refers back to the root: when
        // the subtype's fields are rendered inside the root (union variant),
        // the root sits on the context stack and the field must be indirect.
        let mut g = GraphBuilder::new();
        let root = g.add_object("Expr", None);
        let call = g.add_object("Call", None);
        g.object_mut(root).unwrap().discriminator = Some("kind".into());
        let call_obj = g.object_mut(call).unwrap();
        call_obj.supertype = Some(root);
        call_obj.discriminator_value = Some("call".into());
        call_obj.properties = vec![prop("callee", TypeExpr::Ref(root))];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        // The property type *is* the root, so with the root on the context
        // stack the back-edge is recursive; without context it still is,
        // because root reaches Call via the subtype edge and Call reaches
        // root again.
        assert!(is_recursive(&resolver, root, &[root]));
        assert!(is_recursive(&resolver, root, &[]));
    }
}
