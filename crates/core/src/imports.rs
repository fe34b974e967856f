//! Cross-module import resolution.
//!
//! Given the types declared in a module, compute the minimal, deduplicated,
//! alphabetically grouped set of imports the module needs. Output is fully
//! deterministic for a given input set, so generated files diff cleanly
//! between runs.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::graph::{TypeExpr, TypeId};
use crate::resolver::TypeResolver;
use crate::types::VrapType;

/// A single imported name: where it lives and whether the package is
/// external to the generated tree (e.g. a standard-library container).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportRef {
    pub package: String,
    pub simple_name: String,
    pub external: bool,
}

impl ImportRef {
    pub fn new(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            simple_name: simple_name.into(),
            external: false,
        }
    }

    pub fn external(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            simple_name: simple_name.into(),
            external: true,
        }
    }
}

/// One import statement: all names pulled from a package, merged and sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportGroup {
    pub package: String,
    pub external: bool,
    /// Alphabetically sorted simple names.
    pub names: Vec<String>,
}

/// Compute the import groups for the types declared in `current_module`.
///
/// Collects every type transitively referenced by the objects' own
/// properties, their discriminated subtypes, and (for as-map types) the
/// backend-supplied associative-container dependency; flattens arrays,
/// drops scalars and same-module references, dedupes, groups by
/// `(package, external)` and sorts.
pub fn imports_for(
    resolver: &TypeResolver<'_>,
    ids: &[TypeId],
    current_module: &str,
    container_dep: Option<&ImportRef>,
) -> Vec<ImportGroup> {
    let mut refs: BTreeSet<ImportRef> = BTreeSet::new();
    let mut visited: HashSet<TypeId> = HashSet::new();
    for &id in ids {
        collect_dependencies(resolver, id, container_dep, &mut refs, &mut visited);
    }

    let mut groups: BTreeMap<(String, bool), Vec<String>> = BTreeMap::new();
    for import in refs {
        if !import.external && import.package == current_module {
            continue;
        }
        groups
            .entry((import.package, import.external))
            .or_default()
            .push(import.simple_name);
    }

    groups
        .into_iter()
        .map(|((package, external), mut names)| {
            names.sort();
            names.dedup();
            ImportGroup {
                package,
                external,
                names,
            }
        })
        .collect()
}

/// Dependencies of one object type: property types (arrays flattened, unions
/// reduced to their common base), subtype dependencies when discriminated,
/// and the container dependency when map-like.
fn collect_dependencies(
    resolver: &TypeResolver<'_>,
    id: TypeId,
    container_dep: Option<&ImportRef>,
    refs: &mut BTreeSet<ImportRef>,
    visited: &mut HashSet<TypeId>,
) {
    if !visited.insert(id) {
        return;
    }
    let graph = resolver.graph();
    let Some((_, obj)) = graph.object(id) else {
        return;
    };

    if graph.is_map_type(id) {
        if let Some(dep) = container_dep {
            refs.insert(dep.clone());
        }
    }

    for prop in graph.all_properties(id) {
        record_expr(resolver, &prop.ty, refs);
    }

    if graph.is_discriminated(id) {
        for sub in graph.named_subtypes(obj) {
            collect_dependencies(resolver, sub.id, container_dep, refs, visited);
        }
    }
}

fn record_expr(resolver: &TypeResolver<'_>, expr: &TypeExpr, refs: &mut BTreeSet<ImportRef>) {
    let resolved = resolver.resolve(expr);
    record_vrap(resolved.flattened(), refs);
}

fn record_vrap(vrap: &VrapType, refs: &mut BTreeSet<ImportRef>) {
    match vrap {
        VrapType::Object { package, simple_name } | VrapType::Enum { package, simple_name } => {
            refs.insert(ImportRef::new(package.clone(), simple_name.clone()));
        }
        _ => {}
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
    fn test_duplicate_references_import_once() {
        let mut g = GraphBuilder::new();
        let price = g.add_object("Price", Some("common"));
        let cart = g.add_object("Cart", Some("cart"));
        g.object_mut(cart).unwrap().properties = vec![
            prop("total", TypeExpr::Ref(price)),
            prop("taxed", TypeExpr::Ref(price)),
        ];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let groups = imports_for(&resolver, &[cart], "cart", None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].package, "common_");
        assert_eq!(groups[0].names, vec!["Price"]);
    }

    #[test]
    fn test_scalars_and_same_module_are_dropped() {
        let mut g = GraphBuilder::new();
        let line = g.add_object("LineItem", Some("cart"));
        let cart = g.add_object("Cart", Some("cart"));
        g.object_mut(cart).unwrap().properties = vec![
            prop("id", TypeExpr::Scalar(ScalarKind::String)),
            prop("items", TypeExpr::Array(Box::new(TypeExpr::Ref(line)))),
        ];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let groups = imports_for(&resolver, &[cart, line], "cart", None);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_array_wrappers_flatten_to_item_type() {
        let mut g = GraphBuilder::new();
        let tag = g.add_object("Tag", Some("common"));
        let post = g.add_object("Post", Some("blog"));
        g.object_mut(post).unwrap().properties = vec![prop(
            "tags",
            TypeExpr::Array(Box::new(TypeExpr::Array(Box::new(TypeExpr::Ref(tag))))),
        )];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let groups = imports_for(&resolver, &[post], "blog", None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].names, vec!["Tag"]);
    }

    #[test]
    fn test_discriminated_subtype_dependencies_are_collected() {
        let mut g = GraphBuilder::new();
        let money = g.add_object("Money", Some("common"));
        let root = g.add_object("Discount", Some("discount"));
        let leaf = g.add_object("AbsoluteDiscount", Some("discount"));
        g.object_mut(root).unwrap().discriminator = Some("type".into());
        let leaf_obj = g.object_mut(leaf).unwrap();
        leaf_obj.supertype = Some(root);
        leaf_obj.discriminator_value = Some("absolute".into());
        leaf_obj.properties = vec![prop("money", TypeExpr::Ref(money))];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let groups = imports_for(&resolver, &[root], "discount", None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].package, "common_");
        assert_eq!(groups[0].names, vec!["Money"]);
    }

    #[test]
    fn test_map_type_pulls_container_dependency() {
        let mut g = GraphBuilder::new();
        let attrs = g.add_object("Attributes", Some("common"));
        g.object_mut(attrs).unwrap().properties = vec![prop(
            "/.*/",
            TypeExpr::Scalar(ScalarKind::String),
        )];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let container = ImportRef::external("std/collections", "HashMap");
        let groups = imports_for(&resolver, &[attrs], "common_", Some(&container));
        assert_eq!(groups.len(), 1);
        assert!(groups[0].external);
        assert_eq!(groups[0].names, vec!["HashMap"]);
    }

    #[test]
    fn test_output_is_sorted_and_stable() {
        let mut g = GraphBuilder::new();
        let zebra = g.add_object("Zebra", Some("zoo"));
        let ant = g.add_object("Ant", Some("zoo"));
        let bee = g.add_object("Bee", Some("apiary"));
        let home = g.add_object("Home", Some("home"));
        g.object_mut(home).unwrap().properties = vec![
            prop("z", TypeExpr::Ref(zebra)),
            prop("a", TypeExpr::Ref(ant)),
            prop("b", TypeExpr::Ref(bee)),
        ];
        let graph = g.finish();
        let resolver = TypeResolver::new(&graph, &GeneratorConfig::default()).unwrap();

        let first = imports_for(&resolver, &[home], "home", None);
        let second = imports_for(&resolver, &[home], "home", None);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].package, "apiary");
        assert_eq!(first[1].package, "zoo");
        assert_eq!(first[1].names, vec!["Ant", "Zebra"]);
    }
}
