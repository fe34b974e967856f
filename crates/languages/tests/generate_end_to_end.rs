//! Full-run test: one API graph, both targets, checked file sets.

#![allow(clippy::unwrap_used)]

use vrap_core::generator::{generate, GeneratorConfig};
use vrap_core::graph::{
    BodyDecl, GraphBuilder, HttpVerb, MediaKind, MethodNode, PropertyDecl, QueryParamDecl,
    ResourceNode, ScalarKind, TypeExpr,
};
use vrap_languages::{RustBackend, TsBackend};

/// A small shop-like API: a discriminated hierarchy, an enum, a map type,
/// a recursive type and a two-level resource tree.
fn shop_graph() -> vrap_core::ApiGraph {
    let mut g = GraphBuilder::new();

    let tax_mode = g.add_enum("TaxMode", Some("cart"), &["platform", "external"]);
    let attributes = g.add_object("Attributes", Some("common"));
    g.object_mut(attributes).unwrap().properties = vec![PropertyDecl {
        name: "/.*/".into(),
        ty: TypeExpr::Scalar(ScalarKind::String),
        required: true,
        deprecated: false,
    }];

    let category = g.add_object("Category", Some("category"));
    g.object_mut(category).unwrap().properties = vec![
        PropertyDecl {
            name: "name".into(),
            ty: TypeExpr::Scalar(ScalarKind::String),
            required: true,
            deprecated: false,
        },
        PropertyDecl {
            name: "parent".into(),
            ty: TypeExpr::Ref(category),
            required: false,
            deprecated: false,
        },
    ];

    let update = g.add_object("CartUpdate", Some("cart"));
    let set_mode = g.add_object("CartSetTaxModeAction", Some("cart"));
    g.object_mut(update).unwrap().discriminator = Some("action".into());
    let set_mode_obj = g.object_mut(set_mode).unwrap();
    set_mode_obj.supertype = Some(update);
    set_mode_obj.discriminator_value = Some("setTaxMode".into());
    set_mode_obj.properties = vec![PropertyDecl {
        name: "taxMode".into(),
        ty: TypeExpr::Ref(tax_mode),
        required: true,
        deprecated: false,
    }];

    let draft = g.add_object("CartDraft", Some("cart"));
    g.object_mut(draft).unwrap().properties = vec![
        PropertyDecl {
            name: "currency".into(),
            ty: TypeExpr::Scalar(ScalarKind::String),
            required: true,
            deprecated: false,
        },
        PropertyDecl {
            name: "custom".into(),
            ty: TypeExpr::Ref(attributes),
            required: false,
            deprecated: false,
        },
    ];

    g.add_resource(ResourceNode {
        full_uri: "/carts".into(),
        relative_uri: "/carts".into(),
        methods: vec![MethodNode {
            verb: HttpVerb::Post,
            query_params: Vec::new(),
            body: Some(BodyDecl {
                media: MediaKind::Json,
                ty: TypeExpr::Ref(draft),
            }),
        }],
        resources: vec![ResourceNode {
            full_uri: "/carts/{cartId}".into(),
            relative_uri: "/{cartId}".into(),
            methods: vec![MethodNode {
                verb: HttpVerb::Get,
                query_params: vec![QueryParamDecl {
                    name: "expand".into(),
                    ty: TypeExpr::Scalar(ScalarKind::String),
                    required: false,
                    placeholder: None,
                }],
                body: None,
            }],
            resources: Vec::new(),
        }],
    });

    g.finish()
}

#[test]
fn rust_target_renders_every_module_and_builder() {
    let graph = shop_graph();
    let report = generate(&graph, &GeneratorConfig::default(), &RustBackend).unwrap();
    assert!(report.is_complete());

    let paths: Vec<&str> = report
        .units
        .iter()
        .map(|u| u.relative_path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "client/src/carts_by_cart_id_request_builder.rs",
            "client/src/carts_request_builder.rs",
            "models/src/cart.rs",
            "models/src/category.rs",
            "models/src/common_.rs",
        ]
    );

    let cart = report
        .units
        .iter()
        .find(|u| u.relative_path == "models/src/cart.rs")
        .unwrap();
    assert!(cart.content.contains("pub enum TaxMode {"));
    assert!(cart.content.contains("#[serde(tag = \"action\")]"));
    assert!(cart.content.contains("pub enum CartUpdate {"));
    assert!(cart.content.contains("use crate::common_::{Attributes};"));

    let category = report
        .units
        .iter()
        .find(|u| u.relative_path == "models/src/category.rs")
        .unwrap();
    assert!(category.content.contains("pub parent: Option<Box<Category>>,"));

    let common = report
        .units
        .iter()
        .find(|u| u.relative_path == "models/src/common_.rs")
        .unwrap();
    assert!(common
        .content
        .contains("pub type Attributes = HashMap<String, String>;"));
}

#[test]
fn typescript_target_renders_every_module_and_builder() {
    let graph = shop_graph();
    let report = generate(&graph, &GeneratorConfig::default(), &TsBackend).unwrap();
    assert!(report.is_complete());

    let paths: Vec<&str> = report
        .units
        .iter()
        .map(|u| u.relative_path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "client/cartsByCartIdRequestBuilder.ts",
            "client/cartsRequestBuilder.ts",
            "models/cart.ts",
            "models/category.ts",
            "models/common_.ts",
        ]
    );

    let cart = report
        .units
        .iter()
        .find(|u| u.relative_path == "models/cart.ts")
        .unwrap();
    assert!(cart
        .content
        .contains("export type TaxMode = \"platform\" | \"external\";"));
    assert!(cart
        .content
        .contains("export type CartUpdate = CartSetTaxModeAction;"));
    assert!(cart.content.contains("action: \"setTaxMode\";"));
    assert!(cart
        .content
        .contains("import { Attributes } from \"./common_\";"));

    let category = report
        .units
        .iter()
        .find(|u| u.relative_path == "models/category.ts")
        .unwrap();
    assert!(category.content.contains("parent?: Category;"));
}

#[test]
fn both_targets_agree_on_request_names() {
    let graph = shop_graph();
    let rust = generate(&graph, &GeneratorConfig::default(), &RustBackend).unwrap();
    let ts = generate(&graph, &GeneratorConfig::default(), &TsBackend).unwrap();

    let rust_all: String = rust.units.iter().map(|u| u.content.as_str()).collect();
    let ts_all: String = ts.units.iter().map(|u| u.content.as_str()).collect();
    for name in ["CartsPost", "CartsByCartIdGet"] {
        assert!(rust_all.contains(name), "rust output misses {name}");
    }
    // The TypeScript client inlines requests as methods; the builder names
    // still come from the same derivation.
    for name in ["CartsRequestBuilder", "CartsByCartIdRequestBuilder"] {
        assert!(rust_all.contains(name), "rust output misses {name}");
        assert!(ts_all.contains(name), "typescript output misses {name}");
    }
}
