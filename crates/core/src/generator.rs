//! Run orchestration: planning, parallel rendering, failure isolation.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::client;
use crate::deps::declaration_order;
use crate::error::CodegenError;
use crate::graph::{ApiGraph, TypeId};
use crate::output::{Backend, OutputUnit};
use crate::resolver::TypeResolver;

/// Generation-wide configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Package assigned to types declared without a namespace.
    pub base_package: String,
    /// Package the client surface is rendered under.
    pub client_package: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_package: "models".into(),
            client_package: "client".into(),
        }
    }
}

/// One model module: a package and the types declared in it, already in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
    pub package: String,
    pub types: Vec<TypeId>,
}

/// A module that failed to plan or render. The rest of the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    pub module: String,
    pub error: CodegenError,
}

/// The outcome of a run: every rendered file plus the modules that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Sorted by relative path.
    pub units: Vec<OutputUnit>,
    pub failures: Vec<ModuleFailure>,
}

impl GenerateReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Group the graph's declarations by package and order each group.
///
/// Grouping uses a `BTreeMap` so module order is stable; within a module,
/// supertypes precede subtypes and unrelated types keep declaration order.
/// Modules whose ordering fails (cyclic inheritance) come back as failures.
pub fn plan_modules(
    resolver: &TypeResolver<'_>,
) -> (Vec<ModulePlan>, Vec<ModuleFailure>) {
    let graph = resolver.graph();
    let mut by_package: BTreeMap<String, Vec<TypeId>> = BTreeMap::new();
    for decl in &graph.types {
        let package = resolver
            .resolve_id(decl.id)
            .package()
            .unwrap_or_default()
            .to_string();
        by_package.entry(package).or_default().push(decl.id);
    }

    let mut plans = Vec::with_capacity(by_package.len());
    let mut failures = Vec::new();
    for (package, ids) in by_package {
        match declaration_order(graph, &ids) {
            Ok(types) => plans.push(ModulePlan { package, types }),
            Err(error) => {
                warn!(module = %package, %error, "module failed to plan");
                failures.push(ModuleFailure {
                    module: package,
                    error,
                });
            }
        }
    }
    (plans, failures)
}

/// Run a full generation: resolve, plan, render every module on the worker
/// pool, render the client, and report.
///
/// A naming collision is the only whole-run failure; everything downstream
/// degrades to per-module failures so one bad module cannot take out the
/// rest of the output.
pub fn generate(
    graph: &ApiGraph,
    config: &GeneratorConfig,
    backend: &dyn Backend,
) -> Result<GenerateReport, CodegenError> {
    let resolver = TypeResolver::new(graph, config)?;
    let (plans, mut failures) = plan_modules(&resolver);
    info!(
        backend = backend.name(),
        modules = plans.len(),
        types = graph.types.len(),
        "starting generation"
    );

    let results: Vec<Result<Vec<OutputUnit>, ModuleFailure>> = plans
        .par_iter()
        .map(|plan| {
            debug!(module = %plan.package, types = plan.types.len(), "rendering module");
            backend.render_module(&resolver, plan).map_err(|error| {
                warn!(module = %plan.package, %error, "module failed to render");
                ModuleFailure {
                    module: plan.package.clone(),
                    error,
                }
            })
        })
        .collect();

    let mut units = Vec::new();
    for result in results {
        match result {
            Ok(mut rendered) => units.append(&mut rendered),
            Err(failure) => failures.push(failure),
        }
    }

    let client_model = client::build(&resolver);
    if !client_model.resources.is_empty() {
        match backend.render_client(&resolver, &client_model) {
            Ok(mut rendered) => units.append(&mut rendered),
            Err(error) => {
                warn!(module = %config.client_package, %error, "client failed to render");
                failures.push(ModuleFailure {
                    module: config.client_package.clone(),
                    error,
                });
            }
        }
    }

    units.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(
        files = units.len(),
        failures = failures.len(),
        "generation finished"
    );
    Ok(GenerateReport { units, failures })
}
