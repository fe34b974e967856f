//! Target-independent core of the API client generator.
//!
//! A host parser hands over an [`ApiGraph`]; the core resolves every
//! declaration into the [`VrapType`] IR, lowers objects into map, union or
//! struct encodings, derives the client request model from the resource
//! tree, and drives a [`Backend`] over the plans to produce files.

pub mod client;
pub mod deps;
pub mod error;
pub mod generator;
pub mod graph;
pub mod imports;
pub mod lowering;
pub mod naming;
pub mod output;
pub mod resolver;
pub mod types;

pub use client::{BodyParam, ClientModel, RequestModel, ResourceModel};
pub use error::CodegenError;
pub use generator::{generate, GenerateReport, GeneratorConfig, ModuleFailure, ModulePlan};
pub use graph::{ApiGraph, GraphBuilder, TypeId};
pub use imports::{ImportGroup, ImportRef};
pub use lowering::{lower, lower_enum, EnumEncoding, LoweredField, TypeEncoding, UnionVariant};
pub use output::{Backend, OutputUnit};
pub use resolver::TypeResolver;
pub use types::VrapType;
