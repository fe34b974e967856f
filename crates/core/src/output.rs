//! Backend contract and rendered output.

use crate::client::ClientModel;
use crate::error::CodegenError;
use crate::generator::ModulePlan;
use crate::imports::ImportRef;
use crate::resolver::TypeResolver;

/// One rendered file, addressed relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Forward-slash relative path, e.g. `models/src/cart.rs`.
    pub relative_path: String,
    pub content: String,
}

impl OutputUnit {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }
}

/// A target language. Implementations are pure renderers: they receive the
/// resolver and the lowered plans, and only decide syntax and file layout.
///
/// Rendering runs on a worker pool, so implementations must be `Sync` and
/// must not mutate shared state.
pub trait Backend: Sync {
    /// Stable backend identifier, used in logs.
    fn name(&self) -> &'static str;

    /// The associative-container import this target needs for map-encoded
    /// types, if importing one is required at all.
    fn container_dependency(&self) -> Option<ImportRef>;

    /// Render one model module into its output files.
    fn render_module(
        &self,
        resolver: &TypeResolver<'_>,
        module: &ModulePlan,
    ) -> Result<Vec<OutputUnit>, CodegenError>;

    /// Render the client surface into its output files.
    fn render_client(
        &self,
        resolver: &TypeResolver<'_>,
        client: &ClientModel,
    ) -> Result<Vec<OutputUnit>, CodegenError>;
}
