//! Error taxonomy of the generation core.
//!
//! Recoverable per-type issues (fallback encodings) are resolved locally and
//! never surface here; these variants are the structural failures that abort
//! the affected module with a node-identifying message.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A type reference could not be mapped to the IR. Fatal for the
    /// enclosing module; unrelated modules keep rendering.
    #[error("cannot resolve type for node '{node}': {reason}")]
    Resolution { node: String, reason: String },

    /// A supertype chain is cyclic. This is a malformed input graph, not an
    /// ordinary recursive-property cycle, and must not be silently broken.
    #[error("inheritance cycle through type '{type_name}'")]
    InheritanceCycle { type_name: String },

    /// Two distinct source nodes resolve to the same `(package, simple_name)`
    /// pair. Detected eagerly; silent collision would overwrite output.
    #[error("naming collision: '{first}' and '{second}' both resolve to {package}::{simple_name}")]
    NameCollision {
        package: String,
        simple_name: String,
        first: String,
        second: String,
    },

    /// A lowering rule has no defined outcome for the input shape and no
    /// reasonable fallback exists.
    #[error("unsupported construct in '{type_name}': {reason}")]
    Unsupported { type_name: String, reason: String },
}
