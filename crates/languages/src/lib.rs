//! Language backends for the generation core.
//!
//! Each backend is a pure [`vrap_core::Backend`] implementation; adding a
//! target means adding a module here, the core stays untouched.

pub mod rust;
pub mod typescript;

pub use rust::RustBackend;
pub use typescript::TsBackend;
