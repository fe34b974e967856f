//! The cross-language type IR.
//!
//! [`VrapType`] is the closed variant set every backend consumes: a resolved,
//! target-independent type reference with structural equality. Backends map
//! each variant to concrete syntax through their lowering tables; the core
//! never renders type names itself.

use crate::graph::ScalarKind;
use std::fmt;

/// A resolved, target-independent type reference.
///
/// Equality is structural: two `Object`/`Enum` values are equal iff both
/// `package` and `simple_name` match; `Array` equality recurses on the item
/// type; `Scalar` equality is on the scalar kind (equivalently, its canonical
/// native name); `Nil` is equal only to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VrapType {
    /// Nominal record type.
    Object { package: String, simple_name: String },
    /// Nominal closed string-backed enumeration.
    Enum { package: String, simple_name: String },
    /// A type native to the target's default namespace; carries no package.
    Scalar(ScalarKind),
    /// Homogeneous ordered sequence; nests recursively.
    Array(Box<VrapType>),
    /// Absence of a value or type.
    Nil,
}

impl VrapType {
    pub fn object(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        VrapType::Object {
            package: package.into(),
            simple_name: simple_name.into(),
        }
    }

    pub fn enumeration(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        VrapType::Enum {
            package: package.into(),
            simple_name: simple_name.into(),
        }
    }

    /// Strip array wrappers down to the innermost item type.
    pub fn flattened(&self) -> &VrapType {
        match self {
            VrapType::Array(item) => item.flattened(),
            other => other,
        }
    }

    /// Package of a nominal type; scalars and `Nil` have none.
    pub fn package(&self) -> Option<&str> {
        match self {
            VrapType::Object { package, .. } | VrapType::Enum { package, .. } => {
                Some(package.as_str())
            }
            _ => None,
        }
    }

    /// Simple name of a nominal type.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            VrapType::Object { simple_name, .. } | VrapType::Enum { simple_name, .. } => {
                Some(simple_name.as_str())
            }
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, VrapType::Scalar(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, VrapType::Nil)
    }
}

impl fmt::Display for VrapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VrapType::Object { package, simple_name }
            | VrapType::Enum { package, simple_name } => {
                if package.is_empty() {
                    write!(f, "{simple_name}")
                } else {
                    write!(f, "{package}.{simple_name}")
                }
            }
            VrapType::Scalar(kind) => write!(f, "{}", kind.canonical_name()),
            VrapType::Array(item) => write!(f, "{item}[]"),
            VrapType::Nil => write!(f, "nil"),
        }
    }
}
