//! Error types for the metadata model

use crate::name::TypeName;

/// Errors raised while building or querying metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Type name is empty or has a malformed segment
    #[error("invalid type name: {0:?}")]
    InvalidTypeName(String),

    /// Type reference could not be parsed
    #[error("invalid type reference: {0:?}")]
    InvalidTypeRef(String),

    /// Type is not part of the universe
    #[error("unknown type: {0}")]
    UnknownType(TypeName),
}
