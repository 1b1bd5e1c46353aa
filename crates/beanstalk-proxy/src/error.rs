//! Error types for proxy synthesis and proxy invocation

use beanstalk_model::{BeanId, MethodSignature, ModelError, TypeName, TypeRef};

/// Synthesis or class definition failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyGenerationError {
    /// Every candidate proxy name is already loaded
    #[error("no unused proxy name for {base} after {attempts} attempts")]
    NameExhausted {
        /// Desired proxy name
        base: TypeName,
        /// Suffixed names tried
        attempts: u32,
    },

    /// A class with this name is already defined in the scope
    #[error("linkage error: duplicate class definition {0}")]
    DuplicateDefinition(TypeName),

    /// Final classes cannot be subclassed
    #[error("cannot proxy final class {0}")]
    FinalClass(TypeName),

    /// Only classes can be proxied
    #[error("cannot proxy {0}: not a class")]
    NotAClass(TypeName),

    /// An intercepted method cannot be overridden
    #[error("cannot intercept {class}.{method}: method is {reason}")]
    UnproxyableMethod {
        /// Implementation type
        class: TypeName,
        /// Offending method
        method: MethodSignature,
        /// Which modifier prevents overriding
        reason: &'static str,
    },

    /// An intercepted method is not visible on the class
    #[error("cannot intercept {class}.{method}: no such method")]
    UnknownMethod {
        /// Implementation type
        class: TypeName,
        /// Missing method
        method: MethodSignature,
    },

    /// Metadata lookup failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// Failure while running a proxied call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    /// The instance has no such method
    #[error("no method {method} on {class}")]
    NoSuchMethod {
        /// Receiver class
        class: TypeName,
        /// Requested method
        method: MethodSignature,
    },

    /// Argument count does not match the signature
    #[error("{method} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Invoked method
        method: MethodSignature,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// A value did not have the type the instruction or signature requires
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type or instruction family
        expected: String,
        /// Actual value
        found: String,
    },

    /// Unboxing a null reference
    #[error("cannot unbox null to {0}")]
    NullUnbox(TypeRef),

    /// The handler field was read before the constructor wired it
    #[error("proxy handler is not wired")]
    HandlerNotWired,

    /// Malformed instruction body
    #[error("invalid proxy body: {0}")]
    InvalidBody(String),

    /// No runtime instance for an interceptor or decorator in the plan
    #[error("no instance for interceptor or decorator {0}")]
    MissingInstance(BeanId),

    /// Failure raised by an interceptor, decorator or target
    #[error("{0}")]
    Application(String),
}

impl InvocationError {
    /// Type mismatch between an expectation and a value
    pub(crate) fn mismatch(expected: impl ToString, found: impl std::fmt::Debug) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{found:?}"),
        }
    }
}
